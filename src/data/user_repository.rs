use crate::domain::entry::EntryKind;
use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{User, UserUpdate};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

#[derive(Clone)]
pub struct InMemoryUserRepository {
    storage: Arc<RwLock<HashMap<ObjectId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id, username = %user.username))]
    async fn insert_user(&self, user: User) -> Result<()> {
        trace!("Acquiring write lock for user storage");
        let mut storage = self.storage.write().await;
        // Same guarantee the unique indexes give the Mongo store.
        if storage.values().any(|u| u.username == user.username) {
            return Err(DomainError::Conflict("Username already exists".to_string()).into());
        }
        if storage.values().any(|u| u.email == user.email) {
            return Err(DomainError::Conflict("Email already exists".to_string()).into());
        }
        let user_id = user.id;
        storage.insert(user_id, user);
        debug!(user_id = %user_id, "User saved to memory storage");
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn find_user_by_id(&self, id: &ObjectId) -> Result<Option<User>> {
        let storage = self.storage.read().await;
        let user = storage.get(id).cloned();
        trace!(found = user.is_some(), "Looked up user by ID");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let storage = self.storage.read().await;
        let user = storage.values().find(|u| u.username == username).cloned();
        trace!(found = user.is_some(), "Looked up user by username");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let storage = self.storage.read().await;
        let user = storage.values().find(|u| u.email == email).cloned();
        trace!(found = user.is_some(), "Looked up user by email");
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let storage = self.storage.read().await;
        let mut users: Vec<User> = storage.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    #[instrument(skip(self, update), fields(user_id = %id))]
    async fn update_user(&self, id: &ObjectId, update: UserUpdate) -> Result<Option<User>> {
        let mut storage = self.storage.write().await;
        if let Some(username) = &update.username {
            if storage
                .values()
                .any(|u| u.id != *id && &u.username == username)
            {
                return Err(DomainError::Conflict("Username already exists".to_string()).into());
            }
        }
        let Some(user) = storage.get_mut(id) else {
            return Ok(None);
        };
        if let Some(full_name) = update.full_name {
            user.full_name = full_name;
        }
        if let Some(username) = update.username {
            user.username = username;
        }
        user.updated_at = Utc::now();
        debug!("User profile updated in memory storage");
        Ok(Some(user.clone()))
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn delete_user(&self, id: &ObjectId) -> Result<bool> {
        let mut storage = self.storage.write().await;
        Ok(storage.remove(id).is_some())
    }

    #[instrument(skip(self))]
    async fn link_entry(
        &self,
        user_id: &ObjectId,
        kind: EntryKind,
        entry_id: &ObjectId,
    ) -> Result<bool> {
        let mut storage = self.storage.write().await;
        let Some(user) = storage.get_mut(user_id) else {
            return Ok(false);
        };
        user.entry_refs_mut(kind).push(*entry_id);
        user.updated_at = Utc::now();
        debug!(kind = %kind, "Entry linked to user");
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn unlink_entry(
        &self,
        user_id: &ObjectId,
        kind: EntryKind,
        entry_id: &ObjectId,
    ) -> Result<bool> {
        let mut storage = self.storage.write().await;
        let Some(user) = storage.get_mut(user_id) else {
            return Ok(false);
        };
        let refs = user.entry_refs_mut(kind);
        let before = refs.len();
        refs.retain(|id| id != entry_id);
        let removed = refs.len() != before;
        if removed {
            user.updated_at = Utc::now();
            debug!(kind = %kind, "Entry unlinked from user");
        }
        Ok(removed)
    }
}
