use crate::domain::entry::{Entry, EntryKind, NewEntry};
use crate::domain::error::DomainError;
use crate::domain::repository::{EntryRepository, UserRepository};
use crate::domain::user::{User, UserUpdate};
use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{DateTime, Document, doc, to_document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};
use std::collections::HashMap;
use tracing::{debug, instrument, trace, warn};

const USERS_COLLECTION: &str = "users";
const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    is_duplicate_key_kind(err.kind.as_ref())
}

fn is_duplicate_key_kind(kind: &ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY
    )
}

fn user_update(update: UserUpdate, now: DateTime) -> Document {
    let mut set = doc! { "updatedAt": now };
    if let Some(full_name) = update.full_name {
        set.insert("fullName", full_name);
    }
    if let Some(username) = update.username {
        set.insert("username", username);
    }
    doc! { "$set": set }
}

fn link_update(kind: EntryKind, entry_id: &ObjectId, now: DateTime) -> Document {
    let mut push = Document::new();
    push.insert(kind.collection(), *entry_id);
    doc! { "$push": push, "$set": { "updatedAt": now } }
}

// Matching on the reference itself makes the pull a no-op for users that
// do not own the entry.
fn unlink_filter(user_id: &ObjectId, kind: EntryKind, entry_id: &ObjectId) -> Document {
    let mut filter = doc! { "_id": *user_id };
    filter.insert(kind.collection(), *entry_id);
    filter
}

fn unlink_update(kind: EntryKind, entry_id: &ObjectId, now: DateTime) -> Document {
    let mut pull = Document::new();
    pull.insert(kind.collection(), *entry_id);
    doc! { "$pull": pull, "$set": { "updatedAt": now } }
}

fn entry_update(fields: &NewEntry, now: DateTime) -> Result<Document> {
    let mut set = to_document(fields)?;
    set.insert("updatedAt", now);
    let mut update = doc! { "$set": set };
    if fields.description.is_none() {
        update.insert("$unset", doc! { "description": "" });
    }
    Ok(update)
}

/// `$in` gives no ordering guarantee; restores reference-list order and
/// drops ids with no stored entry.
fn in_reference_order(ids: &[ObjectId], found: Vec<Entry>) -> Vec<Entry> {
    let mut by_id: HashMap<ObjectId, Entry> = found.into_iter().map(|e| (e.id, e)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

#[derive(Clone)]
pub struct MongoUserRepository {
    users: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            users: db.collection(USERS_COLLECTION),
        }
    }

    /// Creates the unique indexes backing username/email uniqueness.
    pub async fn ensure_indexes(&self) -> Result<()> {
        for field in ["username", "email"] {
            let mut keys = Document::new();
            keys.insert(field, 1);
            let index = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.users.create_index(index).await?;
            debug!(field = field, "Unique index ensured on users");
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id, username = %user.username))]
    async fn insert_user(&self, user: User) -> Result<()> {
        match self.users.insert_one(&user).await {
            Ok(_) => {
                debug!("User inserted");
                Ok(())
            }
            Err(e) if is_duplicate_key(&e) => {
                warn!("Duplicate key on user insert");
                Err(DomainError::Conflict("Username or email already exists".to_string()).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn find_user_by_id(&self, id: &ObjectId) -> Result<Option<User>> {
        let user = self.users.find_one(doc! { "_id": *id }).await?;
        trace!(found = user.is_some(), "Looked up user by ID");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.find_one(doc! { "username": username }).await?)
    }

    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let cursor = self.users.find(doc! {}).await?;
        let users: Vec<User> = cursor.try_collect().await?;
        Ok(users)
    }

    #[instrument(skip(self, update), fields(user_id = %id))]
    async fn update_user(&self, id: &ObjectId, update: UserUpdate) -> Result<Option<User>> {
        let result = self
            .users
            .find_one_and_update(doc! { "_id": *id }, user_update(update, DateTime::now()))
            .return_document(ReturnDocument::After)
            .await;
        match result {
            Ok(user) => Ok(user),
            Err(e) if is_duplicate_key(&e) => {
                Err(DomainError::Conflict("Username already exists".to_string()).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn delete_user(&self, id: &ObjectId) -> Result<bool> {
        let result = self.users.delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self))]
    async fn link_entry(
        &self,
        user_id: &ObjectId,
        kind: EntryKind,
        entry_id: &ObjectId,
    ) -> Result<bool> {
        let result = self
            .users
            .update_one(
                doc! { "_id": *user_id },
                link_update(kind, entry_id, DateTime::now()),
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    #[instrument(skip(self))]
    async fn unlink_entry(
        &self,
        user_id: &ObjectId,
        kind: EntryKind,
        entry_id: &ObjectId,
    ) -> Result<bool> {
        let result = self
            .users
            .update_one(
                unlink_filter(user_id, kind, entry_id),
                unlink_update(kind, entry_id, DateTime::now()),
            )
            .await?;
        Ok(result.modified_count > 0)
    }
}

#[derive(Clone)]
pub struct MongoEntryRepository {
    entries: Collection<Entry>,
}

impl MongoEntryRepository {
    pub fn new(db: &Database, kind: EntryKind) -> Self {
        Self {
            entries: db.collection(kind.collection()),
        }
    }
}

#[async_trait]
impl EntryRepository for MongoEntryRepository {
    #[instrument(skip(self, entry), fields(entry_id = %entry.id))]
    async fn insert_entry(&self, entry: Entry) -> Result<()> {
        self.entries.insert_one(&entry).await?;
        debug!("Entry inserted");
        Ok(())
    }

    async fn find_entries_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Entry>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .entries
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;
        let found: Vec<Entry> = cursor.try_collect().await?;
        Ok(in_reference_order(ids, found))
    }

    #[instrument(skip(self, fields), fields(entry_id = %id))]
    async fn update_entry(&self, id: &ObjectId, fields: NewEntry) -> Result<Option<Entry>> {
        let update = entry_update(&fields, DateTime::now())?;
        let entry = self
            .entries
            .find_one_and_update(doc! { "_id": *id }, update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(entry)
    }

    async fn delete_entry(&self, id: &ObjectId) -> Result<bool> {
        let result = self.entries.delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }
}
