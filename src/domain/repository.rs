use crate::domain::entry::{Entry, EntryKind, NewEntry};
use crate::domain::user::{User, UserUpdate};
use anyhow::Result;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores a new user. Fails with a `DomainError::Conflict` when the
    /// username or email is already taken.
    async fn insert_user(&self, user: User) -> Result<()>;
    async fn find_user_by_id(&self, id: &ObjectId) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn update_user(&self, id: &ObjectId, update: UserUpdate) -> Result<Option<User>>;
    async fn delete_user(&self, id: &ObjectId) -> Result<bool>;

    /// Appends `entry_id` to the user's reference list for `kind`.
    /// Returns false when the user does not exist.
    async fn link_entry(
        &self,
        user_id: &ObjectId,
        kind: EntryKind,
        entry_id: &ObjectId,
    ) -> Result<bool>;

    /// Removes `entry_id` from the user's reference list for `kind`.
    /// Returns false when the user does not hold that reference.
    async fn unlink_entry(
        &self,
        user_id: &ObjectId,
        kind: EntryKind,
        entry_id: &ObjectId,
    ) -> Result<bool>;
}

/// One store per entry kind.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    async fn insert_entry(&self, entry: Entry) -> Result<()>;
    /// Entries whose id is in `ids`, in the order of `ids`. Unknown ids are skipped.
    async fn find_entries_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Entry>>;
    async fn update_entry(&self, id: &ObjectId, fields: NewEntry) -> Result<Option<Entry>>;
    async fn delete_entry(&self, id: &ObjectId) -> Result<bool>;
}
