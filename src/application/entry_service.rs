use crate::domain::entry::{Entry, EntryKind, EntryRequest};
use crate::domain::error::DomainError;
use crate::domain::repository::{EntryRepository, UserRepository};
use crate::domain::user::User;
use crate::domain::validation::{validate_entry, validate_user_id};
use anyhow::Result;
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Income or expense bookkeeping for one entry kind.
pub struct EntryService {
    kind: EntryKind,
    user_repository: Arc<dyn UserRepository>,
    entry_repository: Arc<dyn EntryRepository>,
}

impl EntryService {
    pub fn new(
        kind: EntryKind,
        user_repository: Arc<dyn UserRepository>,
        entry_repository: Arc<dyn EntryRepository>,
    ) -> Self {
        Self {
            kind,
            user_repository,
            entry_repository,
        }
    }

    #[instrument(skip(self, req), fields(kind = %self.kind))]
    pub async fn add_entry(&self, user_id: &str, req: EntryRequest) -> Result<Entry> {
        let user_id = validate_user_id(user_id)?;
        let fields = validate_entry(self.kind, req).map_err(DomainError::from)?;
        let user = self.find_user(&user_id).await?;

        let entry = Entry::new(fields);
        self.entry_repository.insert_entry(entry.clone()).await?;
        debug!(entry_id = %entry.id, "Entry stored, linking to user");

        match self
            .user_repository
            .link_entry(&user.id, self.kind, &entry.id)
            .await
        {
            Ok(true) => {
                info!(user_id = %user.id, entry_id = %entry.id, "Entry added");
                Ok(entry)
            }
            Ok(false) => {
                warn!(user_id = %user.id, "User disappeared before entry could be linked");
                self.discard_unlinked(&entry.id).await;
                Err(DomainError::NotFound("User not found".to_string()).into())
            }
            Err(e) => {
                error!(user_id = %user.id, error = %e, "Failed to link entry to user");
                self.discard_unlinked(&entry.id).await;
                Err(e)
            }
        }
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn list_entries(&self, user_id: &str) -> Result<Vec<Entry>> {
        let user_id = validate_user_id(user_id)?;
        let user = self.find_user(&user_id).await?;
        let entries = self
            .entry_repository
            .find_entries_by_ids(user.entry_refs(self.kind))
            .await?;
        debug!(count = entries.len(), "Entries listed");
        Ok(entries)
    }

    /// Drops the entry from the user's reference list. The record itself
    /// stays in the store.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn delete_entry(&self, user_id: &str, entry_id: &str) -> Result<()> {
        let user_id = validate_user_id(user_id)?;
        let user = self.find_user(&user_id).await?;
        let entry_id = self.owned_entry_id(&user, entry_id)?;

        if !self
            .user_repository
            .unlink_entry(&user.id, self.kind, &entry_id)
            .await?
        {
            // Lost a race with another delete of the same entry.
            return Err(self.entry_not_found());
        }
        info!(user_id = %user.id, entry_id = %entry_id, "Entry unlinked");
        Ok(())
    }

    #[instrument(skip(self, req), fields(kind = %self.kind))]
    pub async fn update_entry(
        &self,
        user_id: &str,
        entry_id: &str,
        req: EntryRequest,
    ) -> Result<Entry> {
        let user_id = validate_user_id(user_id)?;
        let fields = validate_entry(self.kind, req).map_err(DomainError::from)?;
        let user = self.find_user(&user_id).await?;
        let entry_id = self.owned_entry_id(&user, entry_id)?;

        let entry = self
            .entry_repository
            .update_entry(&entry_id, fields)
            .await?
            .ok_or_else(|| {
                warn!(entry_id = %entry_id, "Referenced entry is missing from the store");
                self.entry_not_found()
            })?;
        info!(user_id = %user.id, entry_id = %entry.id, "Entry updated");
        Ok(entry)
    }

    async fn find_user(&self, user_id: &ObjectId) -> Result<User> {
        self.user_repository
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %user_id, "User not found");
                DomainError::NotFound("User not found".to_string()).into()
            })
    }

    // Malformed ids cannot be in the list, so they are "not found" too.
    fn owned_entry_id(&self, user: &User, entry_id: &str) -> Result<ObjectId> {
        ObjectId::parse_str(entry_id)
            .ok()
            .filter(|id| user.owns(self.kind, id))
            .ok_or_else(|| {
                warn!(user_id = %user.id, entry_id = entry_id, "Entry not owned by user");
                self.entry_not_found()
            })
    }

    fn entry_not_found(&self) -> anyhow::Error {
        DomainError::NotFound(format!("{} not found", self.kind)).into()
    }

    async fn discard_unlinked(&self, entry_id: &ObjectId) {
        match self.entry_repository.delete_entry(entry_id).await {
            Ok(_) => debug!(entry_id = %entry_id, "Unlinked entry discarded"),
            Err(e) => error!(
                entry_id = %entry_id,
                error = %e,
                "Failed to discard unlinked entry, orphan left behind"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryEntryRepository;
    use crate::data::user_repository::InMemoryUserRepository;
    use crate::domain::entry::NewEntry;
    use crate::domain::user::{NewUser, UserUpdate};
    use async_trait::async_trait;

    struct Fixture {
        users: Arc<InMemoryUserRepository>,
        entries: Arc<InMemoryEntryRepository>,
        service: EntryService,
        user: User,
    }

    async fn fixture(kind: EntryKind) -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let entries = Arc::new(InMemoryEntryRepository::new());
        let user = User::new(
            NewUser {
                full_name: "Test User".to_string(),
                username: "tester".to_string(),
                email: "tester@example.com".to_string(),
                password: "unused".to_string(),
            },
            "hash".to_string(),
        );
        users.insert_user(user.clone()).await.unwrap();
        let service = EntryService::new(kind, users.clone(), entries.clone());
        Fixture {
            users,
            entries,
            service,
            user,
        }
    }

    fn expense(title: &str, amount: f64) -> EntryRequest {
        EntryRequest {
            title: Some(title.to_string()),
            description: Some("desc".to_string()),
            amount: Some(amount),
            tag: Some("food".to_string()),
            currency: Some("ILS".to_string()),
        }
    }

    fn not_found_message(err: &anyhow::Error) -> Option<String> {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::NotFound(msg)) => Some(msg.clone()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let f = fixture(EntryKind::Expense).await;
        let user_id = f.user.id.to_hex();

        let added = f
            .service
            .add_entry(&user_id, expense("Coffee", 12.5))
            .await
            .unwrap();
        let listed = f.service.list_entries(&user_id).await.unwrap();

        assert_eq!(listed, vec![added.clone()]);
        let stored = f.users.find_user_by_id(&f.user.id).await.unwrap().unwrap();
        assert_eq!(stored.expenses, vec![added.id]);
        assert!(stored.incomes.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_user_id_is_rejected_before_lookup() {
        let f = fixture(EntryKind::Expense).await;
        let err = f
            .service
            .add_entry("not-an-id", expense("Coffee", 1.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::InvalidIdentifier)
        ));
        assert!(f.entries.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let f = fixture(EntryKind::Expense).await;
        let err = f
            .service
            .list_entries(&ObjectId::new().to_hex())
            .await
            .unwrap_err();
        assert_eq!(not_found_message(&err).as_deref(), Some("User not found"));
    }

    #[tokio::test]
    async fn test_delete_keeps_orphan_record() {
        let f = fixture(EntryKind::Expense).await;
        let user_id = f.user.id.to_hex();
        let added = f
            .service
            .add_entry(&user_id, expense("Coffee", 3.0))
            .await
            .unwrap();

        f.service
            .delete_entry(&user_id, &added.id.to_hex())
            .await
            .unwrap();

        assert!(f.service.list_entries(&user_id).await.unwrap().is_empty());
        assert_eq!(f.entries.len().await, 1);

        // Second delete: no longer owned
        let err = f
            .service
            .delete_entry(&user_id, &added.id.to_hex())
            .await
            .unwrap_err();
        assert_eq!(not_found_message(&err).as_deref(), Some("expense not found"));
    }

    #[tokio::test]
    async fn test_delete_with_malformed_entry_id() {
        let f = fixture(EntryKind::Income).await;
        let err = f
            .service
            .delete_entry(&f.user.id.to_hex(), "xyz")
            .await
            .unwrap_err();
        assert_eq!(not_found_message(&err).as_deref(), Some("income not found"));
    }

    #[tokio::test]
    async fn test_update_requires_ownership() {
        let f = fixture(EntryKind::Expense).await;
        let stranger = Entry::new(NewEntry {
            title: "Not yours".to_string(),
            description: Some("x".to_string()),
            amount: 1.0,
            tag: "food".to_string(),
            currency: Default::default(),
        });
        f.entries.insert_entry(stranger.clone()).await.unwrap();

        let err = f
            .service
            .update_entry(&f.user.id.to_hex(), &stranger.id.to_hex(), expense("Mine", 2.0))
            .await
            .unwrap_err();
        assert_eq!(not_found_message(&err).as_deref(), Some("expense not found"));

        let untouched = f.entries.find_entries_by_ids(&[stranger.id]).await.unwrap();
        assert_eq!(untouched[0].title, "Not yours");
    }

    #[tokio::test]
    async fn test_update_overwrites_fields() {
        let f = fixture(EntryKind::Expense).await;
        let user_id = f.user.id.to_hex();
        let added = f
            .service
            .add_entry(&user_id, expense("Coffee", 12.5))
            .await
            .unwrap();

        let updated = f
            .service
            .update_entry(&user_id, &added.id.to_hex(), expense("Tea", 8.0))
            .await
            .unwrap();

        assert_eq!(updated.id, added.id);
        assert_eq!(updated.title, "Tea");
        assert_eq!(updated.amount, 8.0);
        assert_eq!(updated.created_at, added.created_at);
    }

    /// Store whose link step always fails, to exercise the compensation path.
    struct FailingLinkRepository {
        inner: InMemoryUserRepository,
    }

    #[async_trait]
    impl UserRepository for FailingLinkRepository {
        async fn insert_user(&self, user: User) -> Result<()> {
            self.inner.insert_user(user).await
        }
        async fn find_user_by_id(&self, id: &ObjectId) -> Result<Option<User>> {
            self.inner.find_user_by_id(id).await
        }
        async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
            self.inner.find_user_by_username(username).await
        }
        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
            self.inner.find_user_by_email(email).await
        }
        async fn list_users(&self) -> Result<Vec<User>> {
            self.inner.list_users().await
        }
        async fn update_user(&self, id: &ObjectId, update: UserUpdate) -> Result<Option<User>> {
            self.inner.update_user(id, update).await
        }
        async fn delete_user(&self, id: &ObjectId) -> Result<bool> {
            self.inner.delete_user(id).await
        }
        async fn link_entry(&self, _: &ObjectId, _: EntryKind, _: &ObjectId) -> Result<bool> {
            Err(anyhow::anyhow!("write concern timeout"))
        }
        async fn unlink_entry(
            &self,
            user_id: &ObjectId,
            kind: EntryKind,
            entry_id: &ObjectId,
        ) -> Result<bool> {
            self.inner.unlink_entry(user_id, kind, entry_id).await
        }
    }

    #[tokio::test]
    async fn test_failed_link_discards_new_entry() {
        let f = fixture(EntryKind::Expense).await;
        let users = Arc::new(FailingLinkRepository {
            inner: (*f.users).clone(),
        });
        let service = EntryService::new(EntryKind::Expense, users, f.entries.clone());

        let err = service
            .add_entry(&f.user.id.to_hex(), expense("Coffee", 1.0))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<DomainError>().is_none());
        assert!(f.entries.is_empty().await);
    }
}
