use crate::domain::entry::{Entry, NewEntry};
use crate::domain::repository::EntryRepository;
use anyhow::Result;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct InMemoryEntryRepository {
    storage: Arc<RwLock<HashMap<ObjectId, Entry>>>,
}

impl InMemoryEntryRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored records, orphans included.
    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.storage.read().await.is_empty()
    }
}

impl Default for InMemoryEntryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryRepository for InMemoryEntryRepository {
    async fn insert_entry(&self, entry: Entry) -> Result<()> {
        let mut storage = self.storage.write().await;
        storage.insert(entry.id, entry);
        Ok(())
    }

    async fn find_entries_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Entry>> {
        let storage = self.storage.read().await;
        Ok(ids.iter().filter_map(|id| storage.get(id).cloned()).collect())
    }

    async fn update_entry(&self, id: &ObjectId, fields: NewEntry) -> Result<Option<Entry>> {
        let mut storage = self.storage.write().await;
        Ok(storage.get_mut(id).map(|entry| {
            entry.apply(fields);
            entry.clone()
        }))
    }

    async fn delete_entry(&self, id: &ObjectId) -> Result<bool> {
        let mut storage = self.storage.write().await;
        Ok(storage.remove(id).is_some())
    }
}
