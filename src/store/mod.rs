//! Record store module
//!
//! Holds the gallery records in process memory for the lifetime of the server.
//! All access goes through a single `RwLock`: reads share it, mutations are exclusive.

mod item;

pub use item::{seed_items, GalleryItem, GalleryPayload};

use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Gallery not found: {0}")]
    NotFound(i64),
}

pub type StoreResult<T> = Result<T, StoreError>;

struct Records {
    items: Vec<GalleryItem>,
    /// Highest id ever handed out; never decreases, so ids are not reused
    last_id: i64,
}

/// In-memory ordered collection of gallery records
pub struct GalleryStore {
    records: RwLock<Records>,
}

impl GalleryStore {
    /// Create a store holding the given records
    pub fn new(items: Vec<GalleryItem>) -> Self {
        let last_id = items.iter().map(|i| i.id).max().unwrap_or(0);
        Self {
            records: RwLock::new(Records { items, last_id }),
        }
    }

    /// Create a store with the built-in seed records
    pub fn seeded() -> Self {
        Self::new(seed_items())
    }

    /// All records in insertion order
    pub async fn list_all(&self) -> Vec<GalleryItem> {
        self.records.read().await.items.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.items.is_empty()
    }

    pub async fn get(&self, id: i64) -> StoreResult<GalleryItem> {
        self.records
            .read()
            .await
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    /// Append a new record with the next id and return it
    pub async fn insert(&self, payload: GalleryPayload) -> GalleryItem {
        let mut records = self.records.write().await;
        records.last_id += 1;
        let item = payload.into_item(records.last_id);
        records.items.push(item.clone());
        item
    }

    /// Overwrite name/image/detail of the record with `id`; the id itself never changes
    pub async fn update(&self, id: i64, payload: GalleryPayload) -> StoreResult<GalleryItem> {
        let mut records = self.records.write().await;
        let item = records
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(StoreError::NotFound(id))?;
        item.name = payload.name;
        item.image = payload.image;
        item.detail = payload.detail;
        Ok(item.clone())
    }

    /// Remove the record with `id`, shifting later records left
    pub async fn delete(&self, id: i64) -> StoreResult<GalleryItem> {
        let mut records = self.records.write().await;
        let pos = records
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(StoreError::NotFound(id))?;
        Ok(records.items.remove(pos))
    }
}

impl Default for GalleryStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn payload(name: &str) -> GalleryPayload {
        GalleryPayload::new(name, &format!("/images/{name}.png"), "detail")
    }

    async fn ids(store: &GalleryStore) -> Vec<i64> {
        store.list_all().await.iter().map(|i| i.id).collect()
    }

    #[tokio::test]
    async fn test_insert_assigns_next_id() {
        let store = GalleryStore::seeded();
        let before = store.len().await;

        let item = store.insert(payload("X")).await;
        assert_eq!(item.id, i64::try_from(before).unwrap() + 1);

        let all = store.list_all().await;
        assert_eq!(all.iter().filter(|i| i.id == item.id).count(), 1);
        assert_eq!(all.last(), Some(&item));
    }

    #[tokio::test]
    async fn test_get_missing_ids() {
        let store = GalleryStore::seeded();
        for id in [-1, 0, 4, i64::MAX, i64::MIN] {
            assert_eq!(store.get(id).await, Err(StoreError::NotFound(id)));
        }
        assert_eq!(store.get(2).await.unwrap().name, "RX-78-2 Gundam");
    }

    #[tokio::test]
    async fn test_update_keeps_id() {
        let store = GalleryStore::seeded();
        let updated = store.update(2, payload("Zaku")).await.unwrap();
        assert_eq!(updated.id, 2);
        assert_eq!(updated.name, "Zaku");
        assert_eq!(updated.image, "/images/Zaku.png");
        assert_eq!(updated.detail, "detail");
        assert_eq!(store.get(2).await.unwrap(), updated);
        assert_eq!(ids(&store).await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_update_missing_leaves_store_unchanged() {
        let store = GalleryStore::seeded();
        let before = store.list_all().await;
        assert_eq!(
            store.update(42, payload("nope")).await,
            Err(StoreError::NotFound(42))
        );
        assert_eq!(store.list_all().await, before);
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one() {
        let store = GalleryStore::seeded();
        let removed = store.delete(2).await.unwrap();
        assert_eq!(removed.id, 2);
        assert_eq!(ids(&store).await, vec![1, 3]);

        // Second delete of the same id is a miss and changes nothing
        assert_eq!(store.delete(2).await, Err(StoreError::NotFound(2)));
        assert_eq!(ids(&store).await, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let store = GalleryStore::seeded();
        assert_eq!(store.insert(payload("four")).await.id, 4);
        store.delete(2).await.unwrap();
        assert_eq!(store.insert(payload("five")).await.id, 5);
        assert_eq!(ids(&store).await, vec![1, 3, 4, 5]);

        // Deleting the newest record does not roll the counter back
        store.delete(5).await.unwrap();
        assert_eq!(store.insert(payload("six")).await.id, 6);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = GalleryStore::default();
        assert!(store.is_empty().await);
        assert_eq!(store.insert(payload("first")).await.id, 1);
        assert!(!store.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_get_distinct_ids() {
        let store = Arc::new(GalleryStore::seeded());
        let mut handles = Vec::new();
        for n in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert(payload(&format!("item{n}"))).await.id
            }));
        }
        let mut new_ids = Vec::new();
        for handle in handles {
            new_ids.push(handle.await.unwrap());
        }
        new_ids.sort_unstable();
        assert_eq!(new_ids, (4..54).collect::<Vec<i64>>());
        assert_eq!(store.len().await, 53);
    }
}
