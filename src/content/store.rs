//! The content log: the authoritative, persisted, insertion-ordered
//! collection of posted items.
//!
//! All mutations serialize on one async lock around the full
//! read-modify-write cycle. Two concurrent adds each see the other's item;
//! neither can clobber the snapshot the other just wrote. If the durable
//! write fails the in-memory collection is left exactly as it was, so
//! memory and disk never diverge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::ServerError;
use crate::store::{SnapshotFile, StoreError};

/// Snapshot document name inside the data directory.
pub const CONTENT_FILE: &str = "contents.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
}

/// One posted item. Items are never edited in place; they exist from an
/// accepted add until an explicit delete or clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub kind: ContentKind,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct ContentStore {
    file: SnapshotFile<ContentItem>,
    items: Mutex<Vec<ContentItem>>,
}

impl ContentStore {
    /// Open the store, loading the durable snapshot if one exists.
    pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let file = SnapshotFile::new(data_dir.join(CONTENT_FILE));
        let items = file.load().await?;
        tracing::debug!(count = items.len(), "Content store opened");
        Ok(Self {
            file,
            items: Mutex::new(items),
        })
    }

    /// Full collection in insertion order.
    pub async fn list(&self) -> Vec<ContentItem> {
        self.items.lock().await.clone()
    }

    /// Validate, append and persist a new item, returning it with its
    /// freshly generated id. The id is a random UUID, never derived from
    /// the clock: two adds within the same tick must not collide.
    pub async fn add(
        &self,
        kind: ContentKind,
        body: String,
        image_url: Option<String>,
    ) -> Result<ContentItem, ServerError> {
        match kind {
            ContentKind::Text => {
                if body.trim().is_empty() {
                    return Err(ServerError::BadRequest(
                        "Text content must not be empty".to_string(),
                    ));
                }
                if image_url.is_some() {
                    return Err(ServerError::BadRequest(
                        "Text content cannot carry an image URL".to_string(),
                    ));
                }
            }
            ContentKind::Image => {
                if image_url.is_none() {
                    return Err(ServerError::BadRequest(
                        "Image content requires an image URL".to_string(),
                    ));
                }
            }
        }

        let now = Utc::now();
        let item = ContentItem {
            id: Uuid::new_v4().to_string(),
            kind,
            body,
            image_url,
            created_at: now,
            updated_at: now,
        };

        let mut items = self.items.lock().await;
        let mut next = items.clone();
        next.push(item.clone());
        self.file.persist(&next).await?;
        *items = next;

        Ok(item)
    }

    /// Remove the item with the given id and persist. A missing id is a
    /// normal outcome, reported as `false`.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut items = self.items.lock().await;
        let next: Vec<ContentItem> = items.iter().filter(|item| item.id != id).cloned().collect();
        if next.len() == items.len() {
            return Ok(false);
        }
        self.file.persist(&next).await?;
        *items = next;
        Ok(true)
    }

    /// Empty the collection and persist the empty snapshot. Idempotent.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut items = self.items.lock().await;
        self.file.persist(&[]).await?;
        items.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn add_text_stamps_id_and_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path()).await.unwrap();

        let item = store
            .add(ContentKind::Text, "hello".to_string(), None)
            .await
            .unwrap();

        assert_eq!(item.kind, ContentKind::Text);
        assert_eq!(item.body, "hello");
        assert!(item.image_url.is_none());
        assert!(!item.id.is_empty());
        assert_eq!(item.created_at, item.updated_at);
    }

    #[tokio::test]
    async fn insertion_order_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path()).await.unwrap();

        store
            .add(ContentKind::Text, "a".to_string(), None)
            .await
            .unwrap();
        store
            .add(ContentKind::Text, "b".to_string(), None)
            .await
            .unwrap();

        let bodies: Vec<String> = store.list().await.into_iter().map(|i| i.body).collect();
        assert_eq!(bodies, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn delete_removes_exactly_the_item() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path()).await.unwrap();

        let item = store
            .add(ContentKind::Text, "hello".to_string(), None)
            .await
            .unwrap();

        assert!(store.delete(&item.id).await.unwrap());
        assert!(store.list().await.is_empty());

        // Absence is a normal outcome, not an error
        assert!(!store.delete(&item.id).await.unwrap());
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path()).await.unwrap();

        store
            .add(ContentKind::Text, "x".to_string(), None)
            .await
            .unwrap();

        store.clear().await.unwrap();
        assert!(store.list().await.is_empty());
        store.clear().await.unwrap();
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn empty_text_body_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path()).await.unwrap();

        let err = store.add(ContentKind::Text, "   ".to_string(), None).await;
        assert!(matches!(err, Err(ServerError::BadRequest(_))));
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn image_without_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path()).await.unwrap();

        let err = store
            .add(ContentKind::Image, "photo.png".to_string(), None)
            .await;
        assert!(matches!(err, Err(ServerError::BadRequest(_))));
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = ContentStore::open(dir.path()).await.unwrap();
        let item = store
            .add(ContentKind::Text, "durable".to_string(), None)
            .await
            .unwrap();
        drop(store);

        let reopened = ContentStore::open(dir.path()).await.unwrap();
        let items = reopened.list().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, item.id);
        assert_eq!(items[0].body, "durable");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_adds_lose_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ContentStore::open(dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .add(ContentKind::Text, format!("item-{i}"), None)
                    .await
                    .unwrap()
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().id);
        }
        assert_eq!(ids.len(), 16, "every add must get a unique id");
        assert_eq!(store.list().await.len(), 16, "no add may be clobbered");

        // The durable snapshot carries all of them too
        let reopened = ContentStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.list().await.len(), 16);
    }

    #[tokio::test]
    async fn failed_persist_rolls_back_memory() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("board");

        // Nothing persisted yet, so open() leaves the directory uncreated.
        let store = ContentStore::open(&data_dir).await.unwrap();

        // Occupy the data-dir path with a regular file so the snapshot
        // write cannot succeed.
        std::fs::write(&data_dir, b"in the way").unwrap();

        let err = store
            .add(ContentKind::Text, "doomed".to_string(), None)
            .await;
        assert!(matches!(err, Err(ServerError::Storage(_))));
        assert!(
            store.list().await.is_empty(),
            "memory must match the (unwritten) disk state"
        );
    }
}
