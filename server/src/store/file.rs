//! JSON file backend.
//!
//! The whole collection lives in one pretty-printed JSON array and every
//! operation is a full read-modify-write. Operations inside this process are
//! serialised by `lock`; other processes writing the same file are not
//! coordinated with and the last writer wins.

use std::path::{Path, PathBuf};

use tokio::{fs, sync::Mutex};

use super::{ItemStore, StoreError};
use crate::item::{display_cmp, Item, ItemChanges};

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, creating the file with `[]` if it is absent.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !fs::try_exists(&path).await? {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&path, "[]").await?;
            tracing::info!(path = %path.display(), "initialized empty todo file");
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as empty so the next write recreates it.
    async fn read(&self) -> Result<Vec<Item>, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    async fn write(&self, items: &[Item]) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(items)?;
        fs::write(&self.path, raw).await?;
        Ok(())
    }
}

impl ItemStore for FileStore {
    async fn list_all(&self) -> Result<Vec<Item>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut items = match self.read().await {
            Ok(items) => items,
            Err(error) => {
                tracing::warn!(%error, path = %self.path.display(), "failed to read todo file");
                return Ok(Vec::new());
            }
        };
        items.sort_by(display_cmp);
        Ok(items)
    }

    async fn create(&self, item: Item) -> Result<Item, StoreError> {
        let _guard = self.lock.lock().await;
        let mut items = self.read().await?;
        items.push(item.clone());
        self.write(&items).await?;
        Ok(item)
    }

    async fn update(&self, id: &str, changes: ItemChanges) -> Result<Option<Item>, StoreError> {
        if changes.is_empty() {
            return Ok(None);
        }
        let _guard = self.lock.lock().await;
        let mut items = self.read().await?;
        let Some(item) = items.iter_mut().find(|item| item.id == id) else {
            return Ok(None);
        };
        changes.apply_to(item);
        let updated = item.clone();
        self.write(&items).await?;
        Ok(Some(updated))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut items = self.read().await?;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.write(&items).await?;
        Ok(true)
    }

    fn backend(&self) -> &'static str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn item(id: &str, order: i64, created_at: i64) -> Item {
        Item {
            id: id.to_string(),
            text: format!("text {id}"),
            completed: false,
            created_at,
            order,
        }
    }

    async fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("todos.json")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn open_initializes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("todos.json");
        let store = FileStore::open(&path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_keeps_existing_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.json");
        std::fs::write(
            &path,
            r#"[{"id":"legacy","text":"Old","completed":false,"createdAt":1}]"#,
        )
        .unwrap();
        let store = FileStore::open(&path).await.unwrap();
        let items = store.list_all().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].order, 0);
    }

    #[tokio::test]
    async fn list_sorts_by_order_then_newest() {
        let (_dir, store) = store().await;
        store.create(item("b", 1, 10)).await.unwrap();
        store.create(item("a", 0, 10)).await.unwrap();
        store.create(item("c", 0, 20)).await.unwrap();

        let ids: Vec<_> = store.list_all().await.unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[tokio::test]
    async fn file_is_pretty_printed() {
        let (_dir, store) = store().await;
        store.create(item("a", 0, 1)).await.unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("[\n  {\n    \"id\": \"a\""));
    }

    #[tokio::test]
    async fn update_applies_partial_changes() {
        let (_dir, store) = store().await;
        store.create(item("a", 2, 7)).await.unwrap();

        let changes = ItemChanges {
            completed: Some(true),
            ..ItemChanges::default()
        };
        let updated = store.update("a", changes).await.unwrap().unwrap();
        assert!(updated.completed);
        assert_eq!(updated.text, "text a");
        assert_eq!(updated.order, 2);
        assert_eq!(updated.created_at, 7);
        assert_eq!(store.list_all().await.unwrap()[0], updated);
    }

    #[tokio::test]
    async fn update_unknown_or_empty_is_none() {
        let (_dir, store) = store().await;
        store.create(item("a", 0, 1)).await.unwrap();
        assert!(store.update("zzz", ItemChanges::order(3)).await.unwrap().is_none());
        assert!(store.update("a", ItemChanges::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_reports_whether_removed() {
        let (_dir, store) = store().await;
        store.create(item("a", 0, 1)).await.unwrap();
        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_degrades_reads_but_fails_writes() {
        let (_dir, store) = store().await;
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(store.list_all().await.unwrap().is_empty());
        let err = store.create(item("a", 0, 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{not json");
    }

    #[tokio::test]
    async fn removed_file_is_recreated_on_next_write() {
        let (_dir, store) = store().await;
        store.create(item("a", 0, 1)).await.unwrap();
        std::fs::remove_file(store.path()).unwrap();

        assert!(store.list_all().await.unwrap().is_empty());
        store.create(item("b", 0, 2)).await.unwrap();
        let ids: Vec<_> = store.list_all().await.unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, ["b"]);
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let (_dir, store) = store().await;
        let store = Arc::new(store);
        for (n, id) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            store.create(item(id, n as i64, 1)).await.unwrap();
        }

        let ids = ["e", "d", "c", "b", "a"];
        let updates = ids.iter().enumerate().map(|(position, id)| {
            let store = Arc::clone(&store);
            async move { store.update(id, ItemChanges::order(position as i64)).await }
        });
        futures::future::try_join_all(updates).await.unwrap();

        let listed: Vec<_> = store.list_all().await.unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(listed, ids);
    }
}
