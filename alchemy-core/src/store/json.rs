//! Durable JSON-file store.
//!
//! The catalogue lives in one versioned JSON snapshot. Several stores, in this
//! process or others, may share the same file: every operation takes an
//! advisory lock on a sibling `.lock` file (shared for reads, exclusive for
//! writes) and reloads the snapshot under it, so insert-if-absent decisions
//! always see every committed row. Writes go to a temporary sibling file and
//! are renamed into place, so a crash never leaves a half-written snapshot.

use super::memory::Tables;
use super::{ElementInsert, ElementStore, RecipeInsert};
use crate::element::{Element, NewElement, Recipe};
use crate::error::StoreError;
use crate::id::ElementId;
use crate::pair::PairKey;
use async_trait::async_trait;
use chrono::Utc;
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Current snapshot format version.
const SNAPSHOT_VERSION: u32 = 1;

/// On-disk layout.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    saved_at: String,
    elements: Vec<Element>,
    recipes: Vec<Recipe>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockMode {
    Shared,
    Exclusive,
}

/// Advisory lock on the store's lock file, released when dropped.
#[derive(Debug)]
struct FileLock {
    _file: std::fs::File,
}

impl FileLock {
    /// Blocks until the lock is granted.
    fn acquire(path: &Path, mode: LockMode) -> Result<Self, StoreError> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        match mode {
            LockMode::Shared => FileExt::lock_shared(&file)?,
            LockMode::Exclusive => FileExt::lock_exclusive(&file)?,
        }
        Ok(Self { _file: file })
    }
}

/// File-backed store that survives restarts.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileStore {
    /// Open a store at `path`, creating and seeding it if the file is missing.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let store = Self {
            lock_path: sibling_path(&path, ".lock"),
            path,
        };

        let _lock = store.lock(LockMode::Exclusive).await?;
        if fs::try_exists(&store.path).await? {
            load_snapshot(&store.path).await?;
            tracing::debug!(path = %store.path.display(), "opened element store");
        } else {
            write_snapshot(&store.path, &Tables::seeded()).await?;
            tracing::info!(path = %store.path.display(), "created element store");
        }
        Ok(store)
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn lock(&self, mode: LockMode) -> Result<FileLock, StoreError> {
        let lock_path = self.lock_path.clone();
        tokio::task::spawn_blocking(move || FileLock::acquire(&lock_path, mode))
            .await
            .map_err(|e| StoreError::Unavailable {
                reason: format!("lock task failed: {e}"),
            })?
    }

    /// Run a query against the committed snapshot.
    async fn read<T: Send>(&self, query: impl FnOnce(&Tables) -> T + Send) -> Result<T, StoreError> {
        let _lock = self.lock(LockMode::Shared).await?;
        let tables = load_snapshot(&self.path).await?;
        Ok(query(&tables))
    }

    /// Apply a mutation to the committed snapshot and persist it if it wrote.
    async fn write<T: Send>(
        &self,
        mutation: impl FnOnce(&mut Tables) -> Result<(T, bool), StoreError> + Send,
    ) -> Result<T, StoreError> {
        let _lock = self.lock(LockMode::Exclusive).await?;
        let mut tables = load_snapshot(&self.path).await?;
        let (outcome, changed) = mutation(&mut tables)?;
        if changed {
            write_snapshot(&self.path, &tables).await?;
        }
        Ok(outcome)
    }
}

async fn load_snapshot(path: &Path) -> Result<Tables, StoreError> {
    let content = fs::read_to_string(path).await?;
    let snapshot: Snapshot = serde_json::from_str(&content)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(StoreError::VersionMismatch {
            expected: SNAPSHOT_VERSION,
            found: snapshot.version,
        });
    }
    Tables::from_rows(snapshot.elements, snapshot.recipes)
}

async fn write_snapshot(path: &Path, tables: &Tables) -> Result<(), StoreError> {
    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        saved_at: Utc::now().to_rfc3339(),
        elements: tables.elements(),
        recipes: tables.recipes(),
    };
    let content = serde_json::to_string_pretty(&snapshot)?;

    let tmp = sibling_path(path, ".tmp");
    fs::write(&tmp, content).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

#[async_trait]
impl ElementStore for JsonFileStore {
    async fn get_element(&self, id: ElementId) -> Result<Option<Element>, StoreError> {
        self.read(|t| t.get_element(id)).await
    }

    async fn get_element_by_name(&self, name: &str) -> Result<Option<Element>, StoreError> {
        self.read(|t| t.get_element_by_name(name)).await
    }

    async fn list_elements(&self) -> Result<Vec<Element>, StoreError> {
        self.read(Tables::elements).await
    }

    async fn insert_element(&self, element: NewElement) -> Result<ElementInsert, StoreError> {
        self.write(|t| {
            let outcome = t.insert_element(element)?;
            let created = outcome.was_created();
            Ok((outcome, created))
        })
        .await
    }

    async fn get_recipe(&self, pair: PairKey) -> Result<Option<Recipe>, StoreError> {
        self.read(|t| t.get_recipe(pair)).await
    }

    async fn insert_recipe(
        &self,
        pair: PairKey,
        result: ElementId,
    ) -> Result<RecipeInsert, StoreError> {
        self.write(|t| {
            let outcome = t.insert_recipe(pair, result);
            let inserted = matches!(outcome, RecipeInsert::Inserted(_));
            Ok((outcome, inserted))
        })
        .await
    }

    async fn list_recipes_by_result(&self, result: ElementId) -> Result<Vec<Recipe>, StoreError> {
        self.read(|t| t.recipes_by_result(result)).await
    }

    async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        self.read(Tables::recipes).await
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_paths() {
        let path = Path::new("/var/lib/alchemy/store.json");
        assert_eq!(
            sibling_path(path, ".tmp"),
            PathBuf::from("/var/lib/alchemy/store.json.tmp")
        );
        assert_eq!(
            sibling_path(path, ".lock"),
            PathBuf::from("/var/lib/alchemy/store.json.lock")
        );
    }

    #[tokio::test]
    async fn test_open_creates_seeded_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        assert!(store.is_durable());
        assert!(path.exists());
        assert_eq!(store.list_elements().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let content = serde_json::json!({
            "version": 99,
            "saved_at": "2024-01-01T00:00:00Z",
            "elements": [],
            "recipes": []
        });
        std::fs::write(&path, content.to_string()).unwrap();

        let err = JsonFileStore::open(&path).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionMismatch {
                expected: 1,
                found: 99
            }
        ));
    }

    #[tokio::test]
    async fn test_second_opener_sees_committed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let left = JsonFileStore::open(&path).await.unwrap();
        let right = JsonFileStore::open(&path).await.unwrap();
        let pair = PairKey::from_ordered(ElementId(1), ElementId(2));

        let first = left.insert_recipe(pair, ElementId(3)).await.unwrap();
        assert!(matches!(first, RecipeInsert::Inserted(_)));

        let second = right.insert_recipe(pair, ElementId(4)).await.unwrap();
        assert_eq!(second, RecipeInsert::AlreadyExists(Recipe::new(pair, ElementId(3))));
        assert_eq!(right.get_recipe(pair).await.unwrap().map(|r| r.result), Some(ElementId(3)));
    }
}
