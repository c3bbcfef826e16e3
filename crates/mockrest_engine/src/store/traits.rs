/* 📖 # Why create a SeedProvider trait?

The engine never owns the initial data. Whoever embeds it supplies a provider that builds a
fresh Database; the engine calls it once at construction and again on every `resetdb`
command. A closure is enough for most tests, while `JsonSeed` covers file-based seeds.
*/

use std::path::Path;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_json::Value;

use mockrest_base::{ErrorKind, MockApiError, MockApiResult};

use crate::store::memory::Database;

/// Source of the initial collection store.
pub trait SeedProvider: Send + Sync + 'static {
    /// Build a fresh database. Called on construction and on every reset.
    fn create_db(&self) -> MockApiResult<Database>;
}

impl<F> SeedProvider for F
where
    F: Fn() -> MockApiResult<Database> + Send + Sync + 'static,
{
    fn create_db(&self) -> MockApiResult<Database> {
        self()
    }
}

/// Seed provider backed by a JSON document `{ "<collection>": [ ... ] }`.
#[derive(Debug, Clone)]
pub struct JsonSeed {
    document: Value,
}

impl JsonSeed {
    /// Wrap an already parsed seed document.
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    /// Parse a seed document from JSON text.
    pub fn from_json_str(text: &str) -> MockApiResult<Self> {
        let document = serde_json::from_str(text).map_err(|e| {
            Box::new(MockApiError::new(ErrorKind::Seed {
                message: e.to_string(),
            }))
        })?;
        Ok(Self::new(document))
    }

    /// Read a seed document from a file.
    pub fn load(path: &Path) -> MockApiResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Box::new(MockApiError::new(ErrorKind::Seed {
                message: format!("cannot read {}: {}", path.display(), e),
            }))
        })?;
        Self::from_json_str(&text)
    }
}

impl SeedProvider for JsonSeed {
    fn create_db(&self) -> MockApiResult<Database> {
        Database::from_json(self.document.clone())
    }
}

/// A shared handle to one engine's database.
///
/// StoreHandle provides cheap cloning (via Arc) and interior mutability (via RwLock).
/// Guards must not be held across an `.await`.
#[derive(Clone, Debug)]
pub struct StoreHandle(Arc<RwLock<Database>>);

impl StoreHandle {
    /// Create a new StoreHandle owning the given database.
    pub fn new(db: Database) -> Self {
        Self(Arc::new(RwLock::new(db)))
    }

    /// Lock the database for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Database> {
        self.0.read()
    }

    /// Lock the database for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, Database> {
        self.0.write()
    }

    /// Swap in a whole new database.
    pub fn replace(&self, db: Database) {
        *self.0.write() = db;
    }

    /// A deep copy of the current contents.
    pub fn snapshot(&self) -> Database {
        self.0.read().clone()
    }

    /// Check if a collection exists.
    pub fn contains_collection(&self, name: &str) -> bool {
        self.0.read().contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Collection;
    use serde_json::json;

    #[test]
    fn test_closure_seed_provider() {
        let seed = || Ok(Database::new().with_collection("heroes", Collection::new()));
        let db = seed.create_db().unwrap();
        assert!(db.contains("heroes"));
    }

    #[test]
    fn test_json_seed_creates_fresh_copies() {
        let seed = JsonSeed::from_json_str(r#"{"heroes": [{"id": 1, "name": "A"}]}"#).unwrap();
        let mut first = seed.create_db().unwrap();
        first.get_mut("heroes").unwrap().remove(&1.into());

        let second = seed.create_db().unwrap();
        assert_eq!(second.get("heroes").unwrap().len(), 1);
    }

    #[test]
    fn test_json_seed_rejects_invalid_json() {
        let err = JsonSeed::from_json_str("{not json").unwrap_err();
        assert!(err.to_string().starts_with("Unable to create database:"));
    }

    #[test]
    fn test_store_handle_replace_and_snapshot() {
        let handle = StoreHandle::new(Database::from_json(json!({"a": []})).unwrap());
        let clone = handle.clone();
        clone.replace(Database::from_json(json!({"b": [{"id": 1}]})).unwrap());

        assert!(!handle.contains_collection("a"));
        assert!(handle.contains_collection("b"));

        let mut snapshot = handle.snapshot();
        snapshot.get_mut("b").unwrap().remove(&1.into());
        assert_eq!(handle.read().get("b").unwrap().len(), 1);
    }
}
