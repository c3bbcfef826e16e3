/* 📖 # Why keep collections as plain vectors?

Clients observe collection order: a GET without paging lists records in insertion order and
paging slices that order. A `Vec<Record>` keeps it for free, and lookups by id are linear
scans, which is fine for the handful of records a simulated backend holds.
*/

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Number, Value};
use tracing::debug;

use mockrest_base::{ErrorKind, MockApiError, MockApiResult};

use crate::record::{Record, RecordId};

/// Outcome of [`Collection::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A record with the same id existed and was replaced in place
    Replaced,
    /// The record was appended
    Inserted,
}

/// An ordered list of records simulating one REST resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Collection {
    records: Vec<Record>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Create a collection holding the given records, in order.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Create a collection from typed seed items.
    pub fn from_serializable<T: Serialize>(
        items: impl IntoIterator<Item = T>,
    ) -> MockApiResult<Self> {
        let records = items
            .into_iter()
            .map(|item| Record::from_serializable(&item))
            .collect::<MockApiResult<Vec<_>>>()?;
        Ok(Self { records })
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the collection holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Interpret an id taken from a URL path.
    ///
    /// The segment becomes a number only when the collection uses numeric ids (judged by its
    /// first record) and the segment is a JSON number such as `12`, `1.5` or `-3`; otherwise
    /// it stays a string.
    pub fn parse_id(&self, raw: &str) -> RecordId {
        let numeric_ids = self
            .records
            .first()
            .and_then(|r| r.get("id"))
            .is_some_and(Value::is_number);
        match raw.parse::<Number>() {
            Ok(n) if numeric_ids => RecordId::Number(n),
            _ => RecordId::Text(raw.to_string()),
        }
    }

    /// Find a record by id.
    pub fn find(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.has_id(id))
    }

    /// Index of the record with the given id.
    pub fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.has_id(id))
    }

    /// Remove the record with the given id. Returns whether one was removed.
    pub fn remove(&mut self, id: &RecordId) -> bool {
        match self.position(id) {
            Some(ix) => {
                self.records.remove(ix);
                true
            }
            None => false,
        }
    }

    /// The next synthetic id: one more than the largest numeric id, or 1.
    ///
    /// String ids are ignored, so collections keyed by strings still get numbers. Fractional
    /// ids count with their floor, so the new id is greater than all of them. Fails when the
    /// largest id is already `i64::MAX`.
    pub fn next_id(&self) -> MockApiResult<i64> {
        let max_id = self
            .records
            .iter()
            .filter_map(|r| match r.get("id") {
                Some(Value::Number(n)) => integral_floor(n),
                _ => None,
            })
            .fold(0, i64::max);
        max_id.checked_add(1).ok_or_else(|| {
            Box::new(MockApiError::new(ErrorKind::Message {
                message: format!("no id left after {}", max_id),
            }))
        })
    }

    /// Replace the record with the same id in place, or append it.
    ///
    /// The record must already carry an id.
    pub fn upsert(&mut self, record: Record) -> MockApiResult<Upsert> {
        let id = record.id().ok_or_else(|| {
            Box::new(MockApiError::new(ErrorKind::MalformedBody {
                message: "record has no usable id".to_string(),
            }))
        })?;
        match self.position(&id) {
            Some(ix) => {
                self.records[ix] = record;
                Ok(Upsert::Replaced)
            }
            None => {
                self.records.push(record);
                Ok(Upsert::Inserted)
            }
        }
    }

    /// Apply `props` to every record whose id is listed in `ids`.
    ///
    /// Returns copies of the updated records in collection order. The `id` field itself is
    /// never rewritten, so ids stay unique.
    pub fn update_props(&mut self, ids: &[Value], props: &Map<String, Value>) -> Vec<Record> {
        let ids: Vec<RecordId> = ids.iter().filter_map(RecordId::from_value).collect();
        let mut updated = Vec::new();
        for record in self.records.iter_mut() {
            let selected = ids.iter().any(|id| record.has_id(id));
            if !selected {
                continue;
            }
            for (field, value) in props {
                if field == "id" {
                    debug!("ignoring 'id' in bulk update props");
                    continue;
                }
                record.set(field.clone(), value.clone());
            }
            updated.push(record.clone());
        }
        updated
    }
}

/// The collection store: collection name to collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Database {
    collections: BTreeMap<String, Collection>,
}

impl Database {
    /// Create an empty database.
    pub fn new() -> Self {
        Self {
            collections: BTreeMap::new(),
        }
    }

    /// Builder-style insert of a collection.
    pub fn with_collection(mut self, name: impl Into<String>, collection: Collection) -> Self {
        self.insert(name, collection);
        self
    }

    /// Insert or replace a collection.
    pub fn insert(&mut self, name: impl Into<String>, collection: Collection) {
        self.collections.insert(name.into(), collection);
    }

    /// Borrow a collection.
    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// Mutably borrow a collection.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Collection> {
        self.collections.get_mut(name)
    }

    /// Check if a collection exists.
    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Collection names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Build a database from a JSON document of the form `{ "<name>": [ {...}, ... ] }`.
    pub fn from_json(value: Value) -> MockApiResult<Self> {
        let Value::Object(map) = value else {
            return Err(seed_error("seed document must be a JSON object"));
        };
        let mut db = Self::new();
        for (name, entries) in map {
            let Value::Array(items) = entries else {
                return Err(seed_error(format!("collection '{}' must be an array", name)));
            };
            let records = items
                .into_iter()
                .map(Record::from_value)
                .collect::<MockApiResult<Vec<_>>>()
                .map_err(|e| seed_error(format!("collection '{}': {}", name, e)))?;
            db.insert(name, Collection::from_records(records));
        }
        Ok(db)
    }

    /// Render the whole database as a JSON document.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// Numbers beyond the i64 range cannot collide with a generated id
fn integral_floor(n: &Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f.floor() as i64)
    })
}

fn seed_error(message: impl Into<String>) -> Box<MockApiError> {
    Box::new(MockApiError::new(ErrorKind::Seed {
        message: message.into(),
    }))
}
