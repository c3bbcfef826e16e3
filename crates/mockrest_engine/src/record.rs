/* 📖 # Why are records untyped JSON objects?

A simulated REST resource has whatever shape the client application sends. The engine only
relies on the `id` field, so a record is a JSON object with a few id-aware accessors. Callers
that have typed seed data convert it once with `Record::from_serializable`.
*/

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use mockrest_base::{ErrorKind, MockApiError, MockApiResult};

/// Identifier of a record within its collection.
///
/// Ids are either JSON numbers (integral or not) or strings. Matching is typed: the number
/// `1` never matches the string `"1"`, but numbers compare by value, so `2` matches `2.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    Number(Number),
    Text(String),
}

impl RecordId {
    /// Read an id from a JSON value. `null`, booleans, arrays and objects are not ids.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Convert back into the JSON value stored in a record's `id` field.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Number(n) => Value::Number(n.clone()),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }

    /// True if `value` is this id.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Number(n), Value::Number(v)) => same_number(n, v),
            (Self::Text(s), Value::String(v)) => s == v,
            _ => false,
        }
    }
}

// Integers compare exactly; anything involving a float compares as f64
fn same_number(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    if a.is_f64() || b.is_f64() {
        return a.as_f64() == b.as_f64();
    }
    false
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self::Number(Number::from(n))
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// A single item of a collection: a JSON object, by convention carrying an `id` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Convert a JSON value into a record. Only objects are records.
    pub fn from_value(value: Value) -> MockApiResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Box::new(MockApiError::new(ErrorKind::MalformedBody {
                message: format!("expected a JSON object, got {}", other),
            }))),
        }
    }

    /// Convert any serializable value (typically a seed struct) into a record.
    pub fn from_serializable<T: Serialize>(item: &T) -> MockApiResult<Self> {
        let value = serde_json::to_value(item).map_err(|e| {
            Box::new(MockApiError::new(ErrorKind::Seed {
                message: e.to_string(),
            }))
        })?;
        Self::from_value(value)
    }

    /// The record's id, if its `id` field holds a number or a string.
    pub fn id(&self) -> Option<RecordId> {
        self.0.get("id").and_then(RecordId::from_value)
    }

    /// True if the record's `id` field is this id.
    pub fn has_id(&self, id: &RecordId) -> bool {
        self.0.get("id").is_some_and(|value| id.matches(value))
    }

    /// True if the record carries a usable id.
    ///
    /// Missing, `null`, `false`, `0` and `""` all count as "no id yet".
    pub fn has_assigned_id(&self) -> bool {
        match self.0.get("id") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    /// Overwrite the `id` field.
    pub fn set_id(&mut self, id: &RecordId) {
        self.0.insert("id".to_string(), id.to_value());
    }

    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a field value.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// The textual form of a field that filter patterns are matched against.
    ///
    /// Strings are used as-is; every other value uses its JSON text. Missing fields have none.
    pub fn field_text(&self, field: &str) -> Option<String> {
        self.0.get(field).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Convert into a JSON object value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn test_record_id_from_value() {
        assert_eq!(RecordId::from_value(&json!(7)), Some(RecordId::from(7)));
        assert_eq!(RecordId::from_value(&json!("abc")), Some(RecordId::from("abc")));
        assert_eq!(RecordId::from_value(&json!(null)), None);
        assert_eq!(RecordId::from_value(&json!(true)), None);
    }

    #[test]
    fn test_record_id_matching_is_typed() {
        assert!(RecordId::from(1).matches(&json!(1)));
        assert!(!RecordId::from(1).matches(&json!("1")));
        assert!(!RecordId::from("1").matches(&json!(1)));
        assert!(RecordId::from("x").matches(&json!("x")));
    }

    #[test]
    fn test_non_i64_numbers_are_ids() {
        let float = RecordId::from_value(&json!(1.5)).unwrap();
        assert!(float.matches(&json!(1.5)));
        assert!(!float.matches(&json!(1)));
        assert!(!float.matches(&json!("1.5")));
        assert_eq!(float.to_value(), json!(1.5));

        let big = RecordId::from_value(&json!(u64::MAX)).unwrap();
        assert!(big.matches(&json!(u64::MAX)));
        assert!(!big.matches(&json!(i64::MAX)));

        assert!(RecordId::from(2).matches(&json!(2.0)));
        assert!(RecordId::from(-3).matches(&json!(-3)));
    }

    #[test]
    fn test_record_requires_object() {
        assert!(Record::from_value(json!([1, 2])).is_err());
        assert!(Record::from_value(json!("text")).is_err());
        assert!(Record::from_value(json!({})).is_ok());
    }

    #[test]
    fn test_has_assigned_id() {
        assert!(!record(json!({"name": "A"})).has_assigned_id());
        assert!(!record(json!({"id": null})).has_assigned_id());
        assert!(!record(json!({"id": 0})).has_assigned_id());
        assert!(!record(json!({"id": ""})).has_assigned_id());
        assert!(record(json!({"id": 3})).has_assigned_id());
        assert!(record(json!({"id": "k1"})).has_assigned_id());
    }

    #[test]
    fn test_set_id_and_lookup() {
        let mut r = record(json!({"name": "A"}));
        r.set_id(&RecordId::from(12));
        assert_eq!(r.id(), Some(RecordId::from(12)));
        assert!(r.has_id(&RecordId::from(12)));
        assert_eq!(r.into_value(), json!({"name": "A", "id": 12}));
    }

    #[test]
    fn test_field_text() {
        let r = record(json!({"name": "Bombasto", "power": 7, "active": true, "tags": ["x"]}));
        assert_eq!(r.field_text("name").as_deref(), Some("Bombasto"));
        assert_eq!(r.field_text("power").as_deref(), Some("7"));
        assert_eq!(r.field_text("active").as_deref(), Some("true"));
        assert_eq!(r.field_text("tags").as_deref(), Some("[\"x\"]"));
        assert_eq!(r.field_text("missing"), None);
    }

    #[test]
    fn test_from_serializable() {
        #[derive(Serialize)]
        struct Hero {
            id: i64,
            name: &'static str,
        }
        let r = Record::from_serializable(&Hero { id: 11, name: "Mr. Nice" }).unwrap();
        assert_eq!(r.id(), Some(RecordId::from(11)));
        assert_eq!(r.get("name"), Some(&json!("Mr. Nice")));
    }
}
