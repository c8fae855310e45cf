//! Query result records.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::bolt::packstream::{Node, Path, Relationship, Value};

use super::error::{DriverError, DriverResult};

/// Lookup key for a record: a 0-based index or a field name.
#[derive(Debug, Clone, Copy)]
pub enum RecordKey<'a> {
    /// Positional lookup
    Index(usize),
    /// Lookup by field name
    Name(&'a str),
}

impl From<usize> for RecordKey<'_> {
    fn from(index: usize) -> Self {
        RecordKey::Index(index)
    }
}

impl<'a> From<&'a str> for RecordKey<'a> {
    fn from(name: &'a str) -> Self {
        RecordKey::Name(name)
    }
}

/// One row of a query result.
///
/// The field-name list is shared with every other record of the same result,
/// not copied per row.
#[derive(Debug, Clone)]
pub struct Record {
    keys: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl Record {
    /// Create a new record over a shared field-name list.
    pub fn new(keys: Arc<Vec<String>>, values: Vec<Value>) -> Self {
        Self { keys, values }
    }

    /// The field names, in declaration order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The row values, aligned with [`keys`](Self::keys).
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of values in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a value by index or field name.
    ///
    /// ```
    /// # use std::sync::Arc;
    /// # use graphbolt::{Record, Value};
    /// let record = Record::new(
    ///     Arc::new(vec!["n".to_string()]),
    ///     vec![Value::Integer(1)],
    /// );
    /// assert_eq!(record.get(0), Some(&Value::Integer(1)));
    /// assert_eq!(record.get("n"), Some(&Value::Integer(1)));
    /// ```
    pub fn get<'a>(&self, key: impl Into<RecordKey<'a>>) -> Option<&Value> {
        match key.into() {
            RecordKey::Index(i) => self.values.get(i),
            RecordKey::Name(name) => {
                let i = self.keys.iter().position(|k| k == name)?;
                self.values.get(i)
            }
        }
    }

    /// Check whether the record carries the given field name.
    pub fn contains_key(&self, name: &str) -> bool {
        self.keys.iter().any(|k| k == name)
    }

    /// Look up and convert a value.
    pub fn get_as<'a, T>(&self, key: impl Into<RecordKey<'a>>) -> DriverResult<T>
    where
        T: TryFrom<Value, Error = DriverError>,
    {
        let key = key.into();
        self.get(key)
            .cloned()
            .ok_or_else(|| match key {
                RecordKey::Index(i) => {
                    DriverError::InvalidArgument(format!("record has no column {}", i))
                }
                RecordKey::Name(name) => {
                    DriverError::InvalidArgument(format!("record has no field '{}'", name))
                }
            })
            .and_then(T::try_from)
    }

    /// Boolean accessor.
    pub fn get_bool<'a>(&self, key: impl Into<RecordKey<'a>>) -> DriverResult<bool> {
        self.get_as(key)
    }

    /// Integer accessor.
    pub fn get_int<'a>(&self, key: impl Into<RecordKey<'a>>) -> DriverResult<i64> {
        self.get_as(key)
    }

    /// Float accessor.
    pub fn get_float<'a>(&self, key: impl Into<RecordKey<'a>>) -> DriverResult<f64> {
        self.get_as(key)
    }

    /// String accessor.
    pub fn get_string<'a>(&self, key: impl Into<RecordKey<'a>>) -> DriverResult<String> {
        self.get_as(key)
    }

    /// Node accessor.
    pub fn get_node<'a>(&self, key: impl Into<RecordKey<'a>>) -> DriverResult<Node> {
        self.get_as(key)
    }

    /// Relationship accessor.
    pub fn get_relationship<'a>(
        &self,
        key: impl Into<RecordKey<'a>>,
    ) -> DriverResult<Relationship> {
        self.get_as(key)
    }

    /// Path accessor.
    pub fn get_path<'a>(&self, key: impl Into<RecordKey<'a>>) -> DriverResult<Path> {
        self.get_as(key)
    }

    /// Optional accessor: `Null` and missing fields become `None`.
    pub fn get_optional<'a, T>(&self, key: impl Into<RecordKey<'a>>) -> DriverResult<Option<T>>
    where
        T: TryFrom<Value, Error = DriverError>,
    {
        match self.get(key) {
            Some(Value::Null) | None => Ok(None),
            Some(v) => T::try_from(v.clone()).map(Some),
        }
    }

    /// Collect into an owned map.
    pub fn to_map(&self) -> HashMap<String, Value> {
        self.keys
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .keys
            .iter()
            .zip(self.values.iter())
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        write!(f, "{{{}}}", pairs.join(", "))
    }
}

// Conversions backing the typed accessors.

impl TryFrom<Value> for bool {
    type Error = DriverError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(conversion_error(&other, "bool")),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = DriverError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Integer(i) => Ok(i),
            other => Err(conversion_error(&other, "i64")),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = DriverError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(conversion_error(&other, "f64")),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = DriverError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(conversion_error(&other, "String")),
        }
    }
}

impl TryFrom<Value> for Node {
    type Error = DriverError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Node(n) => Ok(n),
            other => Err(conversion_error(&other, "Node")),
        }
    }
}

impl TryFrom<Value> for Relationship {
    type Error = DriverError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Relationship(r) => Ok(r),
            other => Err(conversion_error(&other, "Relationship")),
        }
    }
}

impl TryFrom<Value> for Path {
    type Error = DriverError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Path(p) => Ok(p),
            other => Err(conversion_error(&other, "Path")),
        }
    }
}

fn conversion_error(value: &Value, target: &str) -> DriverError {
    DriverError::InvalidArgument(format!("cannot convert {} to {}", value.type_name(), target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_record() -> Record {
        let keys = Arc::new(vec![
            "name".to_string(),
            "age".to_string(),
            "active".to_string(),
        ]);
        Record::new(
            keys,
            vec![
                Value::String("Alice".into()),
                Value::Integer(30),
                Value::Boolean(true),
            ],
        )
    }

    #[test]
    fn test_get_by_name_and_index() {
        let record = test_record();

        assert_eq!(record.get("name"), Some(&Value::String("Alice".into())));
        assert_eq!(record.get(0), Some(&Value::String("Alice".into())));
        assert_eq!(record.get("age"), Some(&Value::Integer(30)));
        assert_eq!(record.get(1), Some(&Value::Integer(30)));

        assert_eq!(record.get("unknown"), None);
        assert_eq!(record.get(3), None);
    }

    #[test]
    fn test_typed_accessors() {
        let record = test_record();

        assert_eq!(record.get_string("name").unwrap(), "Alice");
        assert_eq!(record.get_int("age").unwrap(), 30);
        assert!(record.get_bool("active").unwrap());
        assert_eq!(record.get_int(1).unwrap(), 30);
    }

    #[test]
    fn test_typed_accessor_errors() {
        let record = test_record();

        assert!(record.get_int("name").is_err());
        assert!(record.get_string("age").is_err());
        assert!(record.get_string("unknown").is_err());
    }

    #[test]
    fn test_float_widens_int() {
        let record = test_record();
        assert_eq!(record.get_float("age").unwrap(), 30.0);
    }

    #[test]
    fn test_optional() {
        let keys = Arc::new(vec!["value".to_string(), "nothing".to_string()]);
        let record = Record::new(keys, vec![Value::Integer(42), Value::Null]);

        assert_eq!(record.get_optional::<i64>("value").unwrap(), Some(42));
        assert_eq!(record.get_optional::<i64>("nothing").unwrap(), None);
        assert_eq!(record.get_optional::<i64>("missing").unwrap(), None);
    }

    #[test]
    fn test_keys_are_shared() {
        let keys = Arc::new(vec!["n".to_string()]);
        let a = Record::new(keys.clone(), vec![Value::Integer(1)]);
        let b = Record::new(keys.clone(), vec![Value::Integer(2)]);

        assert!(Arc::ptr_eq(&a.keys, &b.keys));
        assert_eq!(Arc::strong_count(&keys), 3);
    }

    #[test]
    fn test_to_map_and_contains() {
        let record = test_record();
        assert!(record.contains_key("name"));
        assert!(!record.contains_key("missing"));

        let map = record.to_map();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("age"), Some(&Value::Integer(30)));
    }

    #[test]
    fn test_display() {
        let record = test_record();
        let display = record.to_string();
        assert!(display.contains("name: \"Alice\""));
        assert!(display.contains("age: 30"));
    }

    #[test]
    fn test_node_accessor() {
        let node = Node::new(1, vec!["Person".into()], HashMap::new());
        let keys = Arc::new(vec!["n".to_string()]);
        let record = Record::new(keys, vec![Value::Node(node.clone())]);

        assert_eq!(record.get_node("n").unwrap(), node);
        assert!(record.get_relationship("n").is_err());
    }
}
