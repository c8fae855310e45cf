//! PackStream value types.
//!
//! There is exactly one value hierarchy: graph, spatial and temporal types
//! are constructors of [`Value`], not a parallel tree of "wire" versus
//! "user" values. Unknown structure signatures survive as a generic
//! [`Structure`] so newer server types degrade gracefully.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::structures::{
    Date, DateTime, DateTimeZoneId, Duration, LocalDateTime, LocalTime, Node, Path, Point2D,
    Point3D, Relationship, Time, UnboundRelationship,
};

/// A PackStream value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point
    Float(f64),
    /// Byte array
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// List of values
    List(Vec<Value>),
    /// Map of string keys to values
    Map(HashMap<String, Value>),
    /// Graph node
    Node(Node),
    /// Graph relationship
    Relationship(Relationship),
    /// Relationship without endpoint ids (inside paths)
    UnboundRelationship(UnboundRelationship),
    /// Graph path
    Path(Path),
    /// 2D spatial point
    Point2D(Point2D),
    /// 3D spatial point
    Point3D(Point3D),
    /// Date (days since epoch)
    Date(Date),
    /// Time of day with timezone offset
    Time(Time),
    /// Time of day without timezone
    LocalTime(LocalTime),
    /// Instant with timezone offset
    DateTime(DateTime),
    /// Instant with named timezone
    DateTimeZoneId(DateTimeZoneId),
    /// Instant without timezone
    LocalDateTime(LocalDateTime),
    /// Temporal duration
    Duration(Duration),
    /// Structure with a signature this client does not know
    Structure(Structure),
}

/// A generic PackStream structure: one signature byte plus ordered fields.
///
/// Known signatures decode into their typed [`Value`] constructors; this type
/// only carries the ones that fall through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// Structure signature byte
    pub signature: u8,
    /// Structure fields
    pub fields: Vec<Value>,
}

impl Structure {
    /// Create a new structure with the given signature and fields.
    pub fn new(signature: u8, fields: Vec<Value>) -> Self {
        Self { signature, fields }
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the structure has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as float. Integers widen losslessly enough for metadata use.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as bytes reference.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get as list reference.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Try to get as map reference.
    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Try to get as node reference.
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Try to get as relationship reference.
    pub fn as_relationship(&self) -> Option<&Relationship> {
        match self {
            Value::Relationship(r) => Some(r),
            _ => None,
        }
    }

    /// Try to get as path reference.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Value::Path(p) => Some(p),
            _ => None,
        }
    }

    /// Get the type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Bytes(_) => "Bytes",
            Value::String(_) => "String",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Node(_) => "Node",
            Value::Relationship(_) => "Relationship",
            Value::UnboundRelationship(_) => "UnboundRelationship",
            Value::Path(_) => "Path",
            Value::Point2D(_) => "Point2D",
            Value::Point3D(_) => "Point3D",
            Value::Date(_) => "Date",
            Value::Time(_) => "Time",
            Value::LocalTime(_) => "LocalTime",
            Value::DateTime(_) => "DateTime",
            Value::DateTimeZoneId(_) => "DateTimeZoneId",
            Value::LocalDateTime(_) => "LocalDateTime",
            Value::Duration(_) => "Duration",
            Value::Structure(_) => "Structure",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::List(l) => write!(f, "[{} items]", l.len()),
            Value::Map(m) => write!(f, "{{{} entries}}", m.len()),
            Value::Node(n) => write!(f, "{}", n),
            Value::Relationship(r) => write!(f, "{}", r),
            Value::UnboundRelationship(r) => write!(f, "[:{}]", r.rel_type),
            Value::Path(p) => write!(f, "{}", p),
            Value::Point2D(p) => write!(f, "{}", p),
            Value::Point3D(p) => write!(f, "{}", p),
            Value::Date(d) => write!(f, "Date({}d)", d.days),
            Value::Time(t) => write!(f, "Time({}ns{:+}s)", t.nanoseconds, t.tz_offset_seconds),
            Value::LocalTime(t) => write!(f, "LocalTime({}ns)", t.nanoseconds),
            Value::DateTime(dt) => write!(f, "DateTime({}s)", dt.seconds),
            Value::DateTimeZoneId(dt) => write!(f, "DateTime({}s {})", dt.seconds, dt.tz_id),
            Value::LocalDateTime(dt) => write!(f, "LocalDateTime({}s)", dt.seconds),
            Value::Duration(d) => write!(f, "{}", d),
            Value::Structure(s) => {
                write!(f, "Structure(0x{:02X}, {} fields)", s.signature, s.len())
            }
        }
    }
}

// Conversions from primitive Rust types.

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(v: HashMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

impl From<Structure> for Value {
    fn from(v: Structure) -> Self {
        Value::Structure(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null() {
        let v = Value::Null;
        assert!(v.is_null());
        assert_eq!(v.type_name(), "Null");
    }

    #[test]
    fn test_boolean() {
        let v = Value::Boolean(true);
        assert_eq!(v.as_bool(), Some(true));
        assert!(!v.is_null());
    }

    #[test]
    fn test_integer() {
        let v = Value::Integer(42);
        assert_eq!(v.as_int(), Some(42));
        assert_eq!(v.as_float(), Some(42.0));
    }

    #[test]
    fn test_float() {
        let v = Value::Float(3.14);
        assert_eq!(v.as_float(), Some(3.14));
        assert_eq!(v.as_int(), None);
    }

    #[test]
    fn test_string() {
        let v = Value::String("hello".to_string());
        assert_eq!(v.as_str(), Some("hello"));
    }

    #[test]
    fn test_bytes() {
        let v = Value::Bytes(vec![1, 2, 3]);
        assert_eq!(v.as_bytes(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn test_list() {
        let v = Value::List(vec![Value::Integer(1), Value::Integer(2)]);
        let list = v.as_list().unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_map() {
        let mut map = HashMap::new();
        map.insert("key".to_string(), Value::Integer(42));
        let v = Value::Map(map);
        let m = v.as_map().unwrap();
        assert_eq!(m.get("key").unwrap().as_int(), Some(42));
    }

    #[test]
    fn test_structure() {
        let s = Structure::new(0x7A, vec![Value::Integer(1)]);
        assert_eq!(s.signature, 0x7A);
        assert_eq!(s.len(), 1);
        assert!(!s.is_empty());

        let v = Value::Structure(s);
        assert_eq!(v.type_name(), "Structure");
    }

    #[test]
    fn test_from_conversions() {
        let _: Value = true.into();
        let _: Value = 42i64.into();
        let _: Value = 42i32.into();
        let _: Value = 3.14f64.into();
        let _: Value = "hello".into();
        let _: Value = String::from("hello").into();
        let _: Value = vec![1u8, 2, 3].into();
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(1i64)), Value::Integer(1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Integer(7).to_string(), "7");
        assert_eq!(Value::String("x".into()).to_string(), "\"x\"");
        assert_eq!(Value::Bytes(vec![0, 1]).to_string(), "<2 bytes>");
    }
}
