//! PackStream serialization format.
//!
//! PackStream is the self-describing binary value encoding used by the Bolt
//! protocol, both for message payloads and for database values.
//!
//! # Supported Types
//!
//! - **Null**, **Boolean**: single-byte markers
//! - **Integer**: smallest of tiny/8/16/32/64-bit signed, big-endian
//! - **Float**: 64-bit IEEE 754, big-endian
//! - **String**: UTF-8 with tiny/8/16/32-bit length prefix
//! - **Bytes**: raw bytes with 8/16/32-bit length prefix
//! - **List**, **Map**: tiny/8/16/32-bit sized collections
//! - **Structure**: one signature byte plus ordered fields
//!
//! All graph values (nodes, relationships, paths), spatial points and
//! temporal values are structures with designated signatures; see
//! [`structures`]. Unknown signatures decode to a generic
//! [`Structure`](types::Structure).

pub mod decoder;
pub mod encoder;
pub mod marker;
pub mod structures;
pub mod types;

pub use decoder::{decode, PackStreamDecoder};
pub use encoder::{encode, PackStreamEncoder};
pub use structures::{
    Date, DateTime, DateTimeZoneId, Duration, LocalDateTime, LocalTime, Node, Path, Point2D,
    Point3D, Relationship, Time, UnboundRelationship,
};
pub use types::{Structure, Value};

use std::fmt;

/// PackStream errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackStreamError {
    /// The input is a prefix of a valid encoding; more bytes are needed.
    Incomplete,
    /// Reserved or unknown marker byte.
    UnknownMarker(u8),
    /// Invalid UTF-8 in a string body.
    InvalidUtf8(String),
    /// Map key was not a string.
    InvalidMapKey,
    /// Value too large to encode.
    ValueTooLarge(&'static str, usize),
    /// Structure fields do not match the signature's layout.
    InvalidStructure(String),
}

impl fmt::Display for PackStreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackStreamError::Incomplete => write!(f, "incomplete PackStream data"),
            PackStreamError::UnknownMarker(m) => write!(f, "unknown PackStream marker: 0x{:02X}", m),
            PackStreamError::InvalidUtf8(e) => write!(f, "invalid UTF-8 in string: {}", e),
            PackStreamError::InvalidMapKey => write!(f, "map keys must be strings"),
            PackStreamError::ValueTooLarge(t, s) => write!(f, "{} too large: {} items", t, s),
            PackStreamError::InvalidStructure(msg) => write!(f, "invalid structure: {}", msg),
        }
    }
}

impl std::error::Error for PackStreamError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn roundtrip(value: Value) -> Value {
        let bytes = encode(&value).unwrap();
        let (decoded, consumed) = decode(&bytes).unwrap();
        assert_eq!(consumed, bytes.len(), "no trailing bytes after {:?}", value);
        decoded
    }

    fn assert_roundtrip(value: Value) {
        assert_eq!(roundtrip(value.clone()), value);
    }

    #[test]
    fn test_roundtrip_null_bool() {
        assert_roundtrip(Value::Null);
        assert_roundtrip(Value::Boolean(true));
        assert_roundtrip(Value::Boolean(false));
    }

    #[test]
    fn test_roundtrip_int_boundaries() {
        for v in [
            0i64,
            1,
            -1,
            127,
            128,
            -16,
            -17,
            -128,
            -129,
            32767,
            32768,
            -32768,
            -32769,
            2147483647,
            2147483648,
            -2147483648,
            -2147483649,
            i64::MAX,
            i64::MIN,
        ] {
            assert_eq!(roundtrip(Value::Integer(v)), Value::Integer(v), "int {}", v);
        }
    }

    #[test]
    fn test_roundtrip_float() {
        for v in [
            0.0f64,
            -0.0,
            1.0,
            -1.0,
            3.14159,
            f64::MAX,
            f64::MIN,
            f64::MIN_POSITIVE,
            f64::INFINITY,
            f64::NEG_INFINITY,
        ] {
            let decoded = roundtrip(Value::Float(v));
            if let Value::Float(d) = decoded {
                assert_eq!(d.to_bits(), v.to_bits(), "float {} bit-exact", v);
            } else {
                panic!("Expected float");
            }
        }
    }

    #[test]
    fn test_roundtrip_nan() {
        if let Value::Float(d) = roundtrip(Value::Float(f64::NAN)) {
            assert!(d.is_nan());
        } else {
            panic!("Expected float");
        }
    }

    #[test]
    fn test_roundtrip_string_size_boundaries() {
        for len in [0usize, 1, 15, 16, 255, 256, 65535, 65536] {
            let s = "x".repeat(len);
            assert_roundtrip(Value::String(s));
        }
    }

    #[test]
    fn test_roundtrip_unicode_string() {
        assert_roundtrip(Value::String("héllo wörld — ≤≥ 日本語".to_string()));
    }

    #[test]
    fn test_roundtrip_bytes() {
        for len in [0usize, 1, 255, 256, 65535, 65536] {
            assert_roundtrip(Value::Bytes(vec![0xAB; len]));
        }
    }

    #[test]
    fn test_roundtrip_list_size_boundaries() {
        for len in [0usize, 15, 16, 255, 256, 65535, 65536] {
            let list = vec![Value::Integer(7); len];
            assert_roundtrip(Value::List(list));
        }
    }

    #[test]
    fn test_roundtrip_map_size_boundaries() {
        for len in [0usize, 15, 16, 255, 256] {
            let map: HashMap<String, Value> = (0..len)
                .map(|i| (format!("k{}", i), Value::Integer(i as i64)))
                .collect();
            assert_roundtrip(Value::Map(map));
        }
    }

    #[test]
    fn test_roundtrip_heterogeneous_list() {
        assert_roundtrip(Value::List(vec![
            Value::Integer(1),
            Value::String("two".into()),
            Value::Boolean(true),
            Value::Null,
            Value::Float(2.5),
            Value::Bytes(vec![1, 2]),
        ]));
    }

    #[test]
    fn test_roundtrip_nested_depth_8() {
        let mut value = Value::Integer(42);
        for _ in 0..8 {
            let mut map = HashMap::new();
            map.insert("inner".to_string(), value);
            value = Value::List(vec![Value::Map(map)]);
        }
        assert_roundtrip(value);
    }

    #[test]
    fn test_roundtrip_node() {
        let mut props = HashMap::new();
        props.insert("name".to_string(), Value::String("Alice".into()));
        props.insert("age".to_string(), Value::Integer(30));

        let node = Node::new(1, vec!["Person".to_string()], props).with_element_id("4:x:1");
        assert_roundtrip(Value::Node(node));
    }

    #[test]
    fn test_roundtrip_relationship() {
        let mut props = HashMap::new();
        props.insert("since".to_string(), Value::Integer(2020));
        assert_roundtrip(Value::Relationship(Relationship::new(
            1, 10, 20, "KNOWS", props,
        )));
    }

    #[test]
    fn test_roundtrip_path() {
        let n1 = Node::new(1, vec!["A".into()], HashMap::new());
        let n2 = Node::new(2, vec!["B".into()], HashMap::new());
        let r = UnboundRelationship::new(5, "LINKS", HashMap::new());
        assert_roundtrip(Value::Path(Path::new(vec![n1, n2], vec![r], vec![1, 1])));
    }

    #[test]
    fn test_roundtrip_spatial() {
        assert_roundtrip(Value::Point2D(Point2D::wgs84(18.06, 59.33)));
        assert_roundtrip(Value::Point3D(Point3D::wgs84(18.06, 59.33, 11.0)));
    }

    #[test]
    fn test_roundtrip_temporal() {
        assert_roundtrip(Value::Date(Date::new(18628)));
        assert_roundtrip(Value::Date(Date::new(-12)));
        assert_roundtrip(Value::Time(Time::new(49_245_000_000_000, 3600)));
        assert_roundtrip(Value::LocalTime(LocalTime::new(49_245_000_000_000)));
        assert_roundtrip(Value::DateTime(DateTime::new(1_600_000_000, 123_456_789, -7200)));
        assert_roundtrip(Value::DateTimeZoneId(DateTimeZoneId::new(
            1_600_000_000,
            42,
            "Europe/Stockholm",
        )));
        assert_roundtrip(Value::LocalDateTime(LocalDateTime::new(1_600_000_000, 1)));
        assert_roundtrip(Value::Duration(Duration::new(12, 30, 3600, 500)));
        assert_roundtrip(Value::Duration(Duration::new(-1, -2, -3, -4)));
    }

    #[test]
    fn test_roundtrip_unknown_structure() {
        let s = Structure::new(0x7B, vec![Value::Integer(1), Value::String("x".into())]);
        assert_roundtrip(Value::Structure(s));
    }

    #[test]
    fn test_roundtrip_graph_values_in_collections() {
        let node = Node::new(9, vec!["N".into()], HashMap::new());
        let mut map = HashMap::new();
        map.insert("n".to_string(), Value::Node(node));
        assert_roundtrip(Value::List(vec![
            Value::Map(map),
            Value::Duration(Duration::new(0, 1, 2, 3)),
        ]));
    }
}
