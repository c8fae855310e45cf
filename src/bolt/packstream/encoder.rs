//! PackStream encoder.

use bytes::{BufMut, BytesMut};
use std::collections::HashMap;

use super::marker::*;
use super::types::{Structure, Value};
use super::PackStreamError;

/// PackStream encoder that writes values to a byte buffer.
///
/// Integers and collection sizes always take the smallest form that fits, so
/// encoding is deterministic for a given input (map entry order aside).
pub struct PackStreamEncoder {
    buffer: BytesMut,
}

impl PackStreamEncoder {
    /// Create a new encoder with default buffer capacity.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a new encoder with specified buffer capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consume the encoder and return the bytes.
    pub fn into_bytes(self) -> BytesMut {
        self.buffer
    }

    /// Get the bytes as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Encode a value.
    pub fn encode(&mut self, value: &Value) -> Result<(), PackStreamError> {
        match value {
            Value::Null => {
                self.encode_null();
                Ok(())
            }
            Value::Boolean(b) => {
                self.encode_bool(*b);
                Ok(())
            }
            Value::Integer(i) => {
                self.encode_int(*i);
                Ok(())
            }
            Value::Float(f) => {
                self.encode_float(*f);
                Ok(())
            }
            Value::Bytes(b) => self.encode_bytes(b),
            Value::String(s) => self.encode_string(s),
            Value::List(l) => self.encode_list(l),
            Value::Map(m) => self.encode_map(m),
            Value::Node(n) => self.encode_tagged(NODE_SIG, &n.to_fields()),
            Value::Relationship(r) => self.encode_tagged(RELATIONSHIP_SIG, &r.to_fields()),
            Value::UnboundRelationship(r) => {
                self.encode_tagged(UNBOUND_RELATIONSHIP_SIG, &r.to_fields())
            }
            Value::Path(p) => self.encode_tagged(PATH_SIG, &p.to_fields()),
            Value::Point2D(p) => self.encode_tagged(POINT_2D_SIG, &p.to_fields()),
            Value::Point3D(p) => self.encode_tagged(POINT_3D_SIG, &p.to_fields()),
            Value::Date(d) => self.encode_tagged(DATE_SIG, &d.to_fields()),
            Value::Time(t) => self.encode_tagged(TIME_SIG, &t.to_fields()),
            Value::LocalTime(t) => self.encode_tagged(LOCAL_TIME_SIG, &t.to_fields()),
            Value::DateTime(dt) => self.encode_tagged(DATE_TIME_SIG, &dt.to_fields()),
            Value::DateTimeZoneId(dt) => {
                self.encode_tagged(DATE_TIME_ZONE_ID_SIG, &dt.to_fields())
            }
            Value::LocalDateTime(dt) => self.encode_tagged(LOCAL_DATE_TIME_SIG, &dt.to_fields()),
            Value::Duration(d) => self.encode_tagged(DURATION_SIG, &d.to_fields()),
            Value::Structure(s) => self.encode_structure(s),
        }
    }

    /// Encode null.
    pub fn encode_null(&mut self) {
        self.buffer.put_u8(NULL);
    }

    /// Encode a boolean.
    pub fn encode_bool(&mut self, value: bool) {
        self.buffer.put_u8(if value { TRUE } else { FALSE });
    }

    /// Encode an integer using the smallest representation.
    pub fn encode_int(&mut self, value: i64) {
        if can_encode_tiny_int(value) {
            self.buffer.put_u8(value as u8);
        } else if (i8::MIN as i64..=i8::MAX as i64).contains(&value) {
            self.buffer.put_u8(INT_8);
            self.buffer.put_i8(value as i8);
        } else if (i16::MIN as i64..=i16::MAX as i64).contains(&value) {
            self.buffer.put_u8(INT_16);
            self.buffer.put_i16(value as i16);
        } else if (i32::MIN as i64..=i32::MAX as i64).contains(&value) {
            self.buffer.put_u8(INT_32);
            self.buffer.put_i32(value as i32);
        } else {
            self.buffer.put_u8(INT_64);
            self.buffer.put_i64(value);
        }
    }

    /// Encode a float (always 64-bit).
    pub fn encode_float(&mut self, value: f64) {
        self.buffer.put_u8(FLOAT_64);
        self.buffer.put_f64(value);
    }

    /// Encode a byte string.
    pub fn encode_bytes(&mut self, value: &[u8]) -> Result<(), PackStreamError> {
        let len = value.len();
        if len > u32::MAX as usize {
            return Err(PackStreamError::ValueTooLarge("bytes", len));
        }

        if len <= u8::MAX as usize {
            self.buffer.put_u8(BYTES_8);
            self.buffer.put_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.buffer.put_u8(BYTES_16);
            self.buffer.put_u16(len as u16);
        } else {
            self.buffer.put_u8(BYTES_32);
            self.buffer.put_u32(len as u32);
        }

        self.buffer.put_slice(value);
        Ok(())
    }

    /// Encode a string.
    pub fn encode_string(&mut self, value: &str) -> Result<(), PackStreamError> {
        let bytes = value.as_bytes();
        let len = bytes.len();

        if len > u32::MAX as usize {
            return Err(PackStreamError::ValueTooLarge("string", len));
        }

        if len <= TINY_STRING_MAX_LEN {
            self.buffer.put_u8(TINY_STRING_BASE + len as u8);
        } else if len <= u8::MAX as usize {
            self.buffer.put_u8(STRING_8);
            self.buffer.put_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.buffer.put_u8(STRING_16);
            self.buffer.put_u16(len as u16);
        } else {
            self.buffer.put_u8(STRING_32);
            self.buffer.put_u32(len as u32);
        }

        self.buffer.put_slice(bytes);
        Ok(())
    }

    /// Encode a list.
    pub fn encode_list(&mut self, values: &[Value]) -> Result<(), PackStreamError> {
        let len = values.len();

        if len > u32::MAX as usize {
            return Err(PackStreamError::ValueTooLarge("list", len));
        }

        if len <= TINY_LIST_MAX_LEN {
            self.buffer.put_u8(TINY_LIST_BASE + len as u8);
        } else if len <= u8::MAX as usize {
            self.buffer.put_u8(LIST_8);
            self.buffer.put_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.buffer.put_u8(LIST_16);
            self.buffer.put_u16(len as u16);
        } else {
            self.buffer.put_u8(LIST_32);
            self.buffer.put_u32(len as u32);
        }

        for value in values {
            self.encode(value)?;
        }

        Ok(())
    }

    /// Encode a map.
    pub fn encode_map(&mut self, map: &HashMap<String, Value>) -> Result<(), PackStreamError> {
        let len = map.len();

        if len > u32::MAX as usize {
            return Err(PackStreamError::ValueTooLarge("map", len));
        }

        if len <= TINY_MAP_MAX_LEN {
            self.buffer.put_u8(TINY_MAP_BASE + len as u8);
        } else if len <= u8::MAX as usize {
            self.buffer.put_u8(MAP_8);
            self.buffer.put_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.buffer.put_u8(MAP_16);
            self.buffer.put_u16(len as u16);
        } else {
            self.buffer.put_u8(MAP_32);
            self.buffer.put_u32(len as u32);
        }

        for (key, value) in map {
            self.encode_string(key)?;
            self.encode(value)?;
        }

        Ok(())
    }

    /// Encode a generic structure.
    pub fn encode_structure(&mut self, s: &Structure) -> Result<(), PackStreamError> {
        self.encode_tagged(s.signature, &s.fields)
    }

    /// Encode a structure header plus its fields.
    fn encode_tagged(&mut self, signature: u8, fields: &[Value]) -> Result<(), PackStreamError> {
        let len = fields.len();

        if len > u16::MAX as usize {
            return Err(PackStreamError::ValueTooLarge("structure fields", len));
        }

        if len <= TINY_STRUCT_MAX_FIELDS {
            self.buffer.put_u8(TINY_STRUCT_BASE + len as u8);
        } else if len <= u8::MAX as usize {
            self.buffer.put_u8(STRUCT_8);
            self.buffer.put_u8(len as u8);
        } else {
            self.buffer.put_u8(STRUCT_16);
            self.buffer.put_u16(len as u16);
        }

        self.buffer.put_u8(signature);

        for field in fields {
            self.encode(field)?;
        }

        Ok(())
    }
}

impl Default for PackStreamEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a single value to bytes.
pub fn encode(value: &Value) -> Result<BytesMut, PackStreamError> {
    let mut encoder = PackStreamEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}
