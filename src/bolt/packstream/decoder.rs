//! PackStream decoder.
//!
//! Decoding is streaming-tolerant: when the input is a prefix of a valid
//! encoding the decoder reports [`PackStreamError::Incomplete`], and the
//! caller may retry once more bytes arrive. Anything else that fails to
//! decode is invalid input (unknown marker, bad UTF-8, non-string map key).

use bytes::Buf;
use std::collections::HashMap;

use super::marker::*;
use super::structures::{
    Date, DateTime, DateTimeZoneId, Duration, LocalDateTime, LocalTime, Node, Path, Point2D,
    Point3D, Relationship, Time, UnboundRelationship,
};
use super::types::{Structure, Value};
use super::PackStreamError;

/// PackStream decoder that reads values from a byte slice.
pub struct PackStreamDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PackStreamDecoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Get the current position (bytes consumed so far).
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get remaining bytes count.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Check if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Decode the next value.
    pub fn decode(&mut self) -> Result<Value, PackStreamError> {
        let marker = self.read_u8()?;

        // Tiny forms first; their ranges are disjoint from the fixed markers.
        if is_tiny_int(marker) {
            return Ok(Value::Integer(decode_tiny_int(marker) as i64));
        }
        if is_tiny_string(marker) {
            return self.read_string_data(tiny_string_len(marker));
        }
        if is_tiny_list(marker) {
            return self.read_list_data(tiny_list_len(marker));
        }
        if is_tiny_map(marker) {
            return self.read_map_data(tiny_map_len(marker));
        }
        if is_tiny_struct(marker) {
            return self.read_struct_data(tiny_struct_fields(marker));
        }

        match marker {
            NULL => Ok(Value::Null),
            TRUE => Ok(Value::Boolean(true)),
            FALSE => Ok(Value::Boolean(false)),

            FLOAT_64 => Ok(Value::Float(self.read_f64()?)),

            INT_8 => Ok(Value::Integer(self.read_i8()? as i64)),
            INT_16 => Ok(Value::Integer(self.read_i16()? as i64)),
            INT_32 => Ok(Value::Integer(self.read_i32()? as i64)),
            INT_64 => Ok(Value::Integer(self.read_i64()?)),

            BYTES_8 => {
                let len = self.read_u8()? as usize;
                self.read_bytes_data(len)
            }
            BYTES_16 => {
                let len = self.read_u16()? as usize;
                self.read_bytes_data(len)
            }
            BYTES_32 => {
                let len = self.read_u32()? as usize;
                self.read_bytes_data(len)
            }

            STRING_8 => {
                let len = self.read_u8()? as usize;
                self.read_string_data(len)
            }
            STRING_16 => {
                let len = self.read_u16()? as usize;
                self.read_string_data(len)
            }
            STRING_32 => {
                let len = self.read_u32()? as usize;
                self.read_string_data(len)
            }

            LIST_8 => {
                let len = self.read_u8()? as usize;
                self.read_list_data(len)
            }
            LIST_16 => {
                let len = self.read_u16()? as usize;
                self.read_list_data(len)
            }
            LIST_32 => {
                let len = self.read_u32()? as usize;
                self.read_list_data(len)
            }

            MAP_8 => {
                let len = self.read_u8()? as usize;
                self.read_map_data(len)
            }
            MAP_16 => {
                let len = self.read_u16()? as usize;
                self.read_map_data(len)
            }
            MAP_32 => {
                let len = self.read_u32()? as usize;
                self.read_map_data(len)
            }

            STRUCT_8 => {
                let len = self.read_u8()? as usize;
                self.read_struct_data(len)
            }
            STRUCT_16 => {
                let len = self.read_u16()? as usize;
                self.read_struct_data(len)
            }

            _ => Err(PackStreamError::UnknownMarker(marker)),
        }
    }

    fn read_bytes_data(&mut self, len: usize) -> Result<Value, PackStreamError> {
        let bytes = self.read_bytes(len)?;
        Ok(Value::Bytes(bytes.to_vec()))
    }

    fn read_string_data(&mut self, len: usize) -> Result<Value, PackStreamError> {
        let bytes = self.read_bytes(len)?;
        let s = std::str::from_utf8(bytes)
            .map_err(|e| PackStreamError::InvalidUtf8(e.to_string()))?;
        Ok(Value::String(s.to_string()))
    }

    fn read_list_data(&mut self, len: usize) -> Result<Value, PackStreamError> {
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            items.push(self.decode()?);
        }
        Ok(Value::List(items))
    }

    fn read_map_data(&mut self, len: usize) -> Result<Value, PackStreamError> {
        let mut map = HashMap::with_capacity(len.min(1024));
        for _ in 0..len {
            let key = match self.decode()? {
                Value::String(s) => s,
                _ => return Err(PackStreamError::InvalidMapKey),
            };
            let value = self.decode()?;
            // Last write wins on duplicate keys.
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }

    fn read_struct_data(&mut self, field_count: usize) -> Result<Value, PackStreamError> {
        let signature = self.read_u8()?;
        let mut fields = Vec::with_capacity(field_count.min(64));
        for _ in 0..field_count {
            fields.push(self.decode()?);
        }

        // Dispatch known signatures to their typed constructors; anything
        // else survives as a generic structure.
        match signature {
            NODE_SIG => Node::from_fields(fields).map(Value::Node),
            RELATIONSHIP_SIG => Relationship::from_fields(fields).map(Value::Relationship),
            UNBOUND_RELATIONSHIP_SIG => {
                UnboundRelationship::from_fields(fields).map(Value::UnboundRelationship)
            }
            PATH_SIG => Path::from_fields(fields).map(Value::Path),
            POINT_2D_SIG => Point2D::from_fields(fields).map(Value::Point2D),
            POINT_3D_SIG => Point3D::from_fields(fields).map(Value::Point3D),
            DATE_SIG => Date::from_fields(fields).map(Value::Date),
            TIME_SIG => Time::from_fields(fields).map(Value::Time),
            LOCAL_TIME_SIG => LocalTime::from_fields(fields).map(Value::LocalTime),
            DATE_TIME_SIG | LEGACY_DATE_TIME_SIG => {
                DateTime::from_fields(fields).map(Value::DateTime)
            }
            DATE_TIME_ZONE_ID_SIG | LEGACY_DATE_TIME_ZONE_ID_SIG => {
                DateTimeZoneId::from_fields(fields).map(Value::DateTimeZoneId)
            }
            LOCAL_DATE_TIME_SIG => LocalDateTime::from_fields(fields).map(Value::LocalDateTime),
            DURATION_SIG => Duration::from_fields(fields).map(Value::Duration),
            _ => Ok(Value::Structure(Structure::new(signature, fields))),
        }
    }

    // Low-level reads. Short input is Incomplete, never Invalid.

    fn read_u8(&mut self) -> Result<u8, PackStreamError> {
        if self.remaining() < 1 {
            return Err(PackStreamError::Incomplete);
        }
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    fn read_i8(&mut self) -> Result<i8, PackStreamError> {
        Ok(self.read_u8()? as i8)
    }

    fn read_u16(&mut self) -> Result<u16, PackStreamError> {
        if self.remaining() < 2 {
            return Err(PackStreamError::Incomplete);
        }
        let value = (&self.data[self.pos..]).get_u16();
        self.pos += 2;
        Ok(value)
    }

    fn read_i16(&mut self) -> Result<i16, PackStreamError> {
        if self.remaining() < 2 {
            return Err(PackStreamError::Incomplete);
        }
        let value = (&self.data[self.pos..]).get_i16();
        self.pos += 2;
        Ok(value)
    }

    fn read_u32(&mut self) -> Result<u32, PackStreamError> {
        if self.remaining() < 4 {
            return Err(PackStreamError::Incomplete);
        }
        let value = (&self.data[self.pos..]).get_u32();
        self.pos += 4;
        Ok(value)
    }

    fn read_i32(&mut self) -> Result<i32, PackStreamError> {
        if self.remaining() < 4 {
            return Err(PackStreamError::Incomplete);
        }
        let value = (&self.data[self.pos..]).get_i32();
        self.pos += 4;
        Ok(value)
    }

    fn read_i64(&mut self) -> Result<i64, PackStreamError> {
        if self.remaining() < 8 {
            return Err(PackStreamError::Incomplete);
        }
        let value = (&self.data[self.pos..]).get_i64();
        self.pos += 8;
        Ok(value)
    }

    fn read_f64(&mut self) -> Result<f64, PackStreamError> {
        if self.remaining() < 8 {
            return Err(PackStreamError::Incomplete);
        }
        let value = (&self.data[self.pos..]).get_f64();
        self.pos += 8;
        Ok(value)
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], PackStreamError> {
        if self.remaining() < len {
            return Err(PackStreamError::Incomplete);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }
}

/// Decode a single value from bytes.
///
/// Returns the value and the number of bytes consumed, so callers can detect
/// trailing input or keep decoding from the rest.
pub fn decode(data: &[u8]) -> Result<(Value, usize), PackStreamError> {
    let mut decoder = PackStreamDecoder::new(data);
    let value = decoder.decode()?;
    Ok((value, decoder.position()))
}
