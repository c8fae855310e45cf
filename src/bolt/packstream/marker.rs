//! PackStream type markers.
//!
//! Every PackStream value starts with a marker byte that names its type and,
//! for the tiny forms, carries the size inline.

/// Null marker
pub const NULL: u8 = 0xC0;

/// Boolean markers
pub const FALSE: u8 = 0xC2;
pub const TRUE: u8 = 0xC3;

/// Float marker (64-bit IEEE 754, big-endian)
pub const FLOAT_64: u8 = 0xC1;

/// Integer markers.
/// Tiny integers (-16 to 127) are encoded inline in the marker byte.
pub const TINY_INT_MIN: u8 = 0xF0; // -16
pub const TINY_INT_MAX: u8 = 0x7F; // 127
pub const INT_8: u8 = 0xC8;
pub const INT_16: u8 = 0xC9;
pub const INT_32: u8 = 0xCA;
pub const INT_64: u8 = 0xCB;

/// Bytes markers
pub const BYTES_8: u8 = 0xCC;
pub const BYTES_16: u8 = 0xCD;
pub const BYTES_32: u8 = 0xCE;

/// String markers.
/// Tiny strings (0-15 bytes) use 0x80-0x8F.
pub const TINY_STRING_BASE: u8 = 0x80;
pub const TINY_STRING_MAX_LEN: usize = 15;
pub const STRING_8: u8 = 0xD0;
pub const STRING_16: u8 = 0xD1;
pub const STRING_32: u8 = 0xD2;

/// List markers.
/// Tiny lists (0-15 elements) use 0x90-0x9F.
pub const TINY_LIST_BASE: u8 = 0x90;
pub const TINY_LIST_MAX_LEN: usize = 15;
pub const LIST_8: u8 = 0xD4;
pub const LIST_16: u8 = 0xD5;
pub const LIST_32: u8 = 0xD6;

/// Map markers.
/// Tiny maps (0-15 entries) use 0xA0-0xAF.
pub const TINY_MAP_BASE: u8 = 0xA0;
pub const TINY_MAP_MAX_LEN: usize = 15;
pub const MAP_8: u8 = 0xD8;
pub const MAP_16: u8 = 0xD9;
pub const MAP_32: u8 = 0xDA;

/// Structure markers.
/// Tiny structures (0-15 fields) use 0xB0-0xBF; the signature byte follows.
pub const TINY_STRUCT_BASE: u8 = 0xB0;
pub const TINY_STRUCT_MAX_FIELDS: usize = 15;
pub const STRUCT_8: u8 = 0xDC;
pub const STRUCT_16: u8 = 0xDD;

/// Structure signatures for graph types
pub const NODE_SIG: u8 = 0x4E; // 'N'
pub const RELATIONSHIP_SIG: u8 = 0x52; // 'R'
pub const UNBOUND_RELATIONSHIP_SIG: u8 = 0x72; // 'r'
pub const PATH_SIG: u8 = 0x50; // 'P'

/// Structure signatures for temporal types
pub const DATE_SIG: u8 = 0x44; // 'D'
pub const TIME_SIG: u8 = 0x54; // 'T'
pub const LOCAL_TIME_SIG: u8 = 0x74; // 't'
pub const DATE_TIME_SIG: u8 = 0x49; // 'I' (offset, Bolt 5 UTC form)
pub const DATE_TIME_ZONE_ID_SIG: u8 = 0x69; // 'i' (zone name, Bolt 5 UTC form)
pub const LEGACY_DATE_TIME_SIG: u8 = 0x46; // 'F' (offset, pre-5.0)
pub const LEGACY_DATE_TIME_ZONE_ID_SIG: u8 = 0x66; // 'f' (zone name, pre-5.0)
pub const LOCAL_DATE_TIME_SIG: u8 = 0x64; // 'd'
pub const DURATION_SIG: u8 = 0x45; // 'E'

/// Structure signatures for spatial types
pub const POINT_2D_SIG: u8 = 0x58; // 'X'
pub const POINT_3D_SIG: u8 = 0x59; // 'Y'

/// Default SRID for WGS-84 2D points (longitude/latitude)
pub const SRID_WGS84_2D: i64 = 4326;
/// Default SRID for WGS-84 3D points
pub const SRID_WGS84_3D: i64 = 4979;
/// SRID for cartesian 2D points
pub const SRID_CARTESIAN_2D: i64 = 7203;
/// SRID for cartesian 3D points
pub const SRID_CARTESIAN_3D: i64 = 9157;

/// Check if a byte is a tiny integer marker (-16 to 127)
#[inline]
pub fn is_tiny_int(marker: u8) -> bool {
    marker <= TINY_INT_MAX || marker >= TINY_INT_MIN
}

/// Decode a tiny integer from its marker byte
#[inline]
pub fn decode_tiny_int(marker: u8) -> i8 {
    marker as i8
}

/// Check if an integer fits the tiny-int range
#[inline]
pub fn can_encode_tiny_int(value: i64) -> bool {
    (-16..=127).contains(&value)
}

/// Check if a byte is a tiny string marker (0x80-0x8F)
#[inline]
pub fn is_tiny_string(marker: u8) -> bool {
    (TINY_STRING_BASE..=TINY_STRING_BASE + TINY_STRING_MAX_LEN as u8).contains(&marker)
}

/// Get the length from a tiny string marker
#[inline]
pub fn tiny_string_len(marker: u8) -> usize {
    (marker - TINY_STRING_BASE) as usize
}

/// Check if a byte is a tiny list marker (0x90-0x9F)
#[inline]
pub fn is_tiny_list(marker: u8) -> bool {
    (TINY_LIST_BASE..=TINY_LIST_BASE + TINY_LIST_MAX_LEN as u8).contains(&marker)
}

/// Get the length from a tiny list marker
#[inline]
pub fn tiny_list_len(marker: u8) -> usize {
    (marker - TINY_LIST_BASE) as usize
}

/// Check if a byte is a tiny map marker (0xA0-0xAF)
#[inline]
pub fn is_tiny_map(marker: u8) -> bool {
    (TINY_MAP_BASE..=TINY_MAP_BASE + TINY_MAP_MAX_LEN as u8).contains(&marker)
}

/// Get the entry count from a tiny map marker
#[inline]
pub fn tiny_map_len(marker: u8) -> usize {
    (marker - TINY_MAP_BASE) as usize
}

/// Check if a byte is a tiny struct marker (0xB0-0xBF)
#[inline]
pub fn is_tiny_struct(marker: u8) -> bool {
    (TINY_STRUCT_BASE..=TINY_STRUCT_BASE + TINY_STRUCT_MAX_FIELDS as u8).contains(&marker)
}

/// Get the field count from a tiny struct marker
#[inline]
pub fn tiny_struct_fields(marker: u8) -> usize {
    (marker - TINY_STRUCT_BASE) as usize
}
