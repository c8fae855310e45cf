//! Typed PackStream structures for graph, temporal and spatial values.
//!
//! Each type knows its signature, how to lower itself into structure fields
//! for the encoder, and how to rebuild itself from decoded fields. Temporal
//! types carry the raw wire representation (days, nanoseconds, epoch
//! seconds); chrono conversions are a convenience boundary only.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime as ChronoDateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::marker::*;
use super::types::Value;
use super::PackStreamError;

/// Days between 0001-01-01 (chrono's CE day 1) and the Unix epoch.
const EPOCH_CE_DAYS: i64 = 719_163;

fn field_int(fields: &[Value], i: usize, what: &str) -> Result<i64, PackStreamError> {
    fields
        .get(i)
        .and_then(|v| v.as_int())
        .ok_or_else(|| PackStreamError::InvalidStructure(format!("{} must be an integer", what)))
}

fn field_float(fields: &[Value], i: usize, what: &str) -> Result<f64, PackStreamError> {
    fields
        .get(i)
        .and_then(|v| v.as_float())
        .ok_or_else(|| PackStreamError::InvalidStructure(format!("{} must be a float", what)))
}

fn field_string(fields: &[Value], i: usize, what: &str) -> Result<String, PackStreamError> {
    fields
        .get(i)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| PackStreamError::InvalidStructure(format!("{} must be a string", what)))
}

/// A graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node id
    pub id: i64,
    /// Node labels
    pub labels: Vec<String>,
    /// Node properties
    pub properties: HashMap<String, Value>,
    /// Element id (servers speaking Bolt 5.x)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

impl Node {
    /// Create a new node.
    pub fn new(id: i64, labels: Vec<String>, properties: HashMap<String, Value>) -> Self {
        Self {
            id,
            labels,
            properties,
            element_id: None,
        }
    }

    /// Set the element id.
    pub fn with_element_id(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }

    /// Check whether the node carries the given label.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Get a property value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub(crate) fn to_fields(&self) -> Vec<Value> {
        let mut fields = vec![
            Value::Integer(self.id),
            Value::List(self.labels.iter().cloned().map(Value::String).collect()),
            Value::Map(self.properties.clone()),
        ];
        if let Some(ref eid) = self.element_id {
            fields.push(Value::String(eid.clone()));
        }
        fields
    }

    pub(crate) fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        if fields.len() < 3 {
            return Err(PackStreamError::InvalidStructure(
                "Node requires at least 3 fields".into(),
            ));
        }

        let id = field_int(&fields, 0, "Node id")?;

        let labels = fields[1]
            .as_list()
            .ok_or_else(|| PackStreamError::InvalidStructure("Node labels must be a list".into()))?
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    PackStreamError::InvalidStructure("Node label must be a string".into())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let properties = fields[2]
            .as_map()
            .ok_or_else(|| {
                PackStreamError::InvalidStructure("Node properties must be a map".into())
            })?
            .clone();

        let element_id = fields.get(3).and_then(|v| v.as_str()).map(str::to_string);

        Ok(Self {
            id,
            labels,
            properties,
            element_id,
        })
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels = if self.labels.is_empty() {
            String::new()
        } else {
            format!(":{}", self.labels.join(":"))
        };
        write!(f, "({}{})", self.id, labels)
    }
}

/// A graph relationship with both endpoint ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship id
    pub id: i64,
    /// Start node id
    pub start_node_id: i64,
    /// End node id
    pub end_node_id: i64,
    /// Relationship type
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Relationship properties
    pub properties: HashMap<String, Value>,
    /// Element id (servers speaking Bolt 5.x)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

impl Relationship {
    /// Create a new relationship.
    pub fn new(
        id: i64,
        start_node_id: i64,
        end_node_id: i64,
        rel_type: impl Into<String>,
        properties: HashMap<String, Value>,
    ) -> Self {
        Self {
            id,
            start_node_id,
            end_node_id,
            rel_type: rel_type.into(),
            properties,
            element_id: None,
        }
    }

    /// Get a property value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub(crate) fn to_fields(&self) -> Vec<Value> {
        let mut fields = vec![
            Value::Integer(self.id),
            Value::Integer(self.start_node_id),
            Value::Integer(self.end_node_id),
            Value::String(self.rel_type.clone()),
            Value::Map(self.properties.clone()),
        ];
        if let Some(ref eid) = self.element_id {
            fields.push(Value::String(eid.clone()));
        }
        fields
    }

    pub(crate) fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        if fields.len() < 5 {
            return Err(PackStreamError::InvalidStructure(
                "Relationship requires at least 5 fields".into(),
            ));
        }

        let id = field_int(&fields, 0, "Relationship id")?;
        let start_node_id = field_int(&fields, 1, "Relationship start id")?;
        let end_node_id = field_int(&fields, 2, "Relationship end id")?;
        let rel_type = field_string(&fields, 3, "Relationship type")?;
        let properties = fields[4]
            .as_map()
            .ok_or_else(|| {
                PackStreamError::InvalidStructure("Relationship properties must be a map".into())
            })?
            .clone();
        let element_id = fields.get(5).and_then(|v| v.as_str()).map(str::to_string);

        Ok(Self {
            id,
            start_node_id,
            end_node_id,
            rel_type,
            properties,
            element_id,
        })
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({})-[:{}]->({})",
            self.start_node_id, self.rel_type, self.end_node_id
        )
    }
}

/// A relationship without endpoint ids, as it appears inside a [`Path`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnboundRelationship {
    /// Relationship id
    pub id: i64,
    /// Relationship type
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Relationship properties
    pub properties: HashMap<String, Value>,
    /// Element id (servers speaking Bolt 5.x)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

impl UnboundRelationship {
    /// Create a new unbound relationship.
    pub fn new(id: i64, rel_type: impl Into<String>, properties: HashMap<String, Value>) -> Self {
        Self {
            id,
            rel_type: rel_type.into(),
            properties,
            element_id: None,
        }
    }

    pub(crate) fn to_fields(&self) -> Vec<Value> {
        let mut fields = vec![
            Value::Integer(self.id),
            Value::String(self.rel_type.clone()),
            Value::Map(self.properties.clone()),
        ];
        if let Some(ref eid) = self.element_id {
            fields.push(Value::String(eid.clone()));
        }
        fields
    }

    pub(crate) fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        if fields.len() < 3 {
            return Err(PackStreamError::InvalidStructure(
                "UnboundRelationship requires at least 3 fields".into(),
            ));
        }

        let id = field_int(&fields, 0, "UnboundRelationship id")?;
        let rel_type = field_string(&fields, 1, "UnboundRelationship type")?;
        let properties = fields[2]
            .as_map()
            .ok_or_else(|| {
                PackStreamError::InvalidStructure(
                    "UnboundRelationship properties must be a map".into(),
                )
            })?
            .clone();
        let element_id = fields.get(3).and_then(|v| v.as_str()).map(str::to_string);

        Ok(Self {
            id,
            rel_type,
            properties,
            element_id,
        })
    }
}

/// A graph path: alternating nodes and relationships.
///
/// `indices` follows the Bolt layout: pairs of (relationship offset, node
/// offset), where a negative relationship offset means the relationship was
/// traversed backwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// Nodes in the path
    pub nodes: Vec<Node>,
    /// Relationships in the path (unbound)
    pub relationships: Vec<UnboundRelationship>,
    /// Traversal indices
    pub indices: Vec<i64>,
}

impl Path {
    /// Create a new path.
    pub fn new(
        nodes: Vec<Node>,
        relationships: Vec<UnboundRelationship>,
        indices: Vec<i64>,
    ) -> Self {
        Self {
            nodes,
            relationships,
            indices,
        }
    }

    /// Path length (number of relationships).
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    /// Check if the path has no relationships.
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    /// Start node.
    pub fn start(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// End node.
    pub fn end(&self) -> Option<&Node> {
        self.nodes.last()
    }

    pub(crate) fn to_fields(&self) -> Vec<Value> {
        vec![
            Value::List(self.nodes.iter().cloned().map(Value::Node).collect()),
            Value::List(
                self.relationships
                    .iter()
                    .cloned()
                    .map(Value::UnboundRelationship)
                    .collect(),
            ),
            Value::List(self.indices.iter().copied().map(Value::Integer).collect()),
        ]
    }

    pub(crate) fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        if fields.len() != 3 {
            return Err(PackStreamError::InvalidStructure(
                "Path requires 3 fields".into(),
            ));
        }

        let nodes = fields[0]
            .as_list()
            .ok_or_else(|| PackStreamError::InvalidStructure("Path nodes must be a list".into()))?
            .iter()
            .map(|v| match v {
                Value::Node(n) => Ok(n.clone()),
                _ => Err(PackStreamError::InvalidStructure(
                    "Path nodes must be Node structures".into(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let relationships = fields[1]
            .as_list()
            .ok_or_else(|| {
                PackStreamError::InvalidStructure("Path relationships must be a list".into())
            })?
            .iter()
            .map(|v| match v {
                Value::UnboundRelationship(r) => Ok(r.clone()),
                _ => Err(PackStreamError::InvalidStructure(
                    "Path relationships must be UnboundRelationship structures".into(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let indices = fields[2]
            .as_list()
            .ok_or_else(|| {
                PackStreamError::InvalidStructure("Path indices must be a list".into())
            })?
            .iter()
            .map(|v| {
                v.as_int().ok_or_else(|| {
                    PackStreamError::InvalidStructure("Path index must be an integer".into())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            nodes,
            relationships,
            indices,
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Path: {} nodes, {} rels>",
            self.nodes.len(),
            self.relationships.len()
        )
    }
}

/// A 2D spatial point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// Spatial reference system identifier
    pub srid: i64,
    /// X coordinate (longitude for WGS-84)
    pub x: f64,
    /// Y coordinate (latitude for WGS-84)
    pub y: f64,
}

impl Point2D {
    /// Create a new 2D point.
    pub fn new(srid: i64, x: f64, y: f64) -> Self {
        Self { srid, x, y }
    }

    /// WGS-84 point from longitude/latitude.
    pub fn wgs84(longitude: f64, latitude: f64) -> Self {
        Self::new(SRID_WGS84_2D, longitude, latitude)
    }

    /// Cartesian point.
    pub fn cartesian(x: f64, y: f64) -> Self {
        Self::new(SRID_CARTESIAN_2D, x, y)
    }

    pub(crate) fn to_fields(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.srid),
            Value::Float(self.x),
            Value::Float(self.y),
        ]
    }

    pub(crate) fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        if fields.len() != 3 {
            return Err(PackStreamError::InvalidStructure(
                "Point2D requires 3 fields".into(),
            ));
        }
        Ok(Self {
            srid: field_int(&fields, 0, "Point2D srid")?,
            x: field_float(&fields, 1, "Point2D x")?,
            y: field_float(&fields, 2, "Point2D y")?,
        })
    }
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point(srid={}, x={}, y={})", self.srid, self.x, self.y)
    }
}

/// A 3D spatial point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    /// Spatial reference system identifier
    pub srid: i64,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Point3D {
    /// Create a new 3D point.
    pub fn new(srid: i64, x: f64, y: f64, z: f64) -> Self {
        Self { srid, x, y, z }
    }

    /// WGS-84 point from longitude/latitude/height.
    pub fn wgs84(longitude: f64, latitude: f64, height: f64) -> Self {
        Self::new(SRID_WGS84_3D, longitude, latitude, height)
    }

    /// Cartesian point.
    pub fn cartesian(x: f64, y: f64, z: f64) -> Self {
        Self::new(SRID_CARTESIAN_3D, x, y, z)
    }

    pub(crate) fn to_fields(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.srid),
            Value::Float(self.x),
            Value::Float(self.y),
            Value::Float(self.z),
        ]
    }

    pub(crate) fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        if fields.len() != 4 {
            return Err(PackStreamError::InvalidStructure(
                "Point3D requires 4 fields".into(),
            ));
        }
        Ok(Self {
            srid: field_int(&fields, 0, "Point3D srid")?,
            x: field_float(&fields, 1, "Point3D x")?,
            y: field_float(&fields, 2, "Point3D y")?,
            z: field_float(&fields, 3, "Point3D z")?,
        })
    }
}

impl fmt::Display for Point3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Point(srid={}, x={}, y={}, z={})",
            self.srid, self.x, self.y, self.z
        )
    }
}

/// A calendar date: days since 1970-01-01 (signed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Date {
    /// Days since the Unix epoch
    pub days: i64,
}

impl Date {
    /// Create from days since the epoch.
    pub fn new(days: i64) -> Self {
        Self { days }
    }

    /// Convert from a chrono date.
    pub fn from_chrono(date: NaiveDate) -> Self {
        Self {
            days: date.num_days_from_ce() as i64 - EPOCH_CE_DAYS,
        }
    }

    /// Convert to a chrono date. `None` if out of chrono's range.
    pub fn to_chrono(self) -> Option<NaiveDate> {
        let ce = self.days.checked_add(EPOCH_CE_DAYS)?;
        NaiveDate::from_num_days_from_ce_opt(i32::try_from(ce).ok()?)
    }

    pub(crate) fn to_fields(&self) -> Vec<Value> {
        vec![Value::Integer(self.days)]
    }

    pub(crate) fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        Ok(Self {
            days: field_int(&fields, 0, "Date days")?,
        })
    }
}

/// A time of day with a timezone offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Time {
    /// Nanoseconds since midnight
    pub nanoseconds: i64,
    /// Timezone offset in seconds east of UTC
    pub tz_offset_seconds: i32,
}

impl Time {
    /// Create a new time.
    pub fn new(nanoseconds: i64, tz_offset_seconds: i32) -> Self {
        Self {
            nanoseconds,
            tz_offset_seconds,
        }
    }

    pub(crate) fn to_fields(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.nanoseconds),
            Value::Integer(self.tz_offset_seconds as i64),
        ]
    }

    pub(crate) fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        Ok(Self {
            nanoseconds: field_int(&fields, 0, "Time nanoseconds")?,
            tz_offset_seconds: field_int(&fields, 1, "Time offset")? as i32,
        })
    }
}

/// A time of day without timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalTime {
    /// Nanoseconds since midnight
    pub nanoseconds: i64,
}

impl LocalTime {
    /// Create a new local time.
    pub fn new(nanoseconds: i64) -> Self {
        Self { nanoseconds }
    }

    /// Convert from a chrono time.
    pub fn from_chrono(time: NaiveTime) -> Self {
        use chrono::Timelike;
        Self {
            nanoseconds: time.num_seconds_from_midnight() as i64 * 1_000_000_000
                + time.nanosecond() as i64,
        }
    }

    /// Convert to a chrono time. `None` if out of range.
    pub fn to_chrono(self) -> Option<NaiveTime> {
        if self.nanoseconds < 0 {
            return None;
        }
        let secs = (self.nanoseconds / 1_000_000_000) as u32;
        let nanos = (self.nanoseconds % 1_000_000_000) as u32;
        NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
    }

    pub(crate) fn to_fields(&self) -> Vec<Value> {
        vec![Value::Integer(self.nanoseconds)]
    }

    pub(crate) fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        Ok(Self {
            nanoseconds: field_int(&fields, 0, "LocalTime nanoseconds")?,
        })
    }
}

/// An instant with a fixed timezone offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTime {
    /// Seconds since the Unix epoch (UTC)
    pub seconds: i64,
    /// Nanosecond component
    pub nanoseconds: i64,
    /// Timezone offset in seconds east of UTC
    pub tz_offset_seconds: i32,
}

impl DateTime {
    /// Create a new datetime.
    pub fn new(seconds: i64, nanoseconds: i64, tz_offset_seconds: i32) -> Self {
        Self {
            seconds,
            nanoseconds,
            tz_offset_seconds,
        }
    }

    /// Convert from a chrono datetime.
    pub fn from_chrono(dt: ChronoDateTime<FixedOffset>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanoseconds: dt.timestamp_subsec_nanos() as i64,
            tz_offset_seconds: dt.offset().local_minus_utc(),
        }
    }

    /// Convert to a chrono datetime. `None` if out of range.
    pub fn to_chrono(self) -> Option<ChronoDateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.tz_offset_seconds)?;
        let utc =
            ChronoDateTime::from_timestamp(self.seconds, u32::try_from(self.nanoseconds).ok()?)?;
        Some(utc.with_timezone(&offset))
    }

    pub(crate) fn to_fields(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.seconds),
            Value::Integer(self.nanoseconds),
            Value::Integer(self.tz_offset_seconds as i64),
        ]
    }

    pub(crate) fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        Ok(Self {
            seconds: field_int(&fields, 0, "DateTime seconds")?,
            nanoseconds: field_int(&fields, 1, "DateTime nanoseconds")?,
            tz_offset_seconds: field_int(&fields, 2, "DateTime offset")? as i32,
        })
    }
}

/// An instant with a named timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTimeZoneId {
    /// Seconds since the Unix epoch (UTC)
    pub seconds: i64,
    /// Nanosecond component
    pub nanoseconds: i64,
    /// IANA timezone identifier, e.g. "Europe/Stockholm"
    pub tz_id: String,
}

impl DateTimeZoneId {
    /// Create a new zoned datetime.
    pub fn new(seconds: i64, nanoseconds: i64, tz_id: impl Into<String>) -> Self {
        Self {
            seconds,
            nanoseconds,
            tz_id: tz_id.into(),
        }
    }

    pub(crate) fn to_fields(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.seconds),
            Value::Integer(self.nanoseconds),
            Value::String(self.tz_id.clone()),
        ]
    }

    pub(crate) fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        Ok(Self {
            seconds: field_int(&fields, 0, "DateTime seconds")?,
            nanoseconds: field_int(&fields, 1, "DateTime nanoseconds")?,
            tz_id: field_string(&fields, 2, "DateTime zone id")?,
        })
    }
}

/// An instant without timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDateTime {
    /// Seconds since the Unix epoch
    pub seconds: i64,
    /// Nanosecond component
    pub nanoseconds: i64,
}

impl LocalDateTime {
    /// Create a new local datetime.
    pub fn new(seconds: i64, nanoseconds: i64) -> Self {
        Self {
            seconds,
            nanoseconds,
        }
    }

    /// Convert from a chrono datetime.
    pub fn from_chrono(dt: NaiveDateTime) -> Self {
        Self {
            seconds: dt.and_utc().timestamp(),
            nanoseconds: dt.and_utc().timestamp_subsec_nanos() as i64,
        }
    }

    /// Convert to a chrono datetime. `None` if out of range.
    pub fn to_chrono(self) -> Option<NaiveDateTime> {
        ChronoDateTime::from_timestamp(self.seconds, u32::try_from(self.nanoseconds).ok()?)
            .map(|dt| dt.naive_utc())
    }

    pub(crate) fn to_fields(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.seconds),
            Value::Integer(self.nanoseconds),
        ]
    }

    pub(crate) fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        Ok(Self {
            seconds: field_int(&fields, 0, "LocalDateTime seconds")?,
            nanoseconds: field_int(&fields, 1, "LocalDateTime nanoseconds")?,
        })
    }
}

/// A temporal duration. Components are signed and independent; no
/// normalization is performed across them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duration {
    /// Months
    pub months: i64,
    /// Days
    pub days: i64,
    /// Seconds
    pub seconds: i64,
    /// Nanoseconds
    pub nanoseconds: i64,
}

impl Duration {
    /// Create a new duration.
    pub fn new(months: i64, days: i64, seconds: i64, nanoseconds: i64) -> Self {
        Self {
            months,
            days,
            seconds,
            nanoseconds,
        }
    }

    /// Duration of whole seconds.
    pub fn from_seconds(seconds: i64) -> Self {
        Self::new(0, 0, seconds, 0)
    }

    /// Duration of whole days.
    pub fn from_days(days: i64) -> Self {
        Self::new(0, days, 0, 0)
    }

    pub(crate) fn to_fields(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.months),
            Value::Integer(self.days),
            Value::Integer(self.seconds),
            Value::Integer(self.nanoseconds),
        ]
    }

    pub(crate) fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        if fields.len() != 4 {
            return Err(PackStreamError::InvalidStructure(
                "Duration requires 4 fields".into(),
            ));
        }
        Ok(Self {
            months: field_int(&fields, 0, "Duration months")?,
            days: field_int(&fields, 1, "Duration days")?,
            seconds: field_int(&fields, 2, "Duration seconds")?,
            nanoseconds: field_int(&fields, 3, "Duration nanoseconds")?,
        })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P{}M{}DT{}S",
            self.months,
            self.days,
            self.seconds as f64 + self.nanoseconds as f64 / 1_000_000_000.0
        )
    }
}
