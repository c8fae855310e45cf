//! Parsing of structured metadata carried in SUCCESS messages.

use std::collections::HashMap;

use crate::bolt::packstream::Value;

fn get_i64(map: &HashMap<String, Value>, key: &str) -> i64 {
    map.get(key).and_then(|v| v.as_int()).unwrap_or(0)
}

/// Query counters from the `stats` map of the terminal SUCCESS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Nodes created
    pub nodes_created: i64,
    /// Nodes deleted
    pub nodes_deleted: i64,
    /// Relationships created
    pub relationships_created: i64,
    /// Relationships deleted
    pub relationships_deleted: i64,
    /// Properties set
    pub properties_set: i64,
    /// Labels added
    pub labels_added: i64,
    /// Labels removed
    pub labels_removed: i64,
    /// Indexes added
    pub indexes_added: i64,
    /// Indexes removed
    pub indexes_removed: i64,
    /// Constraints added
    pub constraints_added: i64,
    /// Constraints removed
    pub constraints_removed: i64,
}

impl QueryStats {
    /// Check if the query modified any data.
    pub fn contains_updates(&self) -> bool {
        self.nodes_created > 0
            || self.nodes_deleted > 0
            || self.relationships_created > 0
            || self.relationships_deleted > 0
            || self.properties_set > 0
            || self.labels_added > 0
            || self.labels_removed > 0
    }

    /// Check if the query modified the schema.
    pub fn contains_system_updates(&self) -> bool {
        self.indexes_added > 0
            || self.indexes_removed > 0
            || self.constraints_added > 0
            || self.constraints_removed > 0
    }

    /// Parse from the `stats` counter map.
    pub fn from_map(map: &HashMap<String, Value>) -> Self {
        Self {
            nodes_created: get_i64(map, "nodes-created"),
            nodes_deleted: get_i64(map, "nodes-deleted"),
            relationships_created: get_i64(map, "relationships-created"),
            relationships_deleted: get_i64(map, "relationships-deleted"),
            properties_set: get_i64(map, "properties-set"),
            labels_added: get_i64(map, "labels-added"),
            labels_removed: get_i64(map, "labels-removed"),
            indexes_added: get_i64(map, "indexes-added"),
            indexes_removed: get_i64(map, "indexes-removed"),
            constraints_added: get_i64(map, "constraints-added"),
            constraints_removed: get_i64(map, "constraints-removed"),
        }
    }
}

/// A server notification attached to the terminal SUCCESS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Notification code
    pub code: String,
    /// Short title
    pub title: String,
    /// Longer description
    pub description: String,
    /// Severity ("WARNING", "INFORMATION", ...)
    pub severity: String,
    /// Offending position in the query text, if any
    pub position: Option<InputPosition>,
}

impl Notification {
    /// Parse a single notification map.
    pub fn from_map(map: &HashMap<String, Value>) -> Self {
        let text = |key: &str| {
            map.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };

        let position = map.get("position").and_then(|v| v.as_map()).map(|p| {
            InputPosition {
                offset: get_i64(p, "offset"),
                line: get_i64(p, "line"),
                column: get_i64(p, "column"),
            }
        });

        Self {
            code: text("code"),
            title: text("title"),
            description: text("description"),
            severity: text("severity"),
            position,
        }
    }

    /// Parse the `notifications` list from SUCCESS metadata.
    pub fn from_metadata(metadata: &HashMap<String, Value>) -> Vec<Self> {
        metadata
            .get("notifications")
            .and_then(|v| v.as_list())
            .map(|list| {
                list.iter()
                    .filter_map(|item| item.as_map())
                    .map(Self::from_map)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A position inside the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputPosition {
    /// Byte offset from the start of the query
    pub offset: i64,
    /// 1-based line
    pub line: i64,
    /// 1-based column
    pub column: i64,
}
