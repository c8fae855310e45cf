//! Bolt protocol response messages.
//!
//! Responses flow from the server to the client. A decoded PackStream value
//! is classified into one of the variants below; unknown signatures are kept
//! rather than rejected so newer servers degrade gracefully.

use std::collections::HashMap;

use super::tag;
use crate::bolt::packstream::{PackStreamError, Structure, Value};

/// All Bolt response messages.
#[derive(Debug, Clone)]
pub enum BoltResponse {
    /// SUCCESS - request completed; carries metadata
    Success(SuccessMessage),
    /// RECORD - one row of query results
    Record(RecordMessage),
    /// FAILURE - request failed; carries code and message
    Failure(FailureMessage),
    /// IGNORED - request skipped because the connection is in FAILED state
    Ignored,
    /// A response signature this client does not know
    Unknown {
        /// Structure signature
        signature: u8,
        /// Structure fields
        fields: Vec<Value>,
    },
}

impl BoltResponse {
    /// Get the message name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BoltResponse::Success(_) => "SUCCESS",
            BoltResponse::Record(_) => "RECORD",
            BoltResponse::Failure(_) => "FAILURE",
            BoltResponse::Ignored => "IGNORED",
            BoltResponse::Unknown { .. } => "UNKNOWN",
        }
    }

    /// Check if this is a success response.
    pub fn is_success(&self) -> bool {
        matches!(self, BoltResponse::Success(_))
    }

    /// Check if this is a failure response.
    pub fn is_failure(&self) -> bool {
        matches!(self, BoltResponse::Failure(_))
    }

    /// Check if this is a record response.
    pub fn is_record(&self) -> bool {
        matches!(self, BoltResponse::Record(_))
    }

    /// Classify a decoded message payload.
    ///
    /// The dechunker decodes exactly one value per message; a response that
    /// is not a structure at all is malformed.
    pub fn classify(value: Value) -> Result<Self, PackStreamError> {
        let (signature, fields) = match value {
            Value::Structure(s) => (s.signature, s.fields),
            other => {
                return Err(PackStreamError::InvalidStructure(format!(
                    "expected a message structure, got {}",
                    other.type_name()
                )))
            }
        };

        match signature {
            tag::SUCCESS => Ok(BoltResponse::Success(SuccessMessage::from_fields(fields)?)),
            tag::RECORD => Ok(BoltResponse::Record(RecordMessage::from_fields(fields)?)),
            tag::FAILURE => Ok(BoltResponse::Failure(FailureMessage::from_fields(fields)?)),
            tag::IGNORED => Ok(BoltResponse::Ignored),
            _ => Ok(BoltResponse::Unknown { signature, fields }),
        }
    }

    /// Lower into a PackStream structure (used by the scripted test server).
    pub fn to_structure(&self) -> Structure {
        match self {
            BoltResponse::Success(msg) => msg.to_structure(),
            BoltResponse::Record(msg) => msg.to_structure(),
            BoltResponse::Failure(msg) => msg.to_structure(),
            BoltResponse::Ignored => Structure::new(tag::IGNORED, vec![]),
            BoltResponse::Unknown { signature, fields } => {
                Structure::new(*signature, fields.clone())
            }
        }
    }
}

/// SUCCESS message with its metadata map.
#[derive(Debug, Clone, Default)]
pub struct SuccessMessage {
    /// Response metadata
    pub metadata: HashMap<String, Value>,
}

impl SuccessMessage {
    /// Create a SUCCESS with empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a SUCCESS with the given metadata.
    pub fn with_metadata(metadata: HashMap<String, Value>) -> Self {
        Self { metadata }
    }

    /// Add a metadata entry.
    pub fn add(&mut self, key: &str, value: Value) {
        self.metadata.insert(key.to_string(), value);
    }

    /// Get a metadata entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Server agent string, e.g. "Neo4j/5.13.0".
    pub fn server(&self) -> Option<&str> {
        self.metadata.get("server").and_then(|v| v.as_str())
    }

    /// Connection id assigned by the server.
    pub fn connection_id(&self) -> Option<&str> {
        self.metadata.get("connection_id").and_then(|v| v.as_str())
    }

    /// Field names from the RUN SUCCESS.
    pub fn fields(&self) -> Option<Vec<String>> {
        self.metadata.get("fields").and_then(|v| {
            v.as_list().map(|list| {
                list.iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
        })
    }

    /// Query id from the RUN SUCCESS (explicit transactions).
    pub fn qid(&self) -> Option<i64> {
        self.metadata.get("qid").and_then(|v| v.as_int())
    }

    /// Whether a PULL left more records on the server.
    pub fn has_more(&self) -> bool {
        self.metadata
            .get("has_more")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Database that served the query.
    pub fn db(&self) -> Option<&str> {
        self.metadata.get("db").and_then(|v| v.as_str())
    }

    /// Milliseconds until the result was available (`t_first`).
    pub fn result_available_after(&self) -> Option<i64> {
        self.metadata.get("t_first").and_then(|v| v.as_int())
    }

    /// Milliseconds until the result was consumed (`t_last`).
    pub fn result_consumed_after(&self) -> Option<i64> {
        self.metadata.get("t_last").and_then(|v| v.as_int())
    }

    /// Counter map from the terminal SUCCESS.
    pub fn stats(&self) -> Option<&HashMap<String, Value>> {
        self.metadata.get("stats").and_then(|v| v.as_map())
    }

    /// Query type from the terminal SUCCESS ("r", "rw", "w", "s").
    pub fn query_type(&self) -> Option<&str> {
        self.metadata.get("type").and_then(|v| v.as_str())
    }

    /// Build a HELLO/LOGON SUCCESS (test server helper).
    pub fn hello_success(server: &str, connection_id: &str) -> Self {
        let mut msg = Self::new();
        msg.add("server", Value::String(server.to_string()));
        msg.add("connection_id", Value::String(connection_id.to_string()));
        msg
    }

    /// Build a RUN SUCCESS (test server helper).
    pub fn run_success(fields: Vec<String>) -> Self {
        let mut msg = Self::new();
        msg.add(
            "fields",
            Value::List(fields.into_iter().map(Value::String).collect()),
        );
        msg.add("t_first", Value::Integer(1));
        msg
    }

    /// Build a PULL SUCCESS (test server helper).
    pub fn streaming_success(has_more: bool) -> Self {
        let mut msg = Self::new();
        if has_more {
            msg.add("has_more", Value::Boolean(true));
        } else {
            msg.add("type", Value::String("r".to_string()));
            msg.add("t_last", Value::Integer(1));
        }
        msg
    }

    /// Lower into a PackStream structure.
    pub fn to_structure(&self) -> Structure {
        Structure::new(tag::SUCCESS, vec![Value::Map(self.metadata.clone())])
    }

    fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        let metadata = match fields.into_iter().next() {
            Some(Value::Map(m)) => m,
            Some(_) => {
                return Err(PackStreamError::InvalidStructure(
                    "SUCCESS metadata must be a map".into(),
                ))
            }
            None => HashMap::new(),
        };
        Ok(Self { metadata })
    }
}

/// RECORD message - one row of values.
#[derive(Debug, Clone, Default)]
pub struct RecordMessage {
    /// Row values, aligned with the declared field names
    pub values: Vec<Value>,
}

impl RecordMessage {
    /// Create a new RECORD message.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Number of values in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Lower into a PackStream structure.
    pub fn to_structure(&self) -> Structure {
        Structure::new(tag::RECORD, vec![Value::List(self.values.clone())])
    }

    fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        let values = match fields.into_iter().next() {
            Some(Value::List(list)) => list,
            Some(_) => {
                return Err(PackStreamError::InvalidStructure(
                    "RECORD values must be a list".into(),
                ))
            }
            None => Vec::new(),
        };
        Ok(Self { values })
    }
}

/// FAILURE message with the server's error code and message.
#[derive(Debug, Clone)]
pub struct FailureMessage {
    /// Server error code, e.g. "Neo.ClientError.Statement.SyntaxError"
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Full metadata map as received
    pub metadata: HashMap<String, Value>,
}

impl FailureMessage {
    /// Create a new FAILURE message.
    pub fn new(code: &str, message: &str) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("code".to_string(), Value::String(code.to_string()));
        metadata.insert("message".to_string(), Value::String(message.to_string()));
        Self {
            code: code.to_string(),
            message: message.to_string(),
            metadata,
        }
    }

    /// Syntax error (test server helper).
    pub fn syntax_error(message: &str) -> Self {
        Self::new("Neo.ClientError.Statement.SyntaxError", message)
    }

    /// Authentication error (test server helper).
    pub fn auth_error(message: &str) -> Self {
        Self::new("Neo.ClientError.Security.Unauthorized", message)
    }

    /// Check if this is a client error.
    pub fn is_client_error(&self) -> bool {
        self.code.starts_with("Neo.ClientError")
    }

    /// Check if this is a transient error (a retry may succeed).
    pub fn is_transient(&self) -> bool {
        self.code.starts_with("Neo.TransientError")
    }

    /// Check if this is a database-side error.
    pub fn is_database_error(&self) -> bool {
        self.code.starts_with("Neo.DatabaseError")
    }

    /// Check if this is an authentication/authorization error.
    pub fn is_security_error(&self) -> bool {
        self.code.contains(".Security.")
    }

    /// Lower into a PackStream structure.
    pub fn to_structure(&self) -> Structure {
        Structure::new(tag::FAILURE, vec![Value::Map(self.metadata.clone())])
    }

    fn from_fields(fields: Vec<Value>) -> Result<Self, PackStreamError> {
        let metadata = match fields.into_iter().next() {
            Some(Value::Map(m)) => m,
            _ => {
                return Err(PackStreamError::InvalidStructure(
                    "FAILURE requires a metadata map".into(),
                ))
            }
        };

        let code = metadata
            .get("code")
            .and_then(|v| v.as_str())
            .unwrap_or("Neo.DatabaseError.General.UnknownError")
            .to_string();
        let message = metadata
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Ok(Self {
            code,
            message,
            metadata,
        })
    }
}

impl std::fmt::Display for FailureMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_roundtrip(response: &BoltResponse) -> BoltResponse {
        let value = Value::Structure(response.to_structure());
        BoltResponse::classify(value).unwrap()
    }

    #[test]
    fn test_success_message() {
        let mut msg = SuccessMessage::new();
        msg.add("server", Value::String("Neo4j/5.13.0".to_string()));
        msg.add("connection_id", Value::String("bolt-123".to_string()));

        let parsed = classify_roundtrip(&BoltResponse::Success(msg));
        if let BoltResponse::Success(s) = parsed {
            assert_eq!(s.server(), Some("Neo4j/5.13.0"));
            assert_eq!(s.connection_id(), Some("bolt-123"));
        } else {
            panic!("Expected SUCCESS");
        }
    }

    #[test]
    fn test_success_run_fields() {
        let msg = SuccessMessage::run_success(vec!["name".to_string(), "age".to_string()]);
        assert_eq!(msg.fields().unwrap(), vec!["name", "age"]);
        assert_eq!(msg.result_available_after(), Some(1));
    }

    #[test]
    fn test_success_streaming() {
        let more = SuccessMessage::streaming_success(true);
        assert!(more.has_more());
        assert!(more.query_type().is_none());

        let done = SuccessMessage::streaming_success(false);
        assert!(!done.has_more());
        assert_eq!(done.query_type(), Some("r"));
        assert_eq!(done.result_consumed_after(), Some(1));
    }

    #[test]
    fn test_record_message() {
        let msg = RecordMessage::new(vec![Value::String("Alice".into()), Value::Integer(30)]);
        assert_eq!(msg.len(), 2);
        assert!(!msg.is_empty());

        let parsed = classify_roundtrip(&BoltResponse::Record(msg));
        if let BoltResponse::Record(r) = parsed {
            assert_eq!(r.values[0].as_str(), Some("Alice"));
            assert_eq!(r.values[1].as_int(), Some(30));
        } else {
            panic!("Expected RECORD");
        }
    }

    #[test]
    fn test_failure_message() {
        let msg = FailureMessage::syntax_error("Invalid input");
        assert!(msg.is_client_error());
        assert!(!msg.is_transient());
        assert!(!msg.is_database_error());

        let parsed = classify_roundtrip(&BoltResponse::Failure(msg));
        if let BoltResponse::Failure(f) = parsed {
            assert_eq!(f.code, "Neo.ClientError.Statement.SyntaxError");
            assert_eq!(f.message, "Invalid input");
        } else {
            panic!("Expected FAILURE");
        }
    }

    #[test]
    fn test_failure_classification() {
        assert!(FailureMessage::auth_error("no").is_security_error());
        assert!(FailureMessage::new("Neo.TransientError.Transaction.DeadlockDetected", "")
            .is_transient());
        assert!(FailureMessage::new("Neo.DatabaseError.General.UnknownError", "")
            .is_database_error());
    }

    #[test]
    fn test_failure_display() {
        let msg = FailureMessage::syntax_error("Unexpected token");
        let display = msg.to_string();
        assert!(display.contains("SyntaxError"));
        assert!(display.contains("Unexpected token"));
    }

    #[test]
    fn test_ignored() {
        let parsed = classify_roundtrip(&BoltResponse::Ignored);
        assert!(matches!(parsed, BoltResponse::Ignored));
        assert_eq!(parsed.name(), "IGNORED");
    }

    #[test]
    fn test_unknown_signature_survives() {
        let value = Value::Structure(Structure::new(0x55, vec![Value::Integer(9)]));
        let parsed = BoltResponse::classify(value).unwrap();
        if let BoltResponse::Unknown { signature, fields } = parsed {
            assert_eq!(signature, 0x55);
            assert_eq!(fields, vec![Value::Integer(9)]);
        } else {
            panic!("Expected UNKNOWN");
        }
    }

    #[test]
    fn test_classify_non_structure() {
        let err = BoltResponse::classify(Value::Integer(1)).unwrap_err();
        assert!(matches!(err, PackStreamError::InvalidStructure(_)));
    }

    #[test]
    fn test_response_helpers() {
        let success = BoltResponse::Success(SuccessMessage::new());
        assert!(success.is_success());
        assert!(!success.is_failure());
        assert_eq!(success.name(), "SUCCESS");

        let failure = BoltResponse::Failure(FailureMessage::new("Neo.X", "y"));
        assert!(failure.is_failure());

        let record = BoltResponse::Record(RecordMessage::default());
        assert!(record.is_record());
    }

    #[test]
    fn test_failure_defaults_when_fields_missing() {
        let value = Value::Structure(Structure::new(tag::FAILURE, vec![Value::Map(HashMap::new())]));
        if let BoltResponse::Failure(f) = BoltResponse::classify(value).unwrap() {
            assert_eq!(f.code, "Neo.DatabaseError.General.UnknownError");
            assert_eq!(f.message, "");
        } else {
            panic!("Expected FAILURE");
        }
    }
}
