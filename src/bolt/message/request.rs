//! Bolt protocol request messages.
//!
//! Requests flow from the client to the server. Each type is a thin
//! constructor that lowers into a PackStream structure for the codec.

use std::collections::HashMap;
use std::time::Duration;

use super::tag;
use crate::bolt::packstream::{Structure, Value};

/// All Bolt request messages.
#[derive(Debug, Clone)]
pub enum BoltRequest {
    /// HELLO - Open the session (user agent, no auth in 5.1+)
    Hello(HelloMessage),
    /// LOGON - Authenticate (Bolt 5.1+)
    Logon(LogonMessage),
    /// LOGOFF - Deauthenticate (Bolt 5.1+)
    Logoff,
    /// GOODBYE - Close the connection gracefully
    Goodbye,
    /// RESET - Return the connection to READY
    Reset,
    /// RUN - Execute a query
    Run(RunMessage),
    /// DISCARD - Discard pending results
    Discard(DiscardMessage),
    /// PULL - Pull result records
    Pull(PullMessage),
    /// BEGIN - Start an explicit transaction
    Begin(BeginMessage),
    /// COMMIT - Commit the open transaction
    Commit,
    /// ROLLBACK - Roll back the open transaction
    Rollback,
    /// ROUTE - Request routing information
    Route(RouteMessage),
}

impl BoltRequest {
    /// Get the message signature.
    pub fn tag(&self) -> u8 {
        match self {
            BoltRequest::Hello(_) => tag::HELLO,
            BoltRequest::Logon(_) => tag::LOGON,
            BoltRequest::Logoff => tag::LOGOFF,
            BoltRequest::Goodbye => tag::GOODBYE,
            BoltRequest::Reset => tag::RESET,
            BoltRequest::Run(_) => tag::RUN,
            BoltRequest::Discard(_) => tag::DISCARD,
            BoltRequest::Pull(_) => tag::PULL,
            BoltRequest::Begin(_) => tag::BEGIN,
            BoltRequest::Commit => tag::COMMIT,
            BoltRequest::Rollback => tag::ROLLBACK,
            BoltRequest::Route(_) => tag::ROUTE,
        }
    }

    /// Get the message name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BoltRequest::Hello(_) => "HELLO",
            BoltRequest::Logon(_) => "LOGON",
            BoltRequest::Logoff => "LOGOFF",
            BoltRequest::Goodbye => "GOODBYE",
            BoltRequest::Reset => "RESET",
            BoltRequest::Run(_) => "RUN",
            BoltRequest::Discard(_) => "DISCARD",
            BoltRequest::Pull(_) => "PULL",
            BoltRequest::Begin(_) => "BEGIN",
            BoltRequest::Commit => "COMMIT",
            BoltRequest::Rollback => "ROLLBACK",
            BoltRequest::Route(_) => "ROUTE",
        }
    }

    /// Lower into a PackStream structure.
    pub fn to_structure(&self) -> Structure {
        match self {
            BoltRequest::Hello(msg) => msg.to_structure(),
            BoltRequest::Logon(msg) => msg.to_structure(),
            BoltRequest::Logoff => Structure::new(tag::LOGOFF, vec![]),
            BoltRequest::Goodbye => Structure::new(tag::GOODBYE, vec![]),
            BoltRequest::Reset => Structure::new(tag::RESET, vec![]),
            BoltRequest::Run(msg) => msg.to_structure(),
            BoltRequest::Discard(msg) => msg.to_structure(),
            BoltRequest::Pull(msg) => msg.to_structure(),
            BoltRequest::Begin(msg) => msg.to_structure(),
            BoltRequest::Commit => Structure::new(tag::COMMIT, vec![]),
            BoltRequest::Rollback => Structure::new(tag::ROLLBACK, vec![]),
            BoltRequest::Route(msg) => msg.to_structure(),
        }
    }
}

/// HELLO message. For Bolt 5.1+ this carries only the user agent (plus the
/// `bolt_agent` map from 5.3); credentials travel separately in LOGON.
#[derive(Debug, Clone)]
pub struct HelloMessage {
    /// User agent string, e.g. "myapp/1.0"
    pub user_agent: String,
    /// `bolt_agent` metadata map (Bolt 5.3+)
    pub bolt_agent: Option<HashMap<String, Value>>,
    /// Additional extra entries
    pub extra: HashMap<String, Value>,
}

impl HelloMessage {
    /// Create a new HELLO message.
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            bolt_agent: None,
            extra: HashMap::new(),
        }
    }

    /// Attach the `bolt_agent` map.
    pub fn with_bolt_agent(mut self, product: impl Into<String>) -> Self {
        let mut agent = HashMap::new();
        agent.insert("product".to_string(), Value::String(product.into()));
        agent.insert(
            "platform".to_string(),
            Value::String(format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH)),
        );
        self.bolt_agent = Some(agent);
        self
    }

    /// Lower into a PackStream structure.
    pub fn to_structure(&self) -> Structure {
        let mut extra = self.extra.clone();
        extra.insert(
            "user_agent".to_string(),
            Value::String(self.user_agent.clone()),
        );
        if let Some(ref agent) = self.bolt_agent {
            extra.insert("bolt_agent".to_string(), Value::Map(agent.clone()));
        }
        Structure::new(tag::HELLO, vec![Value::Map(extra)])
    }
}

/// LOGON message (Bolt 5.1+) carrying the auth map.
#[derive(Debug, Clone)]
pub struct LogonMessage {
    /// Auth map: `scheme`, `principal`, `credentials`, extra fields.
    pub auth: HashMap<String, Value>,
}

impl LogonMessage {
    /// Create a new LOGON message.
    pub fn new(auth: HashMap<String, Value>) -> Self {
        Self { auth }
    }

    /// Lower into a PackStream structure.
    pub fn to_structure(&self) -> Structure {
        Structure::new(tag::LOGON, vec![Value::Map(self.auth.clone())])
    }
}

/// RUN message - execute a query.
#[derive(Debug, Clone)]
pub struct RunMessage {
    /// Query text
    pub query: String,
    /// Query parameters
    pub parameters: HashMap<String, Value>,
    /// Extra metadata (db, mode, tx_timeout for auto-commit)
    pub extra: HashMap<String, Value>,
}

impl RunMessage {
    /// Create a new RUN message.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: HashMap::new(),
            extra: HashMap::new(),
        }
    }

    /// Set query parameters.
    pub fn with_parameters(mut self, params: HashMap<String, Value>) -> Self {
        self.parameters = params;
        self
    }

    /// Set the target database.
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.extra.insert("db".to_string(), Value::String(db.into()));
        self
    }

    /// Lower into a PackStream structure.
    pub fn to_structure(&self) -> Structure {
        Structure::new(
            tag::RUN,
            vec![
                Value::String(self.query.clone()),
                Value::Map(self.parameters.clone()),
                Value::Map(self.extra.clone()),
            ],
        )
    }
}

/// PULL message - pull result records. `n = -1` means all.
#[derive(Debug, Clone, Copy)]
pub struct PullMessage {
    /// Number of records to pull (-1 for all)
    pub n: i64,
    /// Query id for multi-result streams
    pub qid: Option<i64>,
}

impl PullMessage {
    /// PULL everything.
    pub fn all() -> Self {
        Self { n: -1, qid: None }
    }

    /// PULL a bounded batch.
    pub fn with_n(n: i64) -> Self {
        Self { n, qid: None }
    }

    /// Set the query id.
    pub fn with_qid(mut self, qid: i64) -> Self {
        self.qid = Some(qid);
        self
    }

    /// Lower into a PackStream structure.
    pub fn to_structure(&self) -> Structure {
        let mut extra = HashMap::new();
        extra.insert("n".to_string(), Value::Integer(self.n));
        if let Some(qid) = self.qid {
            extra.insert("qid".to_string(), Value::Integer(qid));
        }
        Structure::new(tag::PULL, vec![Value::Map(extra)])
    }
}

/// DISCARD message - discard pending records. `n = -1` means all.
#[derive(Debug, Clone, Copy)]
pub struct DiscardMessage {
    /// Number of records to discard (-1 for all)
    pub n: i64,
    /// Query id for multi-result streams
    pub qid: Option<i64>,
}

impl DiscardMessage {
    /// DISCARD everything.
    pub fn all() -> Self {
        Self { n: -1, qid: None }
    }

    /// DISCARD a bounded batch.
    pub fn with_n(n: i64) -> Self {
        Self { n, qid: None }
    }

    /// Set the query id.
    pub fn with_qid(mut self, qid: i64) -> Self {
        self.qid = Some(qid);
        self
    }

    /// Lower into a PackStream structure.
    pub fn to_structure(&self) -> Structure {
        let mut extra = HashMap::new();
        extra.insert("n".to_string(), Value::Integer(self.n));
        if let Some(qid) = self.qid {
            extra.insert("qid".to_string(), Value::Integer(qid));
        }
        Structure::new(tag::DISCARD, vec![Value::Map(extra)])
    }
}

/// Transaction access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Read-write access (default)
    #[default]
    Write,
    /// Read-only access
    Read,
}

impl AccessMode {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Read => "r",
            AccessMode::Write => "w",
        }
    }
}

/// BEGIN message - start an explicit transaction.
#[derive(Debug, Clone, Default)]
pub struct BeginMessage {
    /// Access mode; only "r" is sent on the wire
    pub mode: AccessMode,
    /// Transaction timeout
    pub tx_timeout: Option<Duration>,
    /// Transaction metadata
    pub tx_metadata: HashMap<String, Value>,
    /// Target database
    pub database: Option<String>,
}

impl BeginMessage {
    /// Create a new BEGIN message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the access mode.
    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the transaction timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.tx_timeout = Some(timeout);
        self
    }

    /// Set the target database.
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = Some(db.into());
        self
    }

    /// Lower into a PackStream structure.
    pub fn to_structure(&self) -> Structure {
        let mut extra = HashMap::new();

        if self.mode == AccessMode::Read {
            extra.insert("mode".to_string(), Value::String("r".to_string()));
        }
        if let Some(timeout) = self.tx_timeout {
            extra.insert(
                "tx_timeout".to_string(),
                Value::Integer(timeout.as_millis() as i64),
            );
        }
        if !self.tx_metadata.is_empty() {
            extra.insert(
                "tx_metadata".to_string(),
                Value::Map(self.tx_metadata.clone()),
            );
        }
        if let Some(ref db) = self.database {
            extra.insert("db".to_string(), Value::String(db.clone()));
        }

        Structure::new(tag::BEGIN, vec![Value::Map(extra)])
    }
}

/// ROUTE message - request routing information.
#[derive(Debug, Clone, Default)]
pub struct RouteMessage {
    /// Routing context
    pub routing: HashMap<String, Value>,
    /// Target database
    pub database: Option<String>,
}

impl RouteMessage {
    /// Create a new ROUTE message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target database.
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = Some(db.into());
        self
    }

    /// Lower into a PackStream structure.
    pub fn to_structure(&self) -> Structure {
        let db = self
            .database
            .as_ref()
            .map(|s| Value::String(s.clone()))
            .unwrap_or(Value::Null);

        Structure::new(
            tag::ROUTE,
            vec![Value::Map(self.routing.clone()), Value::List(vec![]), db],
        )
    }
}
