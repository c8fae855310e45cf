//! Driver entry point and configuration.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::bolt::packstream::Value;

use super::connection::ConnectOptions;
use super::error::{DriverError, DriverResult};
use super::pool::{ConnectionPool, PoolConfig, PoolMetrics, PoolStrategy};
use super::session::Session;

/// Default Bolt port.
pub const DEFAULT_BOLT_PORT: u16 = 7687;

/// Authentication token, lowered into the LOGON auth map.
#[derive(Debug, Clone, Default)]
pub enum AuthToken {
    /// No authentication
    #[default]
    None,
    /// Basic username/password authentication
    Basic {
        /// Username (principal)
        username: String,
        /// Password (credentials)
        password: String,
    },
    /// Bearer token authentication
    Bearer {
        /// The token
        token: String,
    },
    /// Custom scheme with explicit fields
    Custom {
        /// Authentication scheme name
        scheme: String,
        /// Principal, if the scheme uses one
        principal: Option<String>,
        /// Credentials, if the scheme uses them
        credentials: Option<String>,
        /// Extra scheme-specific entries
        parameters: HashMap<String, Value>,
    },
}

impl AuthToken {
    /// Basic username/password authentication.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Bearer token authentication.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// No authentication.
    pub fn none() -> Self {
        Self::None
    }

    /// The scheme name this token uses.
    pub fn scheme(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Basic { .. } => "basic",
            Self::Bearer { .. } => "bearer",
            Self::Custom { scheme, .. } => scheme,
        }
    }

    /// Lower into the auth map sent in LOGON.
    pub fn to_map(&self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert(
            "scheme".to_string(),
            Value::String(self.scheme().to_string()),
        );

        match self {
            Self::None => {}
            Self::Basic { username, password } => {
                map.insert("principal".to_string(), Value::String(username.clone()));
                map.insert("credentials".to_string(), Value::String(password.clone()));
            }
            Self::Bearer { token } => {
                map.insert("credentials".to_string(), Value::String(token.clone()));
            }
            Self::Custom {
                principal,
                credentials,
                parameters,
                ..
            } => {
                if let Some(p) = principal {
                    map.insert("principal".to_string(), Value::String(p.clone()));
                }
                if let Some(c) = credentials {
                    map.insert("credentials".to_string(), Value::String(c.clone()));
                }
                for (k, v) in parameters {
                    map.insert(k.clone(), v.clone());
                }
            }
        }

        map
    }
}

/// Target server address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    /// Hostname or IP
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl ServerAddress {
    /// Create an address from host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse a `bolt://host[:port]` URI. Any other scheme is rejected.
    pub fn from_uri(uri: &str) -> DriverResult<Self> {
        let rest = match uri.split_once("://") {
            Some(("bolt", rest)) => rest,
            Some((scheme, _)) => {
                return Err(DriverError::InvalidArgument(format!(
                    "unsupported scheme '{}': only bolt:// is supported",
                    scheme
                )))
            }
            None => {
                return Err(DriverError::InvalidArgument(format!(
                    "invalid URI '{}': expected bolt://host[:port]",
                    uri
                )))
            }
        };

        let rest = rest.trim_end_matches('/');
        if rest.is_empty() {
            return Err(DriverError::InvalidArgument(
                "invalid URI: missing host".into(),
            ));
        }

        match rest.split_once(':') {
            None => Ok(Self::new(rest, DEFAULT_BOLT_PORT)),
            Some((host, port)) => {
                if host.is_empty() {
                    return Err(DriverError::InvalidArgument(
                        "invalid URI: missing host".into(),
                    ));
                }
                let port = port.parse().map_err(|_| {
                    DriverError::InvalidArgument(format!("invalid port '{}'", port))
                })?;
                Ok(Self::new(host, port))
            }
        }
    }

    /// Render as `host:port` for the TCP connector.
    pub fn to_socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Driver configuration.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Target server
    pub address: ServerAddress,
    /// Authentication token
    pub auth: AuthToken,
    /// User agent sent in HELLO
    pub user_agent: String,
    /// TCP connect and handshake deadline
    pub connection_timeout: Duration,
    /// Per-read deadline during queries
    pub query_timeout: Duration,
    /// Base pool size (N)
    pub pool_size: usize,
    /// Overflow connections allowed under load (K)
    pub max_overflow: usize,
    /// Idle-set discipline
    pub strategy: PoolStrategy,
    /// Streaming batch size for cursors
    pub batch_size: i64,
}

impl DriverConfig {
    /// Build a configuration from a `bolt://` URI and an auth token.
    pub fn new(uri: &str, auth: AuthToken) -> DriverResult<Self> {
        Ok(Self {
            address: ServerAddress::from_uri(uri)?,
            auth,
            user_agent: format!("graphbolt/{}", env!("CARGO_PKG_VERSION")),
            connection_timeout: Duration::from_millis(15_000),
            query_timeout: Duration::from_millis(30_000),
            pool_size: 10,
            max_overflow: 5,
            strategy: PoolStrategy::Fifo,
            batch_size: 1000,
        })
    }

    /// Start a builder.
    pub fn builder(uri: &str, auth: AuthToken) -> DriverResult<DriverConfigBuilder> {
        Ok(DriverConfigBuilder {
            config: Self::new(uri, auth)?,
        })
    }

    fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            address: self.address.to_socket_addr(),
            user_agent: self.user_agent.clone(),
            auth: self.auth.to_map(),
            connect_timeout: self.connection_timeout,
            read_timeout: self.query_timeout,
        }
    }

    fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            size: self.pool_size,
            max_overflow: self.max_overflow,
            strategy: self.strategy,
            ..Default::default()
        }
    }
}

/// Builder for [`DriverConfig`].
#[derive(Debug)]
pub struct DriverConfigBuilder {
    config: DriverConfig,
}

impl DriverConfigBuilder {
    /// Set the user agent sent in HELLO.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the TCP connect and handshake deadline.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.config.connection_timeout = timeout;
        self
    }

    /// Set the per-read deadline during queries.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.config.query_timeout = timeout;
        self
    }

    /// Set the base pool size.
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.config.pool_size = size;
        self
    }

    /// Set the overflow allowance.
    pub fn with_max_overflow(mut self, overflow: usize) -> Self {
        self.config.max_overflow = overflow;
        self
    }

    /// Set the idle-set discipline.
    pub fn with_strategy(mut self, strategy: PoolStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Set the streaming batch size.
    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Finish the builder.
    pub fn build(self) -> DriverConfig {
        self.config
    }
}

/// Entry point: owns the connection pool and creates sessions.
pub struct Driver {
    config: Arc<DriverConfig>,
    pool: Arc<ConnectionPool>,
}

impl Driver {
    /// Create a driver for a `bolt://` URI.
    pub fn new(uri: &str, auth: AuthToken) -> DriverResult<Self> {
        Self::with_config(DriverConfig::new(uri, auth)?)
    }

    /// Create a driver from a prepared configuration.
    pub fn with_config(config: DriverConfig) -> DriverResult<Self> {
        let pool = ConnectionPool::new(config.connect_options(), config.pool_config());
        Ok(Self {
            config: Arc::new(config),
            pool: Arc::new(pool),
        })
    }

    /// Open a session.
    pub fn session(&self) -> Session {
        Session::new(
            self.pool.clone(),
            self.config.query_timeout,
            self.config.batch_size,
        )
    }

    /// The active configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// The underlying pool (checkout, metrics, transactions).
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Round-trip a RESET on a pooled connection to prove the server is
    /// reachable and credentials work.
    pub async fn verify_connectivity(&self) -> DriverResult<()> {
        let mut conn = self.pool.checkout().await?;
        conn.reset().await
    }

    /// Pool counter snapshot.
    pub fn metrics(&self) -> PoolMetrics {
        self.pool.metrics()
    }

    /// Shut down the pool. Outstanding connections close as they return.
    pub async fn close(&self) -> DriverResult<()> {
        self.pool.close().await;
        Ok(())
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("address", &self.config.address)
            .field("open", &self.pool.is_open())
            .finish()
    }
}
