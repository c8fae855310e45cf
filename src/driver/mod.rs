//! # Driver Module
//!
//! The high-level API: [`Driver`] owns a [`ConnectionPool`] and hands out
//! [`Session`]s; sessions run auto-commit queries, open explicit
//! [`Transaction`]s, and stream large results through [`RecordCursor`].
//!
//! ```rust,no_run
//! use graphbolt::{AuthToken, Driver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let driver = Driver::new("bolt://localhost:7687", AuthToken::basic("neo4j", "secret"))?;
//! let session = driver.session();
//!
//! let result = session.run("MATCH (n) RETURN n LIMIT 10", None).await?;
//! for record in result {
//!     println!("{}", record);
//! }
//!
//! driver.close().await?;
//! # Ok(())
//! # }
//! ```

mod connection;
mod cursor;
mod driver;
mod error;
mod pool;
mod record;
mod session;
mod transaction;
mod transport;

#[cfg(test)]
pub(crate) mod testkit;

pub use connection::{Connection, ConnectionState};
pub use cursor::RecordCursor;
pub use driver::{
    AuthToken, Driver, DriverConfig, DriverConfigBuilder, ServerAddress, DEFAULT_BOLT_PORT,
};
pub use error::{DriverError, DriverResult};
pub use pool::{ConnectionPool, PoolConfig, PoolMetrics, PoolStrategy, PooledConnection};
pub use record::{Record, RecordKey};
pub use session::{Query, QueryResult, QueryType, ResultSummary, Session};
pub use transaction::{Transaction, TransactionConfig, TransactionState};

/// Build a parameter map for [`Session::run`] and friends.
///
/// ```rust
/// use graphbolt::params;
///
/// let params = params! {
///     "name" => "Alice",
///     "age" => 30i64,
/// };
/// assert_eq!(params.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        std::collections::HashMap::<String, $crate::Value>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = std::collections::HashMap::<String, $crate::Value>::new();
        $(
            map.insert($key.into(), $crate::Value::from($value));
        )+
        map
    }};
}
