//! # graphbolt
//!
//! An async Rust client for Bolt-speaking graph databases (Neo4j,
//! Memgraph), implementing Bolt protocol versions 5.1 through 5.4.
//!
//! ## Features
//!
//! - **Bolt 5.1-5.4** - handshake negotiation, chunked framing and the full
//!   PackStream type system, including graph, spatial and temporal values
//! - **Async/Await** - built on Tokio
//! - **Connection pooling** - a fixed base of connections plus bounded
//!   overflow, with FIFO-fair checkout
//! - **Transactions** - explicit begin/commit/rollback and a scoped
//!   `with_transaction` form with guaranteed rollback on error
//! - **Lazy streaming** - batched cursors over large result sets
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use graphbolt::{AuthToken, Driver, params};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let driver = Driver::new(
//!         "bolt://localhost:7687",
//!         AuthToken::basic("neo4j", "password"),
//!     )?;
//!
//!     let session = driver.session();
//!     let result = session
//!         .run(
//!             "CREATE (n:Person {name: $name}) RETURN n",
//!             Some(params! { "name" => "Alice" }),
//!         )
//!         .await?;
//!
//!     for record in result {
//!         println!("{}", record);
//!     }
//!
//!     driver.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Transactions
//!
//! ```rust,no_run
//! # use graphbolt::{AuthToken, Driver, TransactionConfig};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let driver = Driver::new("bolt://localhost:7687", AuthToken::none())?;
//! let session = driver.session();
//!
//! // Explicit control:
//! let mut tx = session.begin_transaction(None).await?;
//! tx.run("CREATE (n:Node {id: 1})", None).await?;
//! tx.commit().await?;
//!
//! // Scoped: commits on Ok, rolls back on Err.
//! let count = session
//!     .with_transaction(TransactionConfig::new(), |tx| {
//!         Box::pin(async move {
//!             let result = tx.run("MATCH (n) RETURN count(n) AS c", None).await?;
//!             result.single()?.get_int("c")
//!         })
//!     })
//!     .await?;
//! # let _ = count;
//! # Ok(())
//! # }
//! ```
//!
//! ## Streaming
//!
//! ```rust,no_run
//! # use graphbolt::{AuthToken, Driver};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let driver = Driver::new("bolt://localhost:7687", AuthToken::none())?;
//! let session = driver.session();
//! let mut cursor = session.run_stream("MATCH (n) RETURN n", None).await?;
//!
//! while let Some(record) = cursor.next().await? {
//!     // Records are fetched from the server in batches.
//!     let _ = record;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`driver`] - drivers, sessions, transactions, pooling
//! - [`bolt`] - the wire protocol: PackStream, messages, framing

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bolt;
pub mod driver;

// Re-exports for convenience.
pub use driver::{
    AuthToken, Connection, ConnectionPool, ConnectionState, Driver, DriverConfig,
    DriverConfigBuilder, DriverError, DriverResult, PoolConfig, PoolMetrics, PoolStrategy,
    PooledConnection, Query, QueryResult, QueryType, Record, RecordCursor, RecordKey,
    ResultSummary, ServerAddress, Session, Transaction, TransactionConfig, TransactionState,
};

pub use bolt::{
    AccessMode, BoltVersion, Date, DateTime, DateTimeZoneId, Duration, LocalDateTime, LocalTime,
    Node, Notification, Path, Point2D, Point3D, QueryStats, Relationship, Structure, Time,
    UnboundRelationship, Value,
};
