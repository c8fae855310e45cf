//! Explicit transactions.
//!
//! A [`Transaction`] owns its pooled connection for its whole lifetime.
//! `commit` and `rollback` consume the handle; a handle dropped while still
//! active discards its connection, which makes the server abort (roll back)
//! the open transaction when the link closes. The deterministic scoped form
//! is [`Session::with_transaction`](super::session::Session::with_transaction).

use std::collections::HashMap;
use std::time::Duration;

use tracing::warn;

use crate::bolt::message::{AccessMode, BeginMessage};
use crate::bolt::packstream::Value;

use super::connection::ConnectionState;
use super::error::{DriverError, DriverResult};
use super::pool::PooledConnection;
use super::session::{execute_query, Query, QueryResult};

/// Options for BEGIN.
#[derive(Debug, Clone, Default)]
pub struct TransactionConfig {
    /// Access mode; read-only transactions may be routed differently by the
    /// server
    pub mode: AccessMode,
    /// Server-side transaction timeout
    pub timeout: Option<Duration>,
    /// Opaque metadata attached to the transaction
    pub metadata: HashMap<String, Value>,
}

impl TransactionConfig {
    /// Create a default (write-mode) configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the access mode.
    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the server-side transaction timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    fn to_begin(&self) -> BeginMessage {
        let mut message = BeginMessage::new().with_mode(self.mode);
        if let Some(timeout) = self.timeout {
            message = message.with_timeout(timeout);
        }
        message.tx_metadata = self.metadata.clone();
        message
    }
}

/// Lifecycle state of a transaction handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// BEGIN succeeded; queries, commit and rollback are legal
    Active,
    /// COMMIT succeeded
    Committed,
    /// ROLLBACK succeeded (or the failed transaction was cleared)
    RolledBack,
}

impl TransactionState {
    /// Whether the transaction has finished one way or the other.
    pub fn is_terminated(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// An explicit transaction holding a dedicated connection.
pub struct Transaction {
    conn: Option<PooledConnection>,
    state: TransactionState,
}

impl Transaction {
    /// BEGIN on the given connection. On failure the connection goes back
    /// to the pool, which discards it if it is not clean.
    pub(crate) async fn begin(
        mut conn: PooledConnection,
        config: TransactionConfig,
    ) -> DriverResult<Self> {
        conn.begin(config.to_begin()).await?;
        Ok(Self {
            conn: Some(conn),
            state: TransactionState::Active,
        })
    }

    /// Run a query inside the transaction, materializing the whole result.
    pub async fn run(
        &mut self,
        query: impl Into<Query>,
        params: Option<HashMap<String, Value>>,
    ) -> DriverResult<QueryResult> {
        self.ensure_active()?;

        let mut query = query.into();
        if let Some(p) = params {
            query = query.with_params(p);
        }

        let conn = self.conn_mut()?;
        execute_query(conn, &query).await
    }

    /// COMMIT and return the connection to the pool.
    pub async fn commit(mut self) -> DriverResult<()> {
        self.ensure_active()?;

        let conn = self.conn_mut()?;
        conn.commit().await?;
        self.state = TransactionState::Committed;
        // Connection drops clean READY and idles in the pool.
        self.conn.take();
        Ok(())
    }

    /// ROLLBACK and return the connection to the pool.
    ///
    /// If a query inside the transaction already failed, the server has
    /// terminated the transaction on its side; a RESET clears the FAILED
    /// state instead of an explicit ROLLBACK.
    pub async fn rollback(mut self) -> DriverResult<()> {
        if self.state.is_terminated() {
            return Ok(());
        }

        let conn = self.conn_mut()?;
        let outcome = match conn.state() {
            ConnectionState::TxReady => conn.rollback().await.map(|_| ()),
            ConnectionState::Failed => conn.reset().await,
            // Defunct or otherwise unusable: the pool discards the
            // connection and the server aborts the transaction on close.
            _ => Ok(()),
        };

        self.state = TransactionState::RolledBack;
        self.conn.take();
        outcome
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    fn ensure_active(&self) -> DriverResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(DriverError::Protocol(
                "transaction already committed".into(),
            )),
            TransactionState::RolledBack => Err(DriverError::Protocol(
                "transaction already rolled back".into(),
            )),
        }
    }

    fn conn_mut(&mut self) -> DriverResult<&mut PooledConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| DriverError::Protocol("transaction has no connection".into()))
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.state == TransactionState::Active && self.conn.is_some() {
            // The connection is still TxReady/Failed, so the pool closes it
            // at checkin and the server aborts the open transaction.
            warn!("transaction dropped without commit or rollback; discarding its connection");
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("state", &self.state)
            .finish()
    }
}
