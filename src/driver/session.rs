//! Sessions: the sequential execution surface.
//!
//! A session checks a connection out of the pool for each operation and
//! always consumes a full RUN/PULL cycle before handing control back, so a
//! connection returns to the pool idle and READY (or gets discarded). After
//! a query failure the session issues RESET before the connection can be
//! reused.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::RwLock;
use tracing::debug;

use crate::bolt::message::{Notification, QueryStats, RunMessage, SuccessMessage};
use crate::bolt::packstream::Value;

use super::connection::{Connection, ConnectionState};
use super::cursor::RecordCursor;
use super::error::{DriverError, DriverResult};
use super::pool::ConnectionPool;
use super::record::Record;
use super::transaction::{Transaction, TransactionConfig};

/// A query with parameters and per-query options.
#[derive(Debug, Clone)]
pub struct Query {
    /// Query text
    pub text: String,
    /// Query parameters
    pub parameters: HashMap<String, Value>,
    /// Caps the transport read timeout for this query only
    pub timeout: Option<Duration>,
}

impl Query {
    /// Create a new query.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: HashMap::new(),
            timeout: None,
        }
    }

    /// Add one parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Merge a parameter map.
    pub fn with_params(mut self, params: HashMap<String, Value>) -> Self {
        self.parameters.extend(params);
        self
    }

    /// Cap the transport read timeout for this query.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl From<&str> for Query {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Query {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Kind of query, from the terminal SUCCESS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// Read-only query ("r")
    ReadOnly,
    /// Read-write query ("rw")
    ReadWrite,
    /// Write-only query ("w")
    WriteOnly,
    /// Schema-changing query ("s")
    SchemaWrite,
}

impl QueryType {
    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "r" => Some(QueryType::ReadOnly),
            "rw" => Some(QueryType::ReadWrite),
            "w" => Some(QueryType::WriteOnly),
            "s" => Some(QueryType::SchemaWrite),
            _ => None,
        }
    }
}

/// Metadata from the terminal SUCCESS of a query.
#[derive(Debug, Clone, Default)]
pub struct ResultSummary {
    /// Kind of query
    pub query_type: Option<QueryType>,
    /// Update counters
    pub stats: QueryStats,
    /// Query plan (EXPLAIN), passed through as received
    pub plan: Option<Value>,
    /// Execution profile (PROFILE), passed through as received
    pub profile: Option<Value>,
    /// Server notifications
    pub notifications: Vec<Notification>,
    /// Time until the result was available
    pub result_available_after: Option<Duration>,
    /// Time until the result was consumed
    pub result_consumed_after: Option<Duration>,
    /// Server agent string
    pub server: Option<String>,
    /// Database that served the query
    pub db: Option<String>,
}

impl ResultSummary {
    pub(crate) fn build(
        run_meta: &SuccessMessage,
        final_meta: &SuccessMessage,
        server: Option<&str>,
    ) -> Self {
        let millis = |v: Option<i64>| v.and_then(|ms| u64::try_from(ms).ok()).map(Duration::from_millis);

        Self {
            query_type: final_meta.query_type().and_then(QueryType::from_wire),
            stats: final_meta
                .stats()
                .map(QueryStats::from_map)
                .unwrap_or_default(),
            plan: final_meta.get("plan").cloned(),
            profile: final_meta.get("profile").cloned(),
            notifications: Notification::from_metadata(&final_meta.metadata),
            result_available_after: millis(run_meta.result_available_after()),
            result_consumed_after: millis(final_meta.result_consumed_after()),
            server: server.map(str::to_string),
            db: final_meta.db().map(str::to_string),
        }
    }
}

/// A fully materialized query result.
#[derive(Debug)]
pub struct QueryResult {
    keys: Arc<Vec<String>>,
    records: Vec<Record>,
    summary: ResultSummary,
}

impl QueryResult {
    pub(crate) fn new(keys: Arc<Vec<String>>, records: Vec<Record>, summary: ResultSummary) -> Self {
        Self {
            keys,
            records,
            summary,
        }
    }

    /// Field names declared by the query.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The result rows.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Metadata from the terminal SUCCESS.
    pub fn summary(&self) -> &ResultSummary {
        &self.summary
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The single row of the result; an error if there is not exactly one.
    pub fn single(mut self) -> DriverResult<Record> {
        if self.records.len() != 1 {
            return Err(DriverError::InvalidArgument(format!(
                "expected a single record, got {}",
                self.records.len()
            )));
        }
        Ok(self.records.remove(0))
    }

    /// The first row, if any.
    pub fn first(mut self) -> Option<Record> {
        if self.records.is_empty() {
            None
        } else {
            Some(self.records.remove(0))
        }
    }
}

impl IntoIterator for QueryResult {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// A logical container for database work, backed by the connection pool.
pub struct Session {
    pool: Arc<ConnectionPool>,
    query_timeout: Duration,
    batch_size: i64,
    open: RwLock<bool>,
}

impl Session {
    pub(crate) fn new(pool: Arc<ConnectionPool>, query_timeout: Duration, batch_size: i64) -> Self {
        Self {
            pool,
            query_timeout,
            batch_size,
            open: RwLock::new(true),
        }
    }

    /// Run an auto-commit query and materialize the whole result.
    ///
    /// Writes RUN, reads the SUCCESS carrying the field names, writes
    /// PULL(-1) and consumes every RECORD up to the terminal reply.
    pub async fn run(
        &self,
        query: impl Into<Query>,
        params: Option<HashMap<String, Value>>,
    ) -> DriverResult<QueryResult> {
        self.ensure_open()?;

        let mut query = query.into();
        if let Some(p) = params {
            query = query.with_params(p);
        }

        let mut conn = self.pool.checkout().await?;
        if let Some(timeout) = query.timeout {
            conn.set_read_timeout(timeout);
        }

        let outcome = execute_query(&mut conn, &query).await;

        if query.timeout.is_some() {
            conn.set_read_timeout(self.query_timeout);
        }

        match outcome {
            Ok(result) => Ok(result),
            Err(err) => {
                recover_after_failure(&mut conn).await;
                Err(err)
            }
        }
    }

    /// Run a query and stream its records lazily in batches.
    ///
    /// The cursor holds the connection until the stream is exhausted (or
    /// dropped); see [`RecordCursor`].
    pub async fn run_stream(
        &self,
        query: impl Into<Query>,
        params: Option<HashMap<String, Value>>,
    ) -> DriverResult<RecordCursor> {
        self.ensure_open()?;

        let mut query = query.into();
        if let Some(p) = params {
            query = query.with_params(p);
        }

        let mut conn = self.pool.checkout().await?;
        let message = RunMessage::new(query.text.as_str()).with_parameters(query.parameters.clone());

        match conn.run(message).await {
            Ok(run_meta) => Ok(RecordCursor::new(conn, run_meta, self.batch_size)),
            Err(err) => {
                recover_after_failure(&mut conn).await;
                Err(err)
            }
        }
    }

    /// Begin an explicit transaction on a dedicated connection.
    pub async fn begin_transaction(
        &self,
        config: Option<TransactionConfig>,
    ) -> DriverResult<Transaction> {
        self.ensure_open()?;

        let conn = self.pool.checkout().await?;
        Transaction::begin(conn, config.unwrap_or_default()).await
    }

    /// Run `work` inside a transaction; commit on `Ok`, roll back on `Err`.
    ///
    /// A rollback error is attached to the original error, never replacing
    /// it.
    pub async fn with_transaction<T, F>(
        &self,
        config: TransactionConfig,
        work: F,
    ) -> DriverResult<T>
    where
        F: for<'t> FnOnce(&'t mut Transaction) -> BoxFuture<'t, DriverResult<T>>,
    {
        self.ensure_open()?;
        self.pool.with_transaction(config, work).await
    }

    /// Close the session. Connections stay with the pool; this only stops
    /// further work through this handle.
    pub async fn close(&self) -> DriverResult<()> {
        *self.open.write() = false;
        Ok(())
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if *self.open.read() {
            Ok(())
        } else {
            Err(DriverError::InvalidArgument("session is closed".into()))
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("open", &*self.open.read())
            .finish()
    }
}

/// RUN + PULL(-1), materializing every record.
pub(crate) async fn execute_query(
    conn: &mut Connection,
    query: &Query,
) -> DriverResult<QueryResult> {
    let message = RunMessage::new(query.text.as_str()).with_parameters(query.parameters.clone());
    let run_meta = conn.run(message).await?;

    let keys = Arc::new(run_meta.fields().unwrap_or_default());

    let (raw, final_meta) = conn.pull(-1, None).await?;
    let records = raw
        .into_iter()
        .map(|record| Record::new(keys.clone(), record.values))
        .collect();

    let summary = ResultSummary::build(&run_meta, &final_meta, conn.server_agent());
    Ok(QueryResult::new(keys, records, summary))
}

/// After a failed cycle, bring the connection back to READY with RESET so
/// the pool can reuse it. If RESET itself fails the connection is already
/// marked defunct and the pool will discard it at checkin.
pub(crate) async fn recover_after_failure(conn: &mut Connection) {
    if conn.state() == ConnectionState::Failed {
        if let Err(err) = conn.reset().await {
            debug!(error = %err, "reset after failure did not recover the connection");
        }
    }
}
