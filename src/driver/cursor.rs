//! Lazy, batched streaming over large result sets.
//!
//! A [`RecordCursor`] owns the connection its query ran on and fetches
//! records with repeated PULL requests of `batch_size` each, stopping when
//! the server reports `has_more = false`. The iteration is single-pass and
//! non-restartable; the connection returns to the pool once the stream is
//! exhausted, consumed, or dropped.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::Stream;

use crate::bolt::message::SuccessMessage;

use super::error::{DriverError, DriverResult};
use super::pool::PooledConnection;
use super::record::Record;
use super::session::ResultSummary;

/// A lazy cursor over the records of one query.
pub struct RecordCursor {
    conn: Option<PooledConnection>,
    keys: Arc<Vec<String>>,
    qid: Option<i64>,
    batch_size: i64,
    buffer: VecDeque<Record>,
    run_meta: SuccessMessage,
    summary: Option<ResultSummary>,
    finished: bool,
}

impl RecordCursor {
    pub(crate) fn new(conn: PooledConnection, run_meta: SuccessMessage, batch_size: i64) -> Self {
        let keys = Arc::new(run_meta.fields().unwrap_or_default());
        let qid = run_meta.qid();
        Self {
            conn: Some(conn),
            keys,
            qid,
            batch_size,
            buffer: VecDeque::new(),
            run_meta,
            summary: None,
            finished: false,
        }
    }

    /// Field names declared by the query.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Fetch the next record, pulling a new batch from the server when the
    /// local buffer runs dry.
    pub async fn next(&mut self) -> DriverResult<Option<Record>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }
            if self.finished {
                return Ok(None);
            }
            self.fetch_batch().await?;
        }
    }

    /// Drain the rest of the stream into a vector.
    pub async fn collect(mut self) -> DriverResult<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// Discard any remaining records server-side and return the summary.
    pub async fn consume(mut self) -> DriverResult<ResultSummary> {
        self.buffer.clear();

        if !self.finished {
            let conn = self
                .conn
                .as_mut()
                .ok_or_else(|| DriverError::Protocol("cursor has no connection".into()))?;

            match conn.discard(-1, self.qid).await {
                Ok(final_meta) => {
                    self.finish(final_meta);
                }
                Err(err) => {
                    self.finished = true;
                    self.conn.take();
                    return Err(err);
                }
            }
        }

        self.summary
            .take()
            .ok_or_else(|| DriverError::Protocol("stream ended without a terminal SUCCESS".into()))
    }

    /// Metadata from the terminal SUCCESS; available once the stream is
    /// exhausted.
    pub fn summary(&self) -> Option<&ResultSummary> {
        self.summary.as_ref()
    }

    /// Whether the server has no more records for this query.
    pub fn is_exhausted(&self) -> bool {
        self.finished && self.buffer.is_empty()
    }

    /// Adapt into a `futures::Stream` of records.
    pub fn into_stream(self) -> impl Stream<Item = DriverResult<Record>> + Send {
        futures::stream::try_unfold(self, |mut cursor| async move {
            Ok(cursor.next().await?.map(|record| (record, cursor)))
        })
    }

    async fn fetch_batch(&mut self) -> DriverResult<()> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| DriverError::Protocol("cursor has no connection".into()))?;

        match conn.pull(self.batch_size, self.qid).await {
            Ok((records, success)) => {
                for record in records {
                    self.buffer
                        .push_back(Record::new(self.keys.clone(), record.values));
                }
                if !success.has_more() {
                    self.finish(success);
                }
                Ok(())
            }
            Err(err) => {
                // The connection is Failed or Defunct; hand it back for the
                // pool to discard.
                self.finished = true;
                self.conn.take();
                Err(err)
            }
        }
    }

    fn finish(&mut self, final_meta: SuccessMessage) {
        self.finished = true;
        let server = self
            .conn
            .as_deref()
            .and_then(|c| c.server_agent())
            .map(str::to_string);
        self.summary = Some(ResultSummary::build(
            &self.run_meta,
            &final_meta,
            server.as_deref(),
        ));
        // Clean READY connection goes back to the idle set.
        self.conn.take();
    }
}

impl std::fmt::Debug for RecordCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCursor")
            .field("keys", &self.keys)
            .field("buffered", &self.buffer.len())
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::packstream::Value;
    use crate::driver::pool::{ConnectionPool, PoolConfig};
    use crate::driver::session::{QueryType, Session};
    use crate::driver::testkit::{self, Step};
    use std::time::Duration;

    async fn session_for(steps: Vec<Step>) -> (Session, Arc<ConnectionPool>) {
        let addr = testkit::scripted_server(steps).await;
        let pool = Arc::new(ConnectionPool::new(
            testkit::connect_opts(addr),
            PoolConfig {
                size: 1,
                max_overflow: 0,
                ..Default::default()
            },
        ));
        // batch_size of 2 keeps the PULL cadence visible in the script.
        (
            Session::new(pool.clone(), Duration::from_secs(30), 2),
            pool,
        )
    }

    fn rows(values: &[i64]) -> Vec<Vec<Value>> {
        values.iter().map(|v| vec![Value::Integer(*v)]).collect()
    }

    #[tokio::test]
    async fn test_batched_iteration() {
        // Three records over two PULLs of batch_size 2.
        let mut steps = testkit::auth_steps("Neo4j/5.13.0");
        steps.push(Step::run_success(vec!["n"]));
        steps.push(Step::pull_records(rows(&[1, 2]), true));
        steps.push(Step::pull_records(rows(&[3]), false));
        let (session, pool) = session_for(steps).await;

        let mut cursor = session.run_stream("UNWIND range(1,3) AS n RETURN n", None)
            .await
            .unwrap();
        assert_eq!(cursor.keys(), &["n"]);

        let mut seen = Vec::new();
        while let Some(record) = cursor.next().await.unwrap() {
            seen.push(record.get_int("n").unwrap());
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.summary().unwrap().query_type, Some(QueryType::ReadOnly));

        // The connection went back to the pool once the stream dried up.
        assert_eq!(pool.idle_count(), 1);
    }

    #[tokio::test]
    async fn test_collect() {
        let mut steps = testkit::auth_steps("Neo4j/5.13.0");
        steps.push(Step::run_success(vec!["n"]));
        steps.push(Step::pull_records(rows(&[1, 2]), true));
        steps.push(Step::pull_records(rows(&[3, 4]), true));
        steps.push(Step::pull_records(vec![], false));
        let (session, _pool) = session_for(steps).await;

        let cursor = session.run_stream("RETURN n", None).await.unwrap();
        let records = cursor.collect().await.unwrap();
        assert_eq!(records.len(), 4);
    }

    #[tokio::test]
    async fn test_into_stream() {
        use tokio_stream::StreamExt;

        let mut steps = testkit::auth_steps("Neo4j/5.13.0");
        steps.push(Step::run_success(vec!["n"]));
        steps.push(Step::pull_records(rows(&[10, 20]), true));
        steps.push(Step::pull_records(rows(&[30]), false));
        let (session, _pool) = session_for(steps).await;

        let cursor = session.run_stream("RETURN n", None).await.unwrap();
        let values: Vec<i64> = cursor
            .into_stream()
            .map(|r| r.unwrap().get_int("n").unwrap())
            .collect()
            .await;
        assert_eq!(values, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_consume_discards_remaining() {
        let mut steps = testkit::auth_steps("Neo4j/5.13.0");
        steps.push(Step::run_success(vec!["n"]));
        steps.push(Step::pull_records(rows(&[1, 2]), true));
        steps.push(Step::discard_success());
        let (session, pool) = session_for(steps).await;

        let mut cursor = session.run_stream("RETURN n", None).await.unwrap();
        // Read one batch, then abandon the rest.
        cursor.next().await.unwrap();

        let summary = cursor.consume().await.unwrap();
        assert_eq!(summary.query_type, Some(QueryType::ReadOnly));
        assert_eq!(pool.idle_count(), 1);
    }

    #[tokio::test]
    async fn test_dropped_cursor_discards_connection() {
        let mut steps = testkit::auth_steps("Neo4j/5.13.0");
        steps.push(Step::run_success(vec!["n"]));
        let (session, pool) = session_for(steps).await;

        let cursor = session.run_stream("RETURN n", None).await.unwrap();
        drop(cursor);

        // The connection was still Streaming, so the pool closed it.
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(pool.live_count(), 0);
    }
}
