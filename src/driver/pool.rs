//! Connection pool.
//!
//! A fixed base of `size` connections plus up to `max_overflow` extras.
//! Checkout is bounded by a fair semaphore of `size + max_overflow` permits,
//! so waiters are served in arrival (FIFO) order and at most `size +
//! max_overflow` connections are ever live: new connections are only dialed
//! while holding a permit with the idle set empty, and checkin only idles a
//! connection while the idle set is below the base size - overflow
//! connections close on return.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use super::connection::{ConnectOptions, Connection};
use super::error::{DriverError, DriverResult};
use super::transaction::{Transaction, TransactionConfig};

/// Idle-set discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolStrategy {
    /// Oldest idle connection first
    #[default]
    Fifo,
    /// Most recently returned connection first
    Lifo,
}

/// Pool sizing and behavior.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Base number of pooled connections (N)
    pub size: usize,
    /// Additional connections allowed under load (K)
    pub max_overflow: usize,
    /// How long a checkout may wait for a worker
    pub checkout_timeout: Duration,
    /// Idle connections older than this are re-dialed on checkout
    pub idle_timeout: Duration,
    /// Idle-set discipline
    pub strategy: PoolStrategy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 10,
            max_overflow: 5,
            checkout_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(300),
            strategy: PoolStrategy::Fifo,
        }
    }
}

/// Point-in-time pool counters.
#[derive(Debug, Clone, Default)]
pub struct PoolMetrics {
    /// Connections currently alive (idle + checked out)
    pub live: usize,
    /// Connections idle in the pool
    pub idle: usize,
    /// Connections currently checked out
    pub in_use: usize,
    /// Connections dialed over the pool's lifetime
    pub total_created: u64,
    /// Connections closed over the pool's lifetime
    pub total_closed: u64,
    /// Successful checkouts
    pub total_checkouts: u64,
    /// Checkouts that timed out
    pub total_timeouts: u64,
}

struct IdleEntry {
    conn: Connection,
    since: Instant,
}

struct PoolShared {
    config: PoolConfig,
    connect: ConnectOptions,
    idle: Mutex<VecDeque<IdleEntry>>,
    semaphore: Arc<Semaphore>,
    live: AtomicUsize,
    open: AtomicBool,
    total_created: AtomicU64,
    total_closed: AtomicU64,
    total_checkouts: AtomicU64,
    total_timeouts: AtomicU64,
}

impl PoolShared {
    /// Return a connection. Runs in `Drop`, so it must not block: a worker
    /// that is not clean READY is dropped on the floor (closing the socket,
    /// which aborts any open server-side work) rather than sent GOODBYE.
    fn checkin(&self, conn: Connection) {
        if !self.open.load(Ordering::Acquire) {
            self.discard(conn);
            return;
        }

        if conn.is_ready() {
            let mut idle = self.idle.lock();
            if idle.len() < self.config.size {
                idle.push_back(IdleEntry {
                    conn,
                    since: Instant::now(),
                });
                return;
            }
            // Overflow connection: the base set is full.
            debug!("closing overflow connection on checkin");
        } else {
            warn!(state = ?conn.state(), "discarding unhealthy connection on checkin");
        }

        self.discard(conn);
    }

    fn discard(&self, conn: Connection) {
        drop(conn);
        self.live.fetch_sub(1, Ordering::AcqRel);
        self.total_closed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Concurrency-safe pool of Bolt connections.
pub struct ConnectionPool {
    shared: Arc<PoolShared>,
}

impl ConnectionPool {
    pub(crate) fn new(connect: ConnectOptions, config: PoolConfig) -> Self {
        let permits = config.size + config.max_overflow;
        Self {
            shared: Arc::new(PoolShared {
                config,
                connect,
                idle: Mutex::new(VecDeque::new()),
                semaphore: Arc::new(Semaphore::new(permits)),
                live: AtomicUsize::new(0),
                open: AtomicBool::new(true),
                total_created: AtomicU64::new(0),
                total_closed: AtomicU64::new(0),
                total_checkouts: AtomicU64::new(0),
                total_timeouts: AtomicU64::new(0),
            }),
        }
    }

    /// Check out a worker, waiting up to the configured checkout timeout.
    ///
    /// Idle workers are validated first: anything not clean READY, or idle
    /// past the idle timeout, is closed and replaced with a fresh
    /// connection before being handed out.
    pub async fn checkout(&self) -> DriverResult<PooledConnection> {
        let shared = &self.shared;

        if !shared.open.load(Ordering::Acquire) {
            return Err(DriverError::PoolClosed);
        }

        let permit = match tokio::time::timeout(
            shared.config.checkout_timeout,
            shared.semaphore.clone().acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            // The semaphore only closes on shutdown.
            Ok(Err(_)) => return Err(DriverError::PoolClosed),
            Err(_) => {
                shared.total_timeouts.fetch_add(1, Ordering::Relaxed);
                return Err(DriverError::PoolExhausted(format!(
                    "no connection available within {:?}",
                    shared.config.checkout_timeout
                )));
            }
        };

        if !shared.open.load(Ordering::Acquire) {
            return Err(DriverError::PoolClosed);
        }

        loop {
            let candidate = {
                let mut idle = shared.idle.lock();
                match shared.config.strategy {
                    PoolStrategy::Fifo => idle.pop_front(),
                    PoolStrategy::Lifo => idle.pop_back(),
                }
            };

            match candidate {
                Some(entry) => {
                    if entry.conn.is_ready()
                        && entry.since.elapsed() < shared.config.idle_timeout
                    {
                        shared.total_checkouts.fetch_add(1, Ordering::Relaxed);
                        return Ok(PooledConnection {
                            conn: Some(entry.conn),
                            shared: shared.clone(),
                            _permit: permit,
                        });
                    }
                    debug!("replacing stale idle connection");
                    shared.discard(entry.conn);
                }
                None => break,
            }
        }

        // Nothing idle: dial a new connection. The held permit bounds live
        // connections to size + max_overflow.
        let conn = Connection::open(&shared.connect).await?;
        shared.live.fetch_add(1, Ordering::AcqRel);
        shared.total_created.fetch_add(1, Ordering::Relaxed);
        shared.total_checkouts.fetch_add(1, Ordering::Relaxed);

        Ok(PooledConnection {
            conn: Some(conn),
            shared: shared.clone(),
            _permit: permit,
        })
    }

    /// Run `work` inside an explicit transaction on a pooled connection.
    ///
    /// The transaction handle is passed into the callback explicitly. On
    /// `Ok` the transaction commits; on `Err` it rolls back, and a rollback
    /// failure is attached to the original error without masking it.
    pub async fn with_transaction<T, F>(
        &self,
        config: TransactionConfig,
        work: F,
    ) -> DriverResult<T>
    where
        F: for<'t> FnOnce(&'t mut Transaction) -> BoxFuture<'t, DriverResult<T>>,
    {
        let conn = self.checkout().await?;
        let mut tx = Transaction::begin(conn, config).await?;

        match work(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => match tx.rollback().await {
                Ok(()) => Err(err),
                Err(rollback) => {
                    warn!(error = %rollback, "rollback failed after transaction error");
                    Err(DriverError::RollbackFailure {
                        source: Box::new(err),
                        rollback: Box::new(rollback),
                    })
                }
            },
        }
    }

    /// Shut the pool down: no new checkouts; idle workers close now, and
    /// outstanding workers close as they are checked in.
    pub async fn close(&self) {
        let shared = &self.shared;
        shared.open.store(false, Ordering::Release);
        shared.semaphore.close();

        let drained: Vec<IdleEntry> = {
            let mut idle = shared.idle.lock();
            idle.drain(..).collect()
        };

        for mut entry in drained {
            entry.conn.close().await;
            shared.live.fetch_sub(1, Ordering::AcqRel);
            shared.total_closed.fetch_add(1, Ordering::Relaxed);
        }
        debug!("pool closed");
    }

    /// Whether the pool is accepting checkouts.
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Acquire)
    }

    /// Number of idle workers.
    pub fn idle_count(&self) -> usize {
        self.shared.idle.lock().len()
    }

    /// Number of live connections (idle + checked out).
    pub fn live_count(&self) -> usize {
        self.shared.live.load(Ordering::Acquire)
    }

    /// Counter snapshot.
    pub fn metrics(&self) -> PoolMetrics {
        let idle = self.idle_count();
        let live = self.live_count();
        PoolMetrics {
            live,
            idle,
            in_use: live.saturating_sub(idle),
            total_created: self.shared.total_created.load(Ordering::Relaxed),
            total_closed: self.shared.total_closed.load(Ordering::Relaxed),
            total_checkouts: self.shared.total_checkouts.load(Ordering::Relaxed),
            total_timeouts: self.shared.total_timeouts.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("open", &self.is_open())
            .field("live", &self.live_count())
            .field("idle", &self.idle_count())
            .finish()
    }
}

/// A checked-out worker. Exactly one caller holds it; dropping it returns
/// the connection to the pool (or closes it when it is not clean READY).
pub struct PooledConnection {
    conn: Option<Connection>,
    shared: Arc<PoolShared>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        self.conn.as_ref().expect("connection taken")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().expect("connection taken")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.shared.checkin(conn);
        }
    }
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("conn", &self.conn)
            .finish()
    }
}
