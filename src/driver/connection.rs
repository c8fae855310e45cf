//! Per-connection protocol state machine.
//!
//! A [`Connection`] owns its transport, the negotiated protocol version, a
//! receive buffer, and the current protocol state. The state is a tagged
//! enum stored here and nowhere else; sessions and transactions never
//! duplicate it. Requests that are illegal in the current state are
//! rejected locally before any bytes reach the wire.

use std::collections::HashMap;
use std::time::Duration;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace};

use crate::bolt::codec::BoltMessageCodec;
use crate::bolt::handshake::{build_handshake, parse_reply, BoltVersion, HANDSHAKE_REPLY_SIZE};
use crate::bolt::message::{
    BeginMessage, BoltRequest, BoltResponse, HelloMessage, LogonMessage, PullMessage,
    RecordMessage, RunMessage, SuccessMessage,
};
use crate::bolt::packstream::Value;
use crate::bolt::BoltError;

use super::error::{DriverError, DriverResult};
use super::transport::Transport;

/// Protocol state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport yet
    Disconnected,
    /// TCP connected, handshake in flight
    Negotiating,
    /// Handshake done, HELLO/LOGON in flight
    Authenticating,
    /// Idle; RUN and BEGIN are legal
    Ready,
    /// An auto-commit result stream is open
    Streaming,
    /// Inside an explicit transaction, no open stream
    TxReady,
    /// Inside an explicit transaction with an open stream
    TxStreaming,
    /// The server answered FAILURE; only RESET leads back to Ready
    Failed,
    /// Unusable; the connection must be discarded
    Defunct,
}

/// Everything needed to dial and authenticate one connection.
#[derive(Debug, Clone)]
pub(crate) struct ConnectOptions {
    pub(crate) address: String,
    pub(crate) user_agent: String,
    pub(crate) auth: HashMap<String, Value>,
    pub(crate) connect_timeout: Duration,
    pub(crate) read_timeout: Duration,
}

/// A single Bolt connection: transport, codec, receive buffer and state.
pub struct Connection {
    transport: Transport,
    codec: BoltMessageCodec,
    /// Bytes read from the socket but not yet consumed by the decoder. The
    /// server often coalesces RECORD and SUCCESS into one segment; decoded
    /// trailing bytes stay here for the next read.
    inbound: BytesMut,
    outbound: BytesMut,
    version: BoltVersion,
    state: ConnectionState,
    server_agent: Option<String>,
    connection_id: Option<String>,
}

impl Connection {
    /// Connect, negotiate a version and authenticate.
    pub(crate) async fn open(opts: &ConnectOptions) -> DriverResult<Self> {
        debug!(address = %opts.address, "connecting");

        let mut transport =
            Transport::connect(&opts.address, opts.connect_timeout, opts.read_timeout)
                .await
                .map_err(|e| match e {
                    BoltError::Timeout => {
                        DriverError::Timeout(format!("connect to {} timed out", opts.address))
                    }
                    other => DriverError::ConnectionFailed(format!(
                        "connect to {} failed: {}",
                        opts.address, other
                    )),
                })?;

        // Negotiating: magic plus four version proposals, newest first.
        let handshake = build_handshake(&BoltVersion::ALL);
        transport
            .write_all(&handshake)
            .await
            .map_err(|e| DriverError::ConnectionFailed(format!("handshake write failed: {}", e)))?;

        let mut reply = [0u8; HANDSHAKE_REPLY_SIZE];
        transport.read_exact(&mut reply).await.map_err(|e| match e {
            BoltError::Timeout => DriverError::Timeout("handshake read timed out".into()),
            other => DriverError::HandshakeFailed(format!("handshake read failed: {}", other)),
        })?;

        let version =
            parse_reply(reply).map_err(|e| DriverError::HandshakeFailed(e.to_string()))?;
        debug!(%version, "handshake complete");

        let mut conn = Self {
            transport,
            codec: BoltMessageCodec::new(),
            inbound: BytesMut::with_capacity(8192),
            outbound: BytesMut::with_capacity(8192),
            version,
            state: ConnectionState::Authenticating,
            server_agent: None,
            connection_id: None,
        };

        conn.authenticate(opts).await?;
        Ok(conn)
    }

    /// Split authentication for 5.1+: HELLO carries only the user agent
    /// (plus bolt_agent from 5.3), LOGON carries the credentials.
    async fn authenticate(&mut self, opts: &ConnectOptions) -> DriverResult<()> {
        let mut hello = HelloMessage::new(&opts.user_agent);
        if self.version.supports_bolt_agent() {
            hello = hello.with_bolt_agent(format!("graphbolt/{}", env!("CARGO_PKG_VERSION")));
        }

        self.send(&BoltRequest::Hello(hello)).await?;
        match self.recv().await? {
            BoltResponse::Success(success) => {
                self.server_agent = success.server().map(String::from);
                self.connection_id = success.connection_id().map(String::from);
            }
            BoltResponse::Failure(failure) => {
                self.state = ConnectionState::Defunct;
                return Err(DriverError::AuthFailed {
                    code: failure.code,
                    message: failure.message,
                });
            }
            other => return Err(self.unexpected("HELLO", &other)),
        }

        self.send(&BoltRequest::Logon(LogonMessage::new(opts.auth.clone())))
            .await?;
        match self.recv().await? {
            BoltResponse::Success(_) => {
                self.state = ConnectionState::Ready;
                debug!(
                    server = self.server_agent.as_deref().unwrap_or("unknown"),
                    "authenticated"
                );
                Ok(())
            }
            BoltResponse::Failure(failure) => {
                self.state = ConnectionState::Defunct;
                Err(DriverError::AuthFailed {
                    code: failure.code,
                    message: failure.message,
                })
            }
            other => Err(self.unexpected("LOGON", &other)),
        }
    }

    /// Execute RUN. Legal from Ready and TxReady; transitions into the
    /// corresponding streaming state on SUCCESS.
    pub async fn run(&mut self, message: RunMessage) -> DriverResult<SuccessMessage> {
        let streaming = match self.state {
            ConnectionState::Ready => ConnectionState::Streaming,
            ConnectionState::TxReady => ConnectionState::TxStreaming,
            other => {
                return Err(DriverError::Protocol(format!(
                    "RUN is not permitted in state {:?}",
                    other
                )))
            }
        };

        self.send(&BoltRequest::Run(message)).await?;
        match self.recv().await? {
            BoltResponse::Success(success) => {
                self.state = streaming;
                Ok(success)
            }
            BoltResponse::Failure(failure) => {
                self.state = ConnectionState::Failed;
                Err(DriverError::QueryFailed {
                    code: failure.code,
                    message: failure.message,
                })
            }
            BoltResponse::Ignored => {
                self.state = ConnectionState::Failed;
                Err(DriverError::Protocol("RUN ignored by server".into()))
            }
            other => Err(self.unexpected("RUN", &other)),
        }
    }

    /// Execute PULL, collecting records until the terminal reply. Legal only
    /// while a stream is open; rejected locally otherwise, with nothing
    /// written to the wire.
    pub async fn pull(
        &mut self,
        n: i64,
        qid: Option<i64>,
    ) -> DriverResult<(Vec<RecordMessage>, SuccessMessage)> {
        let (streaming, idle) = match self.state {
            ConnectionState::Streaming => (ConnectionState::Streaming, ConnectionState::Ready),
            ConnectionState::TxStreaming => {
                (ConnectionState::TxStreaming, ConnectionState::TxReady)
            }
            other => {
                return Err(DriverError::Protocol(format!(
                    "PULL is not permitted in state {:?}",
                    other
                )))
            }
        };

        let mut message = PullMessage::with_n(n);
        if let Some(qid) = qid {
            message = message.with_qid(qid);
        }
        self.send(&BoltRequest::Pull(message)).await?;

        let mut records = Vec::new();
        loop {
            match self.recv().await? {
                BoltResponse::Record(record) => records.push(record),
                BoltResponse::Success(success) => {
                    self.state = if success.has_more() { streaming } else { idle };
                    return Ok((records, success));
                }
                BoltResponse::Failure(failure) => {
                    self.state = ConnectionState::Failed;
                    return Err(DriverError::QueryFailed {
                        code: failure.code,
                        message: failure.message,
                    });
                }
                BoltResponse::Ignored => {
                    self.state = ConnectionState::Failed;
                    return Err(DriverError::Protocol("PULL ignored by server".into()));
                }
                other => return Err(self.unexpected("PULL", &other)),
            }
        }
    }

    /// Execute DISCARD for the open stream.
    pub async fn discard(&mut self, n: i64, qid: Option<i64>) -> DriverResult<SuccessMessage> {
        let (streaming, idle) = match self.state {
            ConnectionState::Streaming => (ConnectionState::Streaming, ConnectionState::Ready),
            ConnectionState::TxStreaming => {
                (ConnectionState::TxStreaming, ConnectionState::TxReady)
            }
            other => {
                return Err(DriverError::Protocol(format!(
                    "DISCARD is not permitted in state {:?}",
                    other
                )))
            }
        };

        let mut message = crate::bolt::message::DiscardMessage::with_n(n);
        if let Some(qid) = qid {
            message = message.with_qid(qid);
        }
        self.send(&BoltRequest::Discard(message)).await?;

        match self.recv().await? {
            BoltResponse::Success(success) => {
                self.state = if success.has_more() { streaming } else { idle };
                Ok(success)
            }
            BoltResponse::Failure(failure) => {
                self.state = ConnectionState::Failed;
                Err(DriverError::QueryFailed {
                    code: failure.code,
                    message: failure.message,
                })
            }
            BoltResponse::Ignored => {
                self.state = ConnectionState::Failed;
                Err(DriverError::Protocol("DISCARD ignored by server".into()))
            }
            other => Err(self.unexpected("DISCARD", &other)),
        }
    }

    /// Begin an explicit transaction. Legal only from Ready.
    pub async fn begin(&mut self, message: BeginMessage) -> DriverResult<()> {
        if self.state != ConnectionState::Ready {
            return Err(DriverError::Protocol(format!(
                "BEGIN is not permitted in state {:?}",
                self.state
            )));
        }

        self.send(&BoltRequest::Begin(message)).await?;
        match self.recv().await? {
            BoltResponse::Success(_) => {
                self.state = ConnectionState::TxReady;
                Ok(())
            }
            BoltResponse::Failure(failure) => {
                self.state = ConnectionState::Failed;
                Err(DriverError::QueryFailed {
                    code: failure.code,
                    message: failure.message,
                })
            }
            BoltResponse::Ignored => {
                self.state = ConnectionState::Failed;
                Err(DriverError::Protocol("BEGIN ignored by server".into()))
            }
            other => Err(self.unexpected("BEGIN", &other)),
        }
    }

    /// Commit the open transaction.
    pub async fn commit(&mut self) -> DriverResult<SuccessMessage> {
        self.finish_tx(BoltRequest::Commit).await
    }

    /// Roll back the open transaction.
    pub async fn rollback(&mut self) -> DriverResult<SuccessMessage> {
        self.finish_tx(BoltRequest::Rollback).await
    }

    async fn finish_tx(&mut self, request: BoltRequest) -> DriverResult<SuccessMessage> {
        if self.state != ConnectionState::TxReady {
            return Err(DriverError::Protocol(format!(
                "{} is not permitted in state {:?}",
                request.name(),
                self.state
            )));
        }

        let name = request.name();
        self.send(&request).await?;
        match self.recv().await? {
            BoltResponse::Success(success) => {
                self.state = ConnectionState::Ready;
                Ok(success)
            }
            BoltResponse::Failure(failure) => {
                self.state = ConnectionState::Failed;
                Err(DriverError::QueryFailed {
                    code: failure.code,
                    message: failure.message,
                })
            }
            BoltResponse::Ignored => {
                self.state = ConnectionState::Failed;
                Err(DriverError::Protocol(format!("{} ignored by server", name)))
            }
            other => Err(self.unexpected(name, &other)),
        }
    }

    /// RESET: rejoin Ready from Failed, discarding any stale replies still
    /// in flight (pending RECORDs, IGNOREDs). A failed RESET is fatal.
    pub async fn reset(&mut self) -> DriverResult<()> {
        if self.state == ConnectionState::Defunct {
            return Err(DriverError::ConnectionFailed(
                "cannot reset a defunct connection".into(),
            ));
        }

        self.send(&BoltRequest::Reset).await?;
        loop {
            match self.recv().await? {
                BoltResponse::Success(_) => {
                    self.state = ConnectionState::Ready;
                    return Ok(());
                }
                // Stale replies from the aborted cycle; swallow them.
                BoltResponse::Record(_) | BoltResponse::Ignored => continue,
                BoltResponse::Failure(failure) => {
                    self.state = ConnectionState::Defunct;
                    return Err(DriverError::Protocol(format!(
                        "RESET failed: {}: {}",
                        failure.code, failure.message
                    )));
                }
                other => return Err(self.unexpected("RESET", &other)),
            }
        }
    }

    /// Send GOODBYE (best effort) and close the transport.
    pub async fn close(&mut self) {
        if !matches!(
            self.state,
            ConnectionState::Defunct | ConnectionState::Disconnected
        ) {
            let _ = self.send(&BoltRequest::Goodbye).await;
        }
        let _ = self.transport.shutdown().await;
        self.state = ConnectionState::Defunct;
        debug!("connection closed");
    }

    /// Current protocol state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Negotiated protocol version.
    pub fn version(&self) -> BoltVersion {
        self.version
    }

    /// Server agent string from HELLO, e.g. "Neo4j/5.13.0".
    pub fn server_agent(&self) -> Option<&str> {
        self.server_agent.as_deref()
    }

    /// Connection id assigned by the server.
    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    /// Whether this connection may idle in the pool: Ready with an empty
    /// receive buffer.
    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready && self.inbound.is_empty()
    }

    /// Cap the per-read timeout for subsequent operations.
    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.transport.set_read_timeout(timeout);
    }

    /// The per-read timeout currently in effect.
    pub fn read_timeout(&self) -> Duration {
        self.transport.read_timeout()
    }

    async fn send(&mut self, request: &BoltRequest) -> DriverResult<()> {
        self.outbound.clear();
        self.codec
            .encode(request, &mut self.outbound)
            .map_err(|e| {
                self.state = ConnectionState::Defunct;
                DriverError::from(e)
            })?;

        trace!(message = request.name(), bytes = self.outbound.len(), "send");
        if let Err(e) = self.transport.write_all(&self.outbound).await {
            self.state = ConnectionState::Defunct;
            return Err(e.into());
        }
        Ok(())
    }

    /// Receive one message. The receive buffer is drained first; the socket
    /// is only touched when the decoder needs more bytes.
    async fn recv(&mut self) -> DriverResult<BoltResponse> {
        loop {
            match self.codec.decode(&mut self.inbound) {
                Ok(Some(response)) => {
                    trace!(message = response.name(), "recv");
                    return Ok(response);
                }
                Ok(None) => {}
                Err(e) => {
                    self.state = ConnectionState::Defunct;
                    return Err(e.into());
                }
            }

            let n = match self.transport.read_buf(&mut self.inbound).await {
                Ok(n) => n,
                Err(BoltError::Timeout) => {
                    // A partial message may be buffered; the stream position
                    // is unrecoverable.
                    self.state = ConnectionState::Defunct;
                    return Err(DriverError::Timeout("read timed out".into()));
                }
                Err(e) => {
                    self.state = ConnectionState::Defunct;
                    return Err(e.into());
                }
            };

            if n == 0 {
                self.state = ConnectionState::Defunct;
                return Err(DriverError::ConnectionFailed(
                    "connection closed by server".into(),
                ));
            }
        }
    }

    fn unexpected(&mut self, context: &str, response: &BoltResponse) -> DriverError {
        self.state = ConnectionState::Defunct;
        DriverError::Protocol(format!(
            "unexpected {} in response to {}",
            response.name(),
            context
        ))
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state)
            .field("version", &self.version)
            .field("server_agent", &self.server_agent)
            .field("buffered", &self.inbound.len())
            .finish()
    }
}
