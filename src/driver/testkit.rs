//! Scripted mock Bolt server for end-to-end tests.
//!
//! Two flavors:
//!
//! - [`scripted_server`] plays a fixed script against a single connection:
//!   each step names the expected request signature and the responses to
//!   write back. All responses of one step go out in a single write, which
//!   is how coalesced RECORD + SUCCESS segments are produced.
//! - [`query_server`] accepts any number of connections and answers a
//!   generic HELLO/LOGON/RUN/PULL/RESET conversation, tracking how many RUNs
//!   are in flight at once. Used by the pool contention tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Decoder, Encoder};

use crate::bolt::codec::BoltCodec;
use crate::bolt::handshake::{BoltVersion, BOLT_MAGIC, HANDSHAKE_SIZE};
use crate::bolt::message::{tag, BoltResponse, FailureMessage, RecordMessage, SuccessMessage};
use crate::bolt::packstream::Value;

use super::connection::ConnectOptions;

/// Connect options against a test server.
pub(crate) fn connect_opts(address: String) -> ConnectOptions {
    let mut auth = HashMap::new();
    auth.insert("scheme".to_string(), Value::String("basic".into()));
    auth.insert("principal".to_string(), Value::String("u".into()));
    auth.insert("credentials".to_string(), Value::String("p".into()));
    ConnectOptions {
        address,
        user_agent: "graphbolt-test/1".into(),
        auth,
        connect_timeout: Duration::from_secs(5),
        read_timeout: Duration::from_secs(5),
    }
}

enum StepAction {
    Respond(Vec<BoltResponse>),
    /// Never answer; the client read should time out.
    Stall,
}

/// One exchange in a scripted conversation.
pub(crate) struct Step {
    expect: u8,
    action: StepAction,
}

impl Step {
    pub(crate) fn expect(expect: u8, responses: Vec<BoltResponse>) -> Self {
        Self {
            expect,
            action: StepAction::Respond(responses),
        }
    }

    pub(crate) fn stall(expect: u8) -> Self {
        Self {
            expect,
            action: StepAction::Stall,
        }
    }

    pub(crate) fn hello_success(server: &str) -> Self {
        Self::expect(
            tag::HELLO,
            vec![BoltResponse::Success(SuccessMessage::hello_success(
                server, "mock-1",
            ))],
        )
    }

    pub(crate) fn logon_success() -> Self {
        Self::expect(
            tag::LOGON,
            vec![BoltResponse::Success(SuccessMessage::new())],
        )
    }

    pub(crate) fn run_success(fields: Vec<&str>) -> Self {
        Self::expect(
            tag::RUN,
            vec![BoltResponse::Success(SuccessMessage::run_success(
                fields.into_iter().map(String::from).collect(),
            ))],
        )
    }

    pub(crate) fn run_failure(code: &str, message: &str) -> Self {
        Self::expect(
            tag::RUN,
            vec![BoltResponse::Failure(FailureMessage::new(code, message))],
        )
    }

    pub(crate) fn pull_records(rows: Vec<Vec<Value>>, has_more: bool) -> Self {
        let mut responses: Vec<BoltResponse> = rows
            .into_iter()
            .map(|values| BoltResponse::Record(RecordMessage::new(values)))
            .collect();
        responses.push(BoltResponse::Success(SuccessMessage::streaming_success(
            has_more,
        )));
        Self::expect(tag::PULL, responses)
    }

    pub(crate) fn discard_success() -> Self {
        Self::expect(
            tag::DISCARD,
            vec![BoltResponse::Success(SuccessMessage::streaming_success(
                false,
            ))],
        )
    }

    pub(crate) fn reset_success() -> Self {
        Self::expect(
            tag::RESET,
            vec![BoltResponse::Success(SuccessMessage::new())],
        )
    }

    pub(crate) fn begin_success() -> Self {
        Self::expect(
            tag::BEGIN,
            vec![BoltResponse::Success(SuccessMessage::new())],
        )
    }

    pub(crate) fn commit_success() -> Self {
        Self::expect(
            tag::COMMIT,
            vec![BoltResponse::Success(SuccessMessage::new())],
        )
    }

    pub(crate) fn rollback_success() -> Self {
        Self::expect(
            tag::ROLLBACK,
            vec![BoltResponse::Success(SuccessMessage::new())],
        )
    }
}

/// HELLO + LOGON handshake steps for a server announcing `server`.
pub(crate) fn auth_steps(server: &str) -> Vec<Step> {
    vec![Step::hello_success(server), Step::logon_success()]
}

/// Start a single-connection scripted server. Returns `host:port`.
pub(crate) async fn scripted_server(steps: Vec<Step>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        let (mut socket, _) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(_) => return,
        };

        if server_handshake(&mut socket).await.is_none() {
            return;
        }

        let mut codec = BoltCodec::new();
        let mut buf = BytesMut::with_capacity(4096);

        for step in steps {
            let value = match read_value(&mut socket, &mut codec, &mut buf).await {
                Some(value) => value,
                None => return,
            };
            let signature = match value {
                Value::Structure(s) => s.signature,
                other => {
                    eprintln!("mock server: non-structure message {:?}", other);
                    return;
                }
            };
            if signature != step.expect {
                eprintln!(
                    "mock server: expected 0x{:02X}, got 0x{:02X}",
                    step.expect, signature
                );
                return;
            }

            match step.action {
                StepAction::Respond(responses) => {
                    if write_responses(&mut socket, &responses).await.is_none() {
                        return;
                    }
                }
                StepAction::Stall => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    return;
                }
            }
        }

        // Script done; drain until the client disconnects so a trailing
        // GOODBYE is not a broken pipe.
        let mut scratch = [0u8; 1024];
        loop {
            match socket.read(&mut scratch).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
        }
    });

    address
}

/// A server that answers every handshake with `00 00 00 00`.
pub(crate) async fn rejecting_handshake_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; HANDSHAKE_SIZE];
            if socket.read_exact(&mut buf).await.is_ok() {
                let _ = socket.write_all(&[0, 0, 0, 0]).await;
            }
        }
    });

    address
}

/// Multi-connection server answering a generic query conversation.
pub(crate) struct QueryServer {
    address: String,
    peak: Arc<AtomicUsize>,
}

impl QueryServer {
    pub(crate) fn address(&self) -> String {
        self.address.clone()
    }

    /// Highest number of RUNs that were in flight at the same time.
    pub(crate) fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }
}

/// Start a query server whose RUN handler takes `delay` to answer. A query
/// containing "FAIL" is answered with FAILURE instead.
pub(crate) async fn query_server(delay: Duration) -> QueryServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    {
        let active = active.clone();
        let peak = peak.clone();
        tokio::spawn(async move {
            loop {
                let (socket, _) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(_) => return,
                };
                tokio::spawn(serve_queries(socket, delay, active.clone(), peak.clone()));
            }
        });
    }

    QueryServer { address, peak }
}

async fn serve_queries(
    mut socket: TcpStream,
    delay: Duration,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
) {
    if server_handshake(&mut socket).await.is_none() {
        return;
    }

    let mut codec = BoltCodec::new();
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        let value = match read_value(&mut socket, &mut codec, &mut buf).await {
            Some(value) => value,
            None => return,
        };
        let structure = match value {
            Value::Structure(s) => s,
            _ => return,
        };

        let responses = match structure.signature {
            tag::HELLO => vec![BoltResponse::Success(SuccessMessage::hello_success(
                "MockGraph/1.0",
                "mock-q",
            ))],
            tag::LOGON | tag::RESET | tag::BEGIN | tag::COMMIT | tag::ROLLBACK => {
                vec![BoltResponse::Success(SuccessMessage::new())]
            }
            tag::RUN => {
                let query = structure
                    .fields
                    .first()
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                if query.contains("FAIL") {
                    vec![BoltResponse::Failure(FailureMessage::syntax_error(
                        "requested failure",
                    ))]
                } else {
                    let now = active.fetch_add(1, Ordering::AcqRel) + 1;
                    peak.fetch_max(now, Ordering::AcqRel);
                    tokio::time::sleep(delay).await;
                    active.fetch_sub(1, Ordering::AcqRel);
                    vec![BoltResponse::Success(SuccessMessage::run_success(vec![
                        "n".to_string(),
                    ]))]
                }
            }
            tag::PULL => vec![
                BoltResponse::Record(RecordMessage::new(vec![Value::Integer(1)])),
                BoltResponse::Success(SuccessMessage::streaming_success(false)),
            ],
            tag::GOODBYE => return,
            other => {
                eprintln!("query server: unhandled signature 0x{:02X}", other);
                return;
            }
        };

        if write_responses(&mut socket, &responses).await.is_none() {
            return;
        }
    }
}

/// Server half of the handshake: validate the magic, accept the client's
/// first supported proposal.
async fn server_handshake(socket: &mut TcpStream) -> Option<BoltVersion> {
    let mut buf = [0u8; HANDSHAKE_SIZE];
    socket.read_exact(&mut buf).await.ok()?;

    if buf[0..4] != BOLT_MAGIC {
        return None;
    }

    for chunk in buf[4..].chunks_exact(4) {
        let proposal = [chunk[0], chunk[1], chunk[2], chunk[3]];
        if let Some(version) = BoltVersion::from_reply(proposal) {
            socket.write_all(&version.to_proposal()).await.ok()?;
            return Some(version);
        }
    }

    let _ = socket.write_all(&[0, 0, 0, 0]).await;
    None
}

async fn read_value(
    socket: &mut TcpStream,
    codec: &mut BoltCodec,
    buf: &mut BytesMut,
) -> Option<Value> {
    loop {
        match codec.decode(buf) {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(err) => {
                eprintln!("mock server: decode error: {}", err);
                return None;
            }
        }
        match socket.read_buf(buf).await {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Encode all responses into one buffer and write them with a single call,
/// so they land in as few segments as the kernel allows.
async fn write_responses(socket: &mut TcpStream, responses: &[BoltResponse]) -> Option<()> {
    let mut codec = BoltCodec::new();
    let mut out = BytesMut::with_capacity(1024);
    for response in responses {
        codec
            .encode(Value::Structure(response.to_structure()), &mut out)
            .ok()?;
    }
    socket.write_all(&out).await.ok()?;
    Some(())
}
