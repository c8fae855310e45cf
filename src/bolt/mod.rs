//! # Bolt Protocol Implementation
//!
//! Low-level client implementation of the Bolt protocol (versions 5.1-5.4).
//!
//! ## Submodules
//!
//! - [`packstream`] - Binary serialization of values and structures
//! - [`message`] - Bolt message construction and response classification
//! - [`handshake`] - Version negotiation
//! - [`codec`] - Chunked message framing for Tokio
//! - [`error`] - Protocol error types
//!
//! Most users should use the high-level [`crate::driver`] module instead of
//! speaking the protocol directly.

pub mod codec;
pub mod error;
pub mod handshake;
pub mod message;
pub mod packstream;

pub use codec::{BoltCodec, BoltMessageCodec};
pub use error::{BoltError, BoltResult, HandshakeError};
pub use handshake::BoltVersion;
pub use message::{
    AccessMode, BeginMessage, BoltRequest, BoltResponse, DiscardMessage, FailureMessage,
    HelloMessage, LogonMessage, Notification, PullMessage, QueryStats, RecordMessage,
    RouteMessage, RunMessage, SuccessMessage,
};
pub use packstream::{
    Date, DateTime, DateTimeZoneId, Duration, LocalDateTime, LocalTime, Node, PackStreamError,
    Path, Point2D, Point3D, Relationship, Structure, Time, UnboundRelationship, Value,
};
