//! Bolt protocol error types.

use std::fmt;
use std::io;

use super::packstream::PackStreamError;

/// Result type for protocol-level operations.
pub type BoltResult<T> = Result<T, BoltError>;

/// Protocol-level errors below the public driver surface.
#[derive(Debug)]
pub enum BoltError {
    /// I/O error on the transport
    Io(io::Error),

    /// Handshake error
    Handshake(HandshakeError),

    /// PackStream codec error
    PackStream(PackStreamError),

    /// Malformed or unexpected message
    Protocol(String),

    /// Message exceeded the configured size limit
    MessageTooLarge {
        /// Accumulated message size
        size: usize,
        /// Configured maximum
        max: usize,
    },

    /// A transport read or write exceeded its deadline
    Timeout,

    /// The peer closed the connection
    ConnectionClosed,
}

impl fmt::Display for BoltError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoltError::Io(e) => write!(f, "I/O error: {}", e),
            BoltError::Handshake(e) => write!(f, "handshake error: {}", e),
            BoltError::PackStream(e) => write!(f, "PackStream error: {}", e),
            BoltError::Protocol(msg) => write!(f, "protocol error: {}", msg),
            BoltError::MessageTooLarge { size, max } => {
                write!(f, "message too large: {} bytes (max {})", size, max)
            }
            BoltError::Timeout => write!(f, "operation timed out"),
            BoltError::ConnectionClosed => write!(f, "connection closed by peer"),
        }
    }
}

impl std::error::Error for BoltError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BoltError::Io(e) => Some(e),
            BoltError::Handshake(e) => Some(e),
            BoltError::PackStream(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for BoltError {
    fn from(err: io::Error) -> Self {
        BoltError::Io(err)
    }
}

impl From<HandshakeError> for BoltError {
    fn from(err: HandshakeError) -> Self {
        BoltError::Handshake(err)
    }
}

impl From<PackStreamError> for BoltError {
    fn from(err: PackStreamError) -> Self {
        BoltError::PackStream(err)
    }
}

/// Handshake-specific errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeError {
    /// Server replied all zeros: no version overlap
    VersionNegotiationFailed,

    /// Server reply did not name a supported version
    UnexpectedReply([u8; 4]),
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::VersionNegotiationFailed => {
                write!(f, "server supports none of the proposed Bolt versions")
            }
            HandshakeError::UnexpectedReply(bytes) => {
                write!(f, "unexpected handshake reply: {:02X?}", bytes)
            }
        }
    }
}

impl std::error::Error for HandshakeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_error_display() {
        let err = HandshakeError::VersionNegotiationFailed;
        assert!(err.to_string().contains("none of the proposed"));

        let err = HandshakeError::UnexpectedReply([0, 0, 9, 9]);
        assert!(err.to_string().contains("unexpected handshake reply"));
    }

    #[test]
    fn test_bolt_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let bolt_err: BoltError = io_err.into();
        assert!(matches!(bolt_err, BoltError::Io(_)));
    }

    #[test]
    fn test_bolt_error_from_handshake() {
        let bolt_err: BoltError = HandshakeError::VersionNegotiationFailed.into();
        assert!(matches!(bolt_err, BoltError::Handshake(_)));
    }

    #[test]
    fn test_bolt_error_from_packstream() {
        let bolt_err: BoltError = PackStreamError::InvalidMapKey.into();
        assert!(matches!(bolt_err, BoltError::PackStream(_)));
    }

    #[test]
    fn test_message_too_large_display() {
        let err = BoltError::MessageTooLarge { size: 10, max: 5 };
        assert!(err.to_string().contains("10 bytes (max 5)"));
    }
}
