//! Driver error types.

use thiserror::Error;

use crate::bolt::BoltError;

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors surfaced by the public driver API.
#[derive(Error, Debug)]
pub enum DriverError {
    /// TCP connect failed, the peer reset the link, or EOF arrived
    /// mid-message.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Version negotiation failed or the server's handshake reply was
    /// malformed.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// The server rejected HELLO or LOGON.
    #[error("authentication failed: {code}: {message}")]
    AuthFailed {
        /// Server error code
        code: String,
        /// Server error message
        message: String,
    },

    /// Illegal state transition, unexpected message, malformed frame or
    /// PackStream payload.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server answered a RUN/PULL cycle with FAILURE.
    #[error("query failed: {code}: {message}")]
    QueryFailed {
        /// Server error code
        code: String,
        /// Server error message
        message: String,
    },

    /// A transport read or write exceeded the configured limit.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Checkout timed out with no available worker.
    #[error("pool exhausted: {0}")]
    PoolExhausted(String),

    /// The pool has been shut down.
    #[error("pool closed")]
    PoolClosed,

    /// Unsupported URI scheme, bad option, or a value that cannot be
    /// encoded.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The scoped work failed and the subsequent rollback failed too. The
    /// original error is `source`; the rollback error rides along without
    /// masking it.
    #[error("{source} (rollback also failed: {rollback})")]
    RollbackFailure {
        /// The error that triggered the rollback
        source: Box<DriverError>,
        /// The error the rollback itself produced
        rollback: Box<DriverError>,
    },
}

impl DriverError {
    /// Check whether a retry from the caller might succeed.
    ///
    /// The driver itself never retries; this is a hint for caller-side
    /// retry policies.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed(_) | Self::Timeout(_) | Self::PoolExhausted(_) => true,
            Self::QueryFailed { code, .. } => {
                code.starts_with("Neo.TransientError")
                    || code == "Neo.ClientError.Cluster.NotALeader"
            }
            Self::RollbackFailure { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// The server error code, for query and authentication failures.
    pub fn server_code(&self) -> Option<&str> {
        match self {
            Self::QueryFailed { code, .. } | Self::AuthFailed { code, .. } => Some(code),
            Self::RollbackFailure { source, .. } => source.server_code(),
            _ => None,
        }
    }
}

impl From<BoltError> for DriverError {
    fn from(err: BoltError) -> Self {
        match err {
            BoltError::Io(e) => DriverError::ConnectionFailed(e.to_string()),
            BoltError::Handshake(e) => DriverError::HandshakeFailed(e.to_string()),
            BoltError::PackStream(e) => DriverError::Protocol(format!("PackStream: {}", e)),
            BoltError::Protocol(msg) => DriverError::Protocol(msg),
            BoltError::MessageTooLarge { size, max } => {
                DriverError::Protocol(format!("message too large: {} bytes (max {})", size, max))
            }
            BoltError::Timeout => DriverError::Timeout("transport operation timed out".into()),
            BoltError::ConnectionClosed => {
                DriverError::ConnectionFailed("connection closed by peer".into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = DriverError::ConnectionFailed("refused".into());
        assert_eq!(err.to_string(), "connection failed: refused");

        let err = DriverError::QueryFailed {
            code: "Neo.ClientError.Statement.SyntaxError".into(),
            message: "bad syntax".into(),
        };
        assert!(err.to_string().contains("SyntaxError"));
        assert!(err.to_string().contains("bad syntax"));
    }

    #[test]
    fn test_retryable() {
        assert!(DriverError::ConnectionFailed("x".into()).is_retryable());
        assert!(DriverError::Timeout("x".into()).is_retryable());
        assert!(DriverError::PoolExhausted("x".into()).is_retryable());

        assert!(DriverError::QueryFailed {
            code: "Neo.TransientError.Transaction.DeadlockDetected".into(),
            message: String::new(),
        }
        .is_retryable());

        assert!(!DriverError::QueryFailed {
            code: "Neo.ClientError.Statement.SyntaxError".into(),
            message: String::new(),
        }
        .is_retryable());

        assert!(!DriverError::AuthFailed {
            code: "Neo.ClientError.Security.Unauthorized".into(),
            message: String::new(),
        }
        .is_retryable());
    }

    #[test]
    fn test_rollback_failure_keeps_original() {
        let original = DriverError::QueryFailed {
            code: "Neo.TransientError.General.TransactionOutOfMemoryError".into(),
            message: "boom".into(),
        };
        let err = DriverError::RollbackFailure {
            source: Box::new(original),
            rollback: Box::new(DriverError::ConnectionFailed("gone".into())),
        };

        // The original error drives classification and stays visible.
        assert!(err.is_retryable());
        assert!(err.server_code().unwrap().starts_with("Neo.TransientError"));
        let display = err.to_string();
        assert!(display.contains("boom"));
        assert!(display.contains("rollback also failed"));
    }

    #[test]
    fn test_from_bolt_error() {
        let err: DriverError = BoltError::Timeout.into();
        assert!(matches!(err, DriverError::Timeout(_)));

        let err: DriverError = BoltError::ConnectionClosed.into();
        assert!(matches!(err, DriverError::ConnectionFailed(_)));

        let err: DriverError = BoltError::Protocol("junk".into()).into();
        assert!(matches!(err, DriverError::Protocol(_)));
    }
}
