//! Client error types

use dashlink_protocol::{ProtocolError, Status};
use thiserror::Error;

/// Errors surfaced to callers of the session client.
///
/// Unmatched responses and unrecognized command codes are never errors;
/// the dispatcher discards them without touching any caller's handle.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No correlated response arrived within the timeout window
    #[error("no response within the timeout window")]
    Timeout,

    /// The server answered with a non-OK status code
    #[error("server rejected request: {}", status_label(.code))]
    Rejected {
        /// Raw status code from the response frame
        code: u16,
    },

    /// The profile snapshot failed to inflate
    #[error("failed to inflate profile snapshot: {0}")]
    Decompression(#[source] std::io::Error),

    /// The connection ended while the request was still pending
    #[error("connection closed with the request still pending")]
    TransportClosed,

    /// A frame arrived that cannot be decoded for its claimed type
    #[error("malformed frame: {reason}")]
    MalformedFrame {
        /// What made the frame undecodable
        reason: &'static str,
    },

    /// The server answered with a payload of the wrong shape
    #[error("unexpected reply payload: expected {0}")]
    UnexpectedReply(&'static str),

    /// A wrapped message id collided with a still-outstanding request
    #[error("message id {0} is still in flight")]
    IdInFlight(u16),

    /// Wire protocol error
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// TLS setup or handshake error
    #[error("TLS error: {0}")]
    Tls(#[from] tokio_native_tls::native_tls::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_label(code: &u16) -> String {
    match Status::from_u16(*code) {
        Some(status) => status.to_string(),
        None => format!("status {code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display_names_known_codes() {
        let err = ClientError::Rejected { code: 9 };
        assert_eq!(
            err.to_string(),
            "server rejected request: INVALID_TOKEN (9)"
        );
    }

    #[test]
    fn test_rejected_display_keeps_unknown_codes_raw() {
        let err = ClientError::Rejected { code: 404 };
        assert_eq!(err.to_string(), "server rejected request: status 404");
    }
}
