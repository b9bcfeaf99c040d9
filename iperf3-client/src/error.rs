//! Error types for the iperf3 client.

use thiserror::Error;

/// Errors that can occur while running an iperf3 test.
#[derive(Error, Debug)]
pub enum Iperf3Error {
    /// IO error on the control channel or a data stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Control-channel framing or state-machine violation.
    ///
    /// `observed` and `expected` are included so the dispatcher can render
    /// "observed vs. expected state" per the propagation policy.
    #[error("protocol error: {message} (observed {observed:?}, expected {expected:?})")]
    Protocol {
        message: String,
        observed: Option<i8>,
        expected: Option<i8>,
    },

    /// Server sent ACCESS_DENIED (state byte -1).
    #[error("server denied access")]
    AccessDenied,

    /// Server sent SERVER_ERROR (state byte -2).
    #[error("server error")]
    ServerError,

    /// A measurement request parameter was invalid.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An operation did not complete within its allotted time.
    #[error("timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Failed to connect, or to open the expected number of data streams.
    #[error("connection to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for iperf3 client operations.
pub type Result<T> = std::result::Result<T, Iperf3Error>;

impl Iperf3Error {
    pub fn protocol(message: impl Into<String>, observed: Option<i8>, expected: Option<i8>) -> Self {
        Iperf3Error::Protocol {
            message: message.into(),
            observed,
            expected,
        }
    }
}
