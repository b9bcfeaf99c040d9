//! Error types for the TWAMP analyzer.

use thiserror::Error;

/// Errors that can occur while running a TWAMP measurement.
#[derive(Error, Debug)]
pub enum TwampError {
    /// The underlying TWAMP session transport failed (connect, control
    /// handshake, or a probe exchange).
    #[error("TWAMP transport error: {0}")]
    Transport(String),

    /// A measurement request parameter was invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type for TWAMP analyzer operations.
pub type Result<T> = std::result::Result<T, TwampError>;
