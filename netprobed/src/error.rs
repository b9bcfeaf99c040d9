//! Error translation at the dispatcher boundary: every classified error from
//! either measurement core collapses to an HTTP-like status code and a
//! human-readable message (spec.md §7).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Iperf3(#[from] iperf3_client::Iperf3Error),

    #[error(transparent)]
    Twamp(#[from] twamp_analyzer::TwampError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// 400 for malformed input, 500 for measurement failures, per spec.md §7.
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::BadRequest(_) => 400,
            DispatchError::Iperf3(_) | DispatchError::Twamp(_) | DispatchError::Internal(_) => 500,
        }
    }
}
