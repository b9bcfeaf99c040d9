//! The client-side session lifecycle, as a tagged variant rather than
//! free-form integer comparisons (see spec.md §9 "State machine as tagged
//! variant").

use crate::error::{Iperf3Error, Result};
use crate::protocol::WireState;

/// Lifecycle states of a single iperf3 client session (spec.md §3's Data Model).
///
/// State only ever advances along this sequence; any unexpected wire byte
/// transitions the session to `Failed` with a classified error instead of
/// silently staying put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    ParamExchange,
    CreateStreams,
    TestStart,
    TestRunning,
    TestEnd,
    ExchangeResults,
    DisplayResults,
    Done,
    Failed,
}

impl SessionState {
    /// Validate a wire byte observed while in `self`, and return the next
    /// session state. `expected` is the `WireState` that would have advanced
    /// the session; a mismatch classifies into `Iperf3Error::Protocol` (or
    /// the specific access-denied / server-error variants) without
    /// advancing.
    pub fn advance_on(self, observed_byte: u8, expected: WireState) -> Result<SessionState> {
        let observed = WireState::from_byte(observed_byte);

        match observed {
            Some(WireState::AccessDenied) => return Err(Iperf3Error::AccessDenied),
            Some(WireState::ServerError) => return Err(Iperf3Error::ServerError),
            _ => {}
        }

        if observed == Some(expected) {
            Ok(self.next_after(expected))
        } else {
            Err(Iperf3Error::protocol(
                "unexpected control-channel state",
                observed.map(|s| s as i8),
                Some(expected as i8),
            ))
        }
    }

    fn next_after(self, wire: WireState) -> SessionState {
        match (self, wire) {
            (SessionState::ParamExchange, WireState::ParamExchange) => SessionState::CreateStreams,
            (SessionState::CreateStreams, WireState::CreateStreams) => SessionState::TestStart,
            (SessionState::TestStart, WireState::TestStart) => SessionState::TestRunning,
            (SessionState::TestRunning, WireState::TestRunning) => SessionState::TestRunning,
            (SessionState::TestEnd, WireState::ExchangeResults) => SessionState::ExchangeResults,
            (SessionState::ExchangeResults, WireState::DisplayResults) => SessionState::DisplayResults,
            _ => SessionState::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_advances_in_sequence() {
        let s = SessionState::ParamExchange;
        let s = s.advance_on(WireState::ParamExchange.to_byte(), WireState::ParamExchange).unwrap();
        assert_eq!(s, SessionState::CreateStreams);

        let s = s.advance_on(WireState::CreateStreams.to_byte(), WireState::CreateStreams).unwrap();
        assert_eq!(s, SessionState::TestStart);

        let s = s.advance_on(WireState::TestStart.to_byte(), WireState::TestStart).unwrap();
        assert_eq!(s, SessionState::TestRunning);

        let s = s.advance_on(WireState::TestRunning.to_byte(), WireState::TestRunning).unwrap();
        assert_eq!(s, SessionState::TestRunning);
    }

    #[test]
    fn access_denied_is_classified() {
        let s = SessionState::ParamExchange;
        let err = s.advance_on(WireState::AccessDenied.to_byte(), WireState::ParamExchange).unwrap_err();
        assert!(matches!(err, Iperf3Error::AccessDenied));
    }

    #[test]
    fn server_error_is_classified() {
        let s = SessionState::ParamExchange;
        let err = s.advance_on(WireState::ServerError.to_byte(), WireState::ParamExchange).unwrap_err();
        assert!(matches!(err, Iperf3Error::ServerError));
    }

    #[test]
    fn unexpected_byte_fails_with_observed_and_expected() {
        let s = SessionState::CreateStreams;
        let err = s.advance_on(WireState::DisplayResults.to_byte(), WireState::CreateStreams).unwrap_err();
        match err {
            Iperf3Error::Protocol { observed, expected, .. } => {
                assert_eq!(observed, Some(WireState::DisplayResults as i8));
                assert_eq!(expected, Some(WireState::CreateStreams as i8));
            }
            other => panic!("expected Protocol error, got {other:?}"),
        }
    }
}
