//! # twamp-analyzer
//!
//! Client-side TWAMP (RFC 5357) result analysis: from the four canonical
//! probe timestamps and auxiliary TTL/Error-Estimate fields, computes
//! per-direction delays, an RFC 3393 IPDV series, RFC 3550 jitter,
//! clock-offset-free network RTT, hop counts, and clock-synchronization
//! quality metadata.
//!
//! The actual TWAMP-Test control handshake and probe scheduling are out of
//! scope for this crate; they're abstracted behind [`TwampSessionTransport`].

pub mod analyzer;
pub mod clock;
pub mod error;
pub mod error_estimate;
pub mod probe;
pub mod transport;

pub use analyzer::{analyze, TwampResult};
pub use clock::{ClockProbe, ClockQuality, StubClockProbe};
pub use error::TwampError;
pub use probe::{ProbeRecord, TwampTimestamp};
pub use transport::{TwampSessionParams, TwampSessionTransport};
