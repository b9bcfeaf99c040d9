//! The per-probe record produced by a TWAMP session transport, and the
//! timestamp type used throughout the analyzer's hot loop.

use std::ops::Sub;

/// An opaque point in time, expressed as nanoseconds since a transport-chosen
/// epoch. Probe math only ever needs differences between timestamps taken by
/// the same transport, so there is no need to carry a wall-clock epoch or
/// risk a fallible `SystemTime` subtraction per probe; `i128` keeps
/// nanosecond-resolution differences exact and free of overflow for any
/// realistic probe spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TwampTimestamp(pub i128);

impl TwampTimestamp {
    pub fn from_nanos(nanos: i128) -> Self {
        TwampTimestamp(nanos)
    }

    pub fn as_nanos(self) -> i128 {
        self.0
    }
}

impl Sub for TwampTimestamp {
    type Output = DurationNanos;

    fn sub(self, rhs: Self) -> Self::Output {
        DurationNanos(self.0 - rhs.0)
    }
}

/// A signed duration in nanoseconds, the result of subtracting two
/// [`TwampTimestamp`]s. Signed because reflector turnaround, IPDV, and
/// offset estimates can all be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DurationNanos(pub i128);

impl DurationNanos {
    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn as_nanos(self) -> i128 {
        self.0
    }
}

impl std::ops::Add for DurationNanos {
    type Output = DurationNanos;
    fn add(self, rhs: Self) -> Self::Output {
        DurationNanos(self.0 + rhs.0)
    }
}

impl std::ops::Sub for DurationNanos {
    type Output = DurationNanos;
    fn sub(self, rhs: Self) -> Self::Output {
        DurationNanos(self.0 - rhs.0)
    }
}

impl std::ops::Div<i128> for DurationNanos {
    type Output = DurationNanos;
    fn div(self, rhs: i128) -> Self::Output {
        DurationNanos(self.0 / rhs)
    }
}

impl std::ops::Neg for DurationNanos {
    type Output = DurationNanos;
    fn neg(self) -> Self::Output {
        DurationNanos(-self.0)
    }
}

/// One TWAMP-Test probe, as produced by the session transport.
///
/// `lost` is true when T4 never arrived; lost records contribute only to
/// the loss count and carry no meaningful timestamps.
#[derive(Debug, Clone, Copy)]
pub struct ProbeRecord {
    pub sender_timestamp: TwampTimestamp,
    pub reflector_receive_timestamp: TwampTimestamp,
    pub reflector_send_timestamp: TwampTimestamp,
    pub sender_receive_timestamp: TwampTimestamp,
    pub sender_error_estimate: u16,
    pub reflector_error_estimate: u16,
    pub sender_ttl: u8,
    pub received_ttl: u8,
    pub lost: bool,
}

impl ProbeRecord {
    pub fn lost(sender_error_estimate: u16, reflector_error_estimate: u16) -> Self {
        ProbeRecord {
            sender_timestamp: TwampTimestamp(0),
            reflector_receive_timestamp: TwampTimestamp(0),
            reflector_send_timestamp: TwampTimestamp(0),
            sender_receive_timestamp: TwampTimestamp(0),
            sender_error_estimate,
            reflector_error_estimate,
            sender_ttl: 0,
            received_ttl: 0,
            lost: true,
        }
    }
}
