//! The local clock-quality probe, abstracted so the analyzer does not
//! depend on any particular OS time service.

use async_trait::async_trait;

/// A clock-quality reading: whether the local clock is synchronized to an
/// external reference, and an estimate of its error in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockQuality {
    pub synchronized: bool,
    pub estimated_error_seconds: f64,
}

/// Platform-abstracted query for local clock quality. Implementations with
/// no real time-service integration should return [`ClockProbe::fallback`].
#[async_trait]
pub trait ClockProbe: Send + Sync {
    async fn query(&self) -> ClockQuality;
}

impl dyn ClockProbe {
    /// Unsynchronized fallback: `estimated_error_seconds` of 0.5s is not a
    /// measured quantity, and the produced Error Estimate must advertise
    /// unsynchronized rather than trusting it.
    pub fn fallback() -> ClockQuality {
        ClockQuality { synchronized: false, estimated_error_seconds: 0.5 }
    }
}

/// A stub clock probe for platforms with no clock-quality integration.
/// Always returns the fallback reading.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubClockProbe;

#[async_trait]
impl ClockProbe for StubClockProbe {
    async fn query(&self) -> ClockQuality {
        <dyn ClockProbe>::fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_probe_reports_unsynchronized_fallback() {
        let probe = StubClockProbe;
        let quality = probe.query().await;
        assert!(!quality.synchronized);
        assert_eq!(quality.estimated_error_seconds, 0.5);
    }
}
