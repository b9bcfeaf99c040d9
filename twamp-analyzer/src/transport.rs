//! The TWAMP session transport: an abstraction over the control-connection
//! setup, probe scheduling, and reflector exchange that produces the probe
//! sequence the analyzer consumes. Out of scope per this crate's contract
//! (see the crate-level docs); only the trait boundary lives here.

use async_trait::async_trait;

use crate::error::Result;
use crate::probe::ProbeRecord;

/// Parameters for one TWAMP measurement run.
#[derive(Debug, Clone)]
pub struct TwampSessionParams {
    pub target_host: String,
    pub target_port: u16,
    pub probe_count: u32,
    pub padding_bytes: u32,
}

/// Executes a TWAMP-Test session against a reflector and yields one
/// [`ProbeRecord`] per probe sent, in send order.
#[async_trait]
pub trait TwampSessionTransport: Send + Sync {
    async fn run_session(&self, params: &TwampSessionParams) -> Result<Vec<ProbeRecord>>;
}
