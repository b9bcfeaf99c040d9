//! Measurement request envelopes (spec.md §6's External Interfaces).

use serde::Deserialize;

use iperf3_client::Protocol;

fn default_iperf3_port() -> u16 { 5201 }
fn default_twamp_port() -> u16 { 862 }
fn default_duration_seconds() -> u64 { 5 }
fn default_parallel_streams() -> u32 { 1 }
fn default_bandwidth_mbps() -> u64 { 100 }
fn default_probe_count() -> u32 { 10 }

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestProtocol {
    Tcp,
    Udp,
}

impl From<RequestProtocol> for Protocol {
    fn from(value: RequestProtocol) -> Self {
        match value {
            RequestProtocol::Tcp => Protocol::Tcp,
            RequestProtocol::Udp => Protocol::Udp,
        }
    }
}

impl Default for RequestProtocol {
    fn default() -> Self { RequestProtocol::Tcp }
}

/// `POST /measurements/iperf3` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct Iperf3Request {
    pub target_host: String,
    #[serde(default = "default_iperf3_port")]
    pub target_port: u16,
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: u64,
    #[serde(default = "default_parallel_streams")]
    pub parallel_streams: u32,
    #[serde(default)]
    pub protocol: RequestProtocol,
    #[serde(default)]
    pub reverse: bool,
    #[serde(default = "default_bandwidth_mbps")]
    pub bandwidth_mbps: u64,
}

/// `POST /measurements/twamp` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct TwampRequest {
    pub target_host: String,
    #[serde(default = "default_twamp_port")]
    pub target_port: u16,
    #[serde(default = "default_probe_count")]
    pub probe_count: u32,
    #[serde(default)]
    pub padding_bytes: u32,
}
