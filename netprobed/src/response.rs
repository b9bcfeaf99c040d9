//! The response envelope shared by both measurement endpoints (spec.md §6).

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope<T> {
    Ok { data: T },
    Error { error: String },
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope::Ok { data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Envelope::Error { error: message.into() }
    }
}

/// `iperf3` success document (spec.md §6). Exactly one of `sent_bytes` /
/// `received_bytes` is present, selected by the `reverse` flag.
#[derive(Debug, Clone, Serialize)]
pub struct Iperf3Document {
    pub server: String,
    pub port: u16,
    pub protocol: String,
    pub duration_sec: f64,
    pub bandwidth_mbps: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_bytes: Option<u64>,
}

impl From<iperf3_client::Iperf3Report> for Iperf3Document {
    fn from(report: iperf3_client::Iperf3Report) -> Self {
        Iperf3Document {
            server: report.server,
            port: report.port,
            protocol: match report.protocol {
                iperf3_client::Protocol::Tcp => "TCP".to_string(),
                iperf3_client::Protocol::Udp => "UDP".to_string(),
            },
            duration_sec: report.duration_sec,
            bandwidth_mbps: report.bandwidth_mbps,
            sent_bytes: report.sent_bytes,
            received_bytes: report.received_bytes,
        }
    }
}
