//! iperf3 wire protocol definitions: state bytes, parameter JSON, framing.
//!
//! The iperf3 protocol uses a control connection (TCP) and one or more
//! data streams (TCP or UDP). Control messages are either a single state
//! byte, or a JSON object with a 4-byte big-endian length prefix.

use serde::{Deserialize, Serialize};

/// Wire-level state bytes read from / written to the control connection.
///
/// Values match the real iperf3 protocol so this client interoperates with
/// any standard iperf3 server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum WireState {
    TestStart = 1,
    TestRunning = 2,
    TestEnd = 4,
    ParamExchange = 9,
    CreateStreams = 10,
    ExchangeResults = 13,
    DisplayResults = 14,
    IperfDone = 16,
    AccessDenied = -1,
    ServerError = -2,
}

impl WireState {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b as i8 {
            1 => Some(WireState::TestStart),
            2 => Some(WireState::TestRunning),
            4 => Some(WireState::TestEnd),
            9 => Some(WireState::ParamExchange),
            10 => Some(WireState::CreateStreams),
            13 => Some(WireState::ExchangeResults),
            14 => Some(WireState::DisplayResults),
            16 => Some(WireState::IperfDone),
            -1 => Some(WireState::AccessDenied),
            -2 => Some(WireState::ServerError),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        (self as i8) as u8
    }
}

/// Test protocol requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Default for Protocol {
    fn default() -> Self {
        Protocol::Tcp
    }
}

/// TCP block size used when the test protocol is TCP.
pub const TCP_BLOCK_SIZE: u32 = 128 * 1024;
/// UDP block size used when the test protocol is UDP (one iperf3 UDP datagram payload).
pub const UDP_BLOCK_SIZE: u32 = 1460;

/// Parameters sent to the server during PARAM_EXCHANGE, per spec.md §4.4.
#[derive(Debug, Clone, Serialize)]
pub struct TestParameters {
    pub tcp: bool,
    pub udp: bool,
    pub omit: u32,
    pub time: u64,
    pub num: u32,
    pub blockcount: u32,
    pub parallel: u32,
    pub len: u32,
    pub pacing_timer: u32,
    pub client_version: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reverse: bool,
}

impl TestParameters {
    pub fn for_test(protocol: Protocol, duration_secs: u64, parallel_streams: u32, reverse: bool) -> Self {
        let (tcp, udp, len) = match protocol {
            Protocol::Tcp => (true, false, TCP_BLOCK_SIZE),
            Protocol::Udp => (false, true, UDP_BLOCK_SIZE),
        };
        TestParameters {
            tcp,
            udp,
            omit: 0,
            time: duration_secs,
            num: 0,
            blockcount: 0,
            parallel: parallel_streams,
            len,
            pacing_timer: 1000,
            client_version: "3.16".to_string(),
            reverse,
        }
    }

    pub fn block_size(&self) -> usize {
        self.len as usize
    }
}

/// Cookie length: 36 base32 characters followed by one NUL byte.
pub const COOKIE_SIZE: usize = 37;

/// Maximum accepted length of an incoming framed JSON payload (1 MiB).
pub const MAX_FRAME_LEN: u32 = 1024 * 1024;
