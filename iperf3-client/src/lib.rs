//! # iperf3-client
//!
//! A wire-compatible iperf3 client implementation in Rust.
//!
//! Negotiates with any standard iperf3 server over the control channel,
//! drives one or more parallel data streams with token-bucket pacing, and
//! reports throughput.
//!
//! ## Example
//!
//! ```no_run
//! use iperf3_client::{run_test, Iperf3ClientConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Iperf3ClientConfig {
//!         target_host: "iperf.example.com".to_string(),
//!         ..Iperf3ClientConfig::default()
//!     };
//!     let report = run_test(&config).await.unwrap();
//!     println!("{:.2} Mbps", report.bandwidth_mbps);
//! }
//! ```

pub mod client;
pub mod control;
pub mod cookie;
pub mod dataplane;
pub mod error;
pub mod framing;
pub mod protocol;
pub mod session_state;

pub use client::{run_test, Iperf3ClientConfig, Iperf3Report};
pub use error::Iperf3Error;
pub use protocol::Protocol;
