//! Top-level iperf3 client: orchestrates the control channel and data plane
//! for one complete test run.

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::control::ControlChannel;
use crate::dataplane::{bandwidth_mbps, open_data_streams, run_receivers, run_senders};
use crate::error::{Iperf3Error, Result};
use crate::protocol::Protocol;

/// Configuration for one iperf3 test run.
#[derive(Debug, Clone)]
pub struct Iperf3ClientConfig {
    pub target_host: String,
    pub target_port: u16,
    pub duration_secs: u64,
    pub parallel_streams: u32,
    pub protocol: Protocol,
    pub reverse: bool,
    pub bandwidth_bps: u64,
}

impl Default for Iperf3ClientConfig {
    fn default() -> Self {
        Iperf3ClientConfig {
            target_host: String::new(),
            target_port: 5201,
            duration_secs: 5,
            parallel_streams: 1,
            protocol: Protocol::Tcp,
            reverse: false,
            bandwidth_bps: 100_000_000,
        }
    }
}

/// Result of an iperf3 run, in the shape of the external success document
/// (spec.md §6).
#[derive(Debug, Clone)]
pub struct Iperf3Report {
    pub server: String,
    pub port: u16,
    pub protocol: Protocol,
    pub duration_sec: f64,
    pub bandwidth_mbps: f64,
    pub sent_bytes: Option<u64>,
    pub received_bytes: Option<u64>,
}

/// Run one complete iperf3 test against `config.target_host:target_port`.
pub async fn run_test(config: &Iperf3ClientConfig) -> Result<Iperf3Report> {
    if config.target_host.is_empty() {
        return Err(Iperf3Error::InvalidParameter("targetHost is required".into()));
    }
    if config.parallel_streams == 0 {
        return Err(Iperf3Error::InvalidParameter("parallelStreams must be at least 1".into()));
    }

    let addr = resolve(&config.target_host, config.target_port)?;

    let mut control = ControlChannel::connect(addr).await?;
    info!(server = %config.target_host, port = config.target_port, "connected to iperf3 server");

    control
        .exchange_parameters(config.protocol, config.duration_secs, config.parallel_streams, config.reverse)
        .await?;
    control.await_create_streams().await?;

    let udp = matches!(config.protocol, Protocol::Udp);
    let block_size = crate::protocol::TestParameters::for_test(
        config.protocol,
        config.duration_secs,
        config.parallel_streams,
        config.reverse,
    )
    .block_size();

    let streams = open_data_streams(addr, config.parallel_streams, udp, control.cookie).await?;
    debug!(count = streams.len(), "data streams opened");

    control.await_test_start().await?;
    control.await_test_running().await?;

    let test_start = Instant::now();
    let deadline = test_start + Duration::from_secs(config.duration_secs);

    let totals = if config.reverse {
        run_receivers(streams, block_size, deadline).await
    } else {
        run_senders(streams, block_size, config.bandwidth_bps, deadline).await
    };

    let actual_duration = test_start.elapsed();

    control.send_test_end().await?;
    control.exchange_results().await?;
    control.finish().await?;

    let total_bytes = totals.total_bytes();
    let report = Iperf3Report {
        server: config.target_host.clone(),
        port: config.target_port,
        protocol: config.protocol,
        duration_sec: actual_duration.as_secs_f64(),
        bandwidth_mbps: bandwidth_mbps(total_bytes, actual_duration),
        sent_bytes: if config.reverse { None } else { Some(total_bytes) },
        received_bytes: if config.reverse { Some(total_bytes) } else { None },
    };

    info!(
        bandwidth_mbps = report.bandwidth_mbps,
        total_bytes, "iperf3 test complete"
    );
    Ok(report)
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .map_err(|source| Iperf3Error::Connect {
            host: host.to_string(),
            port,
            source,
        })?
        .next()
        .ok_or_else(|| Iperf3Error::InvalidParameter(format!("could not resolve host {host}")))
}
