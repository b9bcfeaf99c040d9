//! Validates requests, applies defaults, invokes the right measurement
//! core, and renders the result envelope. The only component permitted to
//! hold request-timeout policy (spec.md §4.6).

use std::time::Duration;

use tracing::{error, info};

use iperf3_client::{Iperf3ClientConfig, Iperf3Error};
use twamp_analyzer::clock::ClockProbe;
use twamp_analyzer::transport::{TwampSessionParams, TwampSessionTransport};
use twamp_analyzer::{analyze, TwampResult};

use crate::error::DispatchError;
use crate::request::{Iperf3Request, TwampRequest};
use crate::response::Iperf3Document;

/// Request-level timeout: measurements must complete well inside this or
/// the dispatcher cancels them, per spec.md §5's cancellation model.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub async fn dispatch_iperf3(request: Iperf3Request) -> Result<Iperf3Document, DispatchError> {
    if request.target_host.trim().is_empty() {
        return Err(DispatchError::BadRequest("targetHost is required".into()));
    }
    if request.parallel_streams == 0 {
        return Err(DispatchError::BadRequest("parallelStreams must be at least 1".into()));
    }

    let config = Iperf3ClientConfig {
        target_host: request.target_host.clone(),
        target_port: request.target_port,
        duration_secs: request.duration_seconds,
        parallel_streams: request.parallel_streams,
        protocol: request.protocol.into(),
        reverse: request.reverse,
        bandwidth_bps: request.bandwidth_mbps * 1_000_000,
    };

    info!(target = %config.target_host, port = config.target_port, "dispatching iperf3 request");

    let result = tokio::time::timeout(REQUEST_TIMEOUT, iperf3_client::run_test(&config)).await;
    match result {
        Ok(Ok(report)) => Ok(report.into()),
        Ok(Err(err)) => {
            error!(error = %err, "iperf3 request failed");
            Err(classify_iperf3_error(err))
        }
        Err(_) => Err(DispatchError::Internal(format!(
            "iperf3 request to {}:{} exceeded the {}s request timeout",
            config.target_host,
            config.target_port,
            REQUEST_TIMEOUT.as_secs()
        ))),
    }
}

fn classify_iperf3_error(err: Iperf3Error) -> DispatchError {
    DispatchError::Iperf3(err)
}

/// Dispatch a TWAMP request. `transport` executes the probe session;
/// `clock` is queried once, up front, for the sender's clock-quality
/// reading (spec.md §4.3: authoritative over anything the sender
/// self-reported in its own Error Estimate field).
pub async fn dispatch_twamp(
    request: TwampRequest,
    transport: &dyn TwampSessionTransport,
    clock: &dyn ClockProbe,
) -> Result<TwampResult, DispatchError> {
    if request.target_host.trim().is_empty() {
        return Err(DispatchError::BadRequest("targetHost is required".into()));
    }

    let params = TwampSessionParams {
        target_host: request.target_host.clone(),
        target_port: request.target_port,
        probe_count: request.probe_count,
        padding_bytes: request.padding_bytes,
    };

    info!(target = %params.target_host, port = params.target_port, probes = params.probe_count, "dispatching TWAMP request");

    let sender_clock = clock.query().await;

    let probes = tokio::time::timeout(REQUEST_TIMEOUT, transport.run_session(&params))
        .await
        .map_err(|_| {
            DispatchError::Internal(format!(
                "TWAMP session to {}:{} exceeded the {}s request timeout",
                params.target_host,
                params.target_port,
                REQUEST_TIMEOUT.as_secs()
            ))
        })?
        .map_err(DispatchError::Twamp)?;

    let remote_endpoint = format!("{}:{}", params.target_host, params.target_port);
    let result = analyze(
        &probes,
        params.probe_count,
        sender_clock,
        params.target_host.clone(),
        "local",
        remote_endpoint,
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_target_host_is_a_bad_request() {
        let request = Iperf3Request {
            target_host: "".into(),
            target_port: 5201,
            duration_seconds: 5,
            parallel_streams: 1,
            protocol: Default::default(),
            reverse: false,
            bandwidth_mbps: 100,
        };
        let err = dispatch_iperf3(request).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn zero_parallel_streams_is_a_bad_request() {
        let request = Iperf3Request {
            target_host: "h".into(),
            target_port: 5201,
            duration_seconds: 5,
            parallel_streams: 0,
            protocol: Default::default(),
            reverse: false,
            bandwidth_mbps: 100,
        };
        let err = dispatch_iperf3(request).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
