//! End-to-end analyzer tests against a fake session transport.

use async_trait::async_trait;
use twamp_analyzer::error::Result;
use twamp_analyzer::probe::{ProbeRecord, TwampTimestamp};
use twamp_analyzer::transport::{TwampSessionParams, TwampSessionTransport};
use twamp_analyzer::{analyze, ClockProbe, StubClockProbe};

struct FakeTransport {
    probes: Vec<ProbeRecord>,
}

#[async_trait]
impl TwampSessionTransport for FakeTransport {
    async fn run_session(&self, _params: &TwampSessionParams) -> Result<Vec<ProbeRecord>> {
        Ok(self.probes.clone())
    }
}

fn probe(t1: i128, f: i128, u: i128, r: i128) -> ProbeRecord {
    let t1 = TwampTimestamp(t1);
    let t2 = TwampTimestamp(t1.as_nanos() + f);
    let t3 = TwampTimestamp(t2.as_nanos() + u);
    let t4 = TwampTimestamp(t3.as_nanos() + r);
    ProbeRecord {
        sender_timestamp: t1,
        reflector_receive_timestamp: t2,
        reflector_send_timestamp: t3,
        sender_receive_timestamp: t4,
        sender_error_estimate: 0x8001,
        reflector_error_estimate: 0x8A01,
        sender_ttl: 250,
        received_ttl: 60,
        lost: false,
    }
}

#[tokio::test]
async fn transport_probes_flow_into_a_result_document() {
    let transport = FakeTransport {
        probes: vec![
            probe(0, 5_000_000, 500_000, 5_000_000),
            probe(1_000_000, 5_200_000, 500_000, 4_800_000),
            ProbeRecord::lost(0, 0),
        ],
    };

    let params = TwampSessionParams {
        target_host: "reflector.example".into(),
        target_port: 862,
        probe_count: 3,
        padding_bytes: 0,
    };

    let probes = transport.run_session(&params).await.unwrap();
    let clock = StubClockProbe.query().await;
    let result = analyze(&probes, params.probe_count, clock, "reflector.example", "127.0.0.1:0", "reflector.example:862");

    assert_eq!(result.probes, 3);
    assert_eq!(result.probes_valid, 2);
    assert_eq!(result.probes_lost, 1);
    assert!((result.loss_percent - (1.0 / 3.0 * 100.0)).abs() < 1e-9);
    assert!(result.rtt_avg_ms > 0.0);
    assert!(!result.sync_status.sender_synced);
    assert!(result.sync_status.reflector_synced);
    assert!(!result.sync_status.both_synced);
}
