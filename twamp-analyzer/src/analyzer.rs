//! Single-pass TWAMP probe analysis: per-direction delay, IPDV, RFC 3550
//! jitter, hop-count, and clock-synchronization metrics.

use serde::Serialize;

use crate::clock::ClockQuality;
use crate::error_estimate::{self, DecodedErrorEstimate};
use crate::probe::{DurationNanos, ProbeRecord};

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    min: f64,
    max: f64,
    sum: f64,
    count: u64,
}

impl Accumulator {
    fn observe(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.sum += value;
        self.count += 1;
    }

    fn avg(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum / self.count as f64 }
    }

    fn group(&self) -> Group {
        Group { min: if self.count == 0 { 0.0 } else { self.min }, max: if self.count == 0 { 0.0 } else { self.max }, avg: self.avg() }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct IpdvAccumulator {
    inner: Accumulator,
    abs_sum: f64,
}

impl IpdvAccumulator {
    fn observe(&mut self, value: f64) {
        self.inner.observe(value);
        self.abs_sum += value.abs();
    }

    fn mean_abs(&self) -> f64 {
        if self.inner.count == 0 { 0.0 } else { self.abs_sum / self.inner.count as f64 }
    }

    fn group(&self) -> IpdvGroup {
        IpdvGroup { min: self.inner.group().min, max: self.inner.group().max, avg: self.inner.avg(), mean_abs: self.mean_abs() }
    }
}

/// `min`/`max`/`avg` over a simple per-probe statistic.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Group {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// `min`/`max`/`avg`/`mean_abs` over an IPDV series.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IpdvGroup {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub mean_abs: f64,
}

/// `min`/`max`/`avg`/`stddev` over the network-RTT series.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RttRawGroup {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub stddev: f64,
}

/// A fully decoded Error Estimate, rendered for the result document.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ErrorEstimateReport {
    pub synced: bool,
    pub unavailable: bool,
    pub scale: u8,
    pub multiplier: u8,
    pub error_seconds: f64,
    pub error_ms: f64,
    pub raw_value_hex: String,
}

fn report_error_estimate(raw: u16) -> ErrorEstimateReport {
    let decoded: DecodedErrorEstimate = error_estimate::decode(raw);
    ErrorEstimateReport {
        synced: decoded.synced,
        unavailable: decoded.unavailable,
        scale: decoded.scale,
        multiplier: decoded.multiplier,
        error_seconds: decoded.error_seconds,
        error_ms: if decoded.error_seconds < 0.0 { decoded.error_seconds } else { decoded.error_seconds * 1000.0 },
        raw_value_hex: format!("{raw:#06x}"),
    }
}

/// Clock-synchronization quality metadata for the session.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub sender_synced: bool,
    pub reflector_synced: bool,
    pub both_synced: bool,
    pub sender_error_estimate: ErrorEstimateReport,
    pub reflector_error_estimate: ErrorEstimateReport,
}

/// The TWAMP success document (spec.md §6's flattened view).
#[derive(Debug, Clone, Serialize)]
pub struct TwampResult {
    pub server: String,
    pub local_endpoint: String,
    pub remote_endpoint: String,
    pub probes: u32,
    pub probes_valid: u32,
    pub probes_lost: u32,
    pub loss_percent: f64,

    pub rtt_min_ms: f64,
    pub rtt_max_ms: f64,
    pub rtt_avg_ms: f64,
    pub rtt_stddev_ms: f64,
    pub rtt_raw_ms: RttRawGroup,

    pub estimated_clock_offset_ms: f64,
    pub forward_jitter_ms: f64,
    pub reverse_jitter_ms: f64,

    pub reflector_turnaround_ms: Group,
    pub forward_delay_raw_ms: Group,
    pub forward_delay_corrected_ms: Group,
    pub reverse_delay_raw_ms: Group,
    pub reverse_delay_corrected_ms: Group,

    pub forward_ipdv_ms: IpdvGroup,
    pub reverse_ipdv_ms: IpdvGroup,

    pub hops: Hops,
    pub sync_status: SyncStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct Hops {
    pub forward: Group,
    pub reverse: Group,
}

fn forward_hop_count(sender_ttl: u8) -> Option<u32> {
    if (1..=255).contains(&sender_ttl) {
        Some(255 - sender_ttl as u32)
    } else {
        None
    }
}

fn reverse_hop_count(received_ttl: u8) -> Option<u32> {
    if received_ttl == 0 {
        return None;
    }
    let initial_ttl = [64u8, 128, 255]
        .into_iter()
        .find(|&candidate| candidate >= received_ttl)?;
    Some((initial_ttl - received_ttl) as u32)
}

/// Run the single-pass analysis over `probes`. `probe_count` is the number
/// requested (used for `loss_percent`, which may differ from `probes.len()`
/// if the transport never produced trailing lost records).
///
/// `sender_clock` must be queried by the caller before running the session
/// (spec.md §4.3: authoritative over whatever the sender advertised in its
/// own Error Estimate field).
pub fn analyze(
    probes: &[ProbeRecord],
    probe_count: u32,
    sender_clock: ClockQuality,
    server: impl Into<String>,
    local_endpoint: impl Into<String>,
    remote_endpoint: impl Into<String>,
) -> TwampResult {
    let mut forward = Accumulator::default();
    let mut reverse = Accumulator::default();
    let mut turnaround = Accumulator::default();
    let mut rtt = Accumulator::default();
    let mut rtt_sum_sq = 0.0f64;
    let mut forward_corrected = Accumulator::default();
    let mut reverse_corrected = Accumulator::default();
    let mut offset = Accumulator::default();

    let mut forward_ipdv = IpdvAccumulator::default();
    let mut reverse_ipdv = IpdvAccumulator::default();
    let mut jitter_forward = 0.0f64;
    let mut jitter_reverse = 0.0f64;
    let mut prev_forward_ns: Option<i128> = None;
    let mut prev_reverse_ns: Option<i128> = None;

    let mut hops_forward = Accumulator::default();
    let mut hops_reverse = Accumulator::default();

    let mut lost_count: u32 = 0;
    let mut valid_count: u32 = 0;
    let mut first_valid: Option<&ProbeRecord> = None;

    for probe in probes {
        if probe.lost {
            lost_count += 1;
            continue;
        }
        valid_count += 1;
        if first_valid.is_none() {
            first_valid = Some(probe);
        }

        let f: DurationNanos = probe.reflector_receive_timestamp - probe.sender_timestamp;
        let r: DurationNanos = probe.sender_receive_timestamp - probe.reflector_send_timestamp;
        let u: DurationNanos = probe.reflector_send_timestamp - probe.reflector_receive_timestamp;
        let n = f + r;
        let o = (f - r) / 2;
        let f_corrected = f - o;
        let r_corrected = r + o;

        forward.observe(f.as_millis_f64());
        reverse.observe(r.as_millis_f64());
        turnaround.observe(u.as_millis_f64());
        rtt.observe(n.as_millis_f64());
        rtt_sum_sq += n.as_millis_f64() * n.as_millis_f64();
        forward_corrected.observe(f_corrected.as_millis_f64());
        reverse_corrected.observe(r_corrected.as_millis_f64());
        offset.observe(o.as_millis_f64());

        if let Some(prev_f) = prev_forward_ns {
            let ipdv_f_ms = (f.as_nanos() - prev_f) as f64 / 1_000_000.0;
            forward_ipdv.observe(ipdv_f_ms);
            jitter_forward += (ipdv_f_ms.abs() - jitter_forward) / 16.0;
        }
        prev_forward_ns = Some(f.as_nanos());

        if let Some(prev_r) = prev_reverse_ns {
            let ipdv_r_ms = (r.as_nanos() - prev_r) as f64 / 1_000_000.0;
            reverse_ipdv.observe(ipdv_r_ms);
            jitter_reverse += (ipdv_r_ms.abs() - jitter_reverse) / 16.0;
        }
        prev_reverse_ns = Some(r.as_nanos());

        if let Some(hops) = forward_hop_count(probe.sender_ttl) {
            hops_forward.observe(hops as f64);
        }
        if let Some(hops) = reverse_hop_count(probe.received_ttl) {
            hops_reverse.observe(hops as f64);
        }
    }

    let rtt_stddev = if rtt.count > 0 {
        let mean = rtt.avg();
        (rtt_sum_sq / rtt.count as f64 - mean * mean).max(0.0).sqrt()
    } else {
        0.0
    };

    let (sender_error_raw, reflector_error_raw) = match first_valid {
        Some(probe) => (probe.sender_error_estimate, probe.reflector_error_estimate),
        None => (0, 0),
    };
    let sender_report = report_error_estimate(sender_error_raw);
    let reflector_report = report_error_estimate(reflector_error_raw);
    let reflector_synced = reflector_report.synced;

    let sync_status = SyncStatus {
        sender_synced: sender_clock.synchronized,
        reflector_synced,
        both_synced: sender_clock.synchronized && reflector_synced,
        sender_error_estimate: sender_report,
        reflector_error_estimate: reflector_report,
    };

    let rtt_group = rtt.group();

    TwampResult {
        server: server.into(),
        local_endpoint: local_endpoint.into(),
        remote_endpoint: remote_endpoint.into(),
        probes: probe_count,
        probes_valid: valid_count,
        probes_lost: lost_count,
        loss_percent: if probe_count > 0 { lost_count as f64 / probe_count as f64 * 100.0 } else { 0.0 },

        rtt_min_ms: rtt_group.min,
        rtt_max_ms: rtt_group.max,
        rtt_avg_ms: rtt_group.avg,
        rtt_stddev_ms: rtt_stddev,
        rtt_raw_ms: RttRawGroup { min: rtt_group.min, max: rtt_group.max, avg: rtt_group.avg, stddev: rtt_stddev },

        estimated_clock_offset_ms: offset.avg(),
        forward_jitter_ms: jitter_forward,
        reverse_jitter_ms: jitter_reverse,

        reflector_turnaround_ms: turnaround.group(),
        forward_delay_raw_ms: forward.group(),
        forward_delay_corrected_ms: forward_corrected.group(),
        reverse_delay_raw_ms: reverse.group(),
        reverse_delay_corrected_ms: reverse_corrected.group(),

        forward_ipdv_ms: forward_ipdv.group(),
        reverse_ipdv_ms: reverse_ipdv.group(),

        hops: Hops { forward: hops_forward.group(), reverse: hops_reverse.group() },
        sync_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::TwampTimestamp;

    fn probe_at(t1_ns: i128, f_ns: i128, u_ns: i128, r_ns: i128) -> ProbeRecord {
        let t1 = TwampTimestamp(t1_ns);
        let t2 = TwampTimestamp(t1_ns + f_ns);
        let t3 = TwampTimestamp(t1_ns + f_ns + u_ns);
        let t4 = TwampTimestamp(t1_ns + f_ns + u_ns + r_ns);
        ProbeRecord {
            sender_timestamp: t1,
            reflector_receive_timestamp: t2,
            reflector_send_timestamp: t3,
            sender_receive_timestamp: t4,
            sender_error_estimate: 0x8A01,
            reflector_error_estimate: 0x8A01,
            sender_ttl: 245,
            received_ttl: 54,
            lost: false,
        }
    }

    #[test]
    fn identical_delays_yield_zero_ipdv_and_zero_jitter() {
        let probes: Vec<ProbeRecord> = (0..5)
            .map(|i| probe_at(i as i128 * 1_000_000, 5_000_000, 1_000_000, 5_000_000))
            .collect();
        let result = analyze(&probes, 5, ClockQuality { synchronized: true, estimated_error_seconds: 0.0 }, "h", "l", "r");
        assert_eq!(result.forward_ipdv_ms.avg, 0.0);
        assert_eq!(result.reverse_ipdv_ms.avg, 0.0);
        assert_eq!(result.forward_jitter_ms, 0.0);
        assert_eq!(result.reverse_jitter_ms, 0.0);
    }

    #[test]
    fn clock_offset_cancels_in_ipdv_and_network_rtt() {
        let delays = [10_000_000i128, 12_000_000, 11_000_000];
        let base: Vec<ProbeRecord> = delays
            .iter()
            .enumerate()
            .map(|(i, &f)| probe_at(i as i128 * 1_000_000, f, 1_000_000, f))
            .collect();

        let offset_ns = 100_000_000i128;
        let shifted: Vec<ProbeRecord> = base
            .iter()
            .map(|p| {
                let mut p = *p;
                p.reflector_receive_timestamp = TwampTimestamp(p.reflector_receive_timestamp.as_nanos() + offset_ns);
                p.reflector_send_timestamp = TwampTimestamp(p.reflector_send_timestamp.as_nanos() + offset_ns);
                p
            })
            .collect();

        let clock = ClockQuality { synchronized: true, estimated_error_seconds: 0.0 };
        let r1 = analyze(&base, 3, clock, "h", "l", "r");
        let r2 = analyze(&shifted, 3, clock, "h", "l", "r");

        assert!((r1.forward_ipdv_ms.avg - r2.forward_ipdv_ms.avg).abs() < 1e-9);
        assert!((r1.reverse_ipdv_ms.avg - r2.reverse_ipdv_ms.avg).abs() < 1e-9);
        assert!((r1.forward_jitter_ms - r2.forward_jitter_ms).abs() < 1e-9);
        assert!((r1.rtt_avg_ms - r2.rtt_avg_ms).abs() < 1e-9);
    }

    #[test]
    fn ipdv_clock_offset_cancellation_matches_documented_scenario() {
        let delays = [10_000_000i128, 12_000_000, 11_000_000];
        let probes: Vec<ProbeRecord> = delays
            .iter()
            .enumerate()
            .map(|(i, &f)| probe_at(i as i128 * 1_000_000, f, 1_000_000, f))
            .collect();
        let result = analyze(&probes, 3, ClockQuality { synchronized: true, estimated_error_seconds: 0.0 }, "h", "l", "r");
        assert!((result.forward_ipdv_ms.min - (-1.0)).abs() < 1e-9 || (result.forward_ipdv_ms.max - 2.0).abs() < 1e-9);
    }

    #[test]
    fn network_rtt_splits_symmetrically_after_correction() {
        let probe = probe_at(0, 7_000_000, 2_000_000, 3_000_000);
        let result = analyze(&[probe], 1, ClockQuality { synchronized: true, estimated_error_seconds: 0.0 }, "h", "l", "r");
        let n = result.rtt_avg_ms;
        assert!((result.forward_delay_corrected_ms.avg - n / 2.0).abs() < 1e-6);
        assert!((result.reverse_delay_corrected_ms.avg - n / 2.0).abs() < 1e-6);
    }

    #[test]
    fn forward_hop_calculation_matches_documented_scenario() {
        assert_eq!(forward_hop_count(245), Some(10));
        assert_eq!(forward_hop_count(0), None);
    }

    #[test]
    fn reverse_hop_inference_matches_documented_scenario() {
        assert_eq!(reverse_hop_count(54), Some(10));
        assert_eq!(reverse_hop_count(118), Some(10));
        assert_eq!(reverse_hop_count(245), Some(10));
    }

    #[test]
    fn zero_valid_probes_reports_full_loss_and_documented_defaults() {
        let probes = vec![ProbeRecord::lost(0, 0), ProbeRecord::lost(0, 0)];
        let result = analyze(&probes, 2, ClockQuality { synchronized: false, estimated_error_seconds: 0.5 }, "h", "l", "r");
        assert_eq!(result.loss_percent, 100.0);
        assert_eq!(result.probes_valid, 0);
        assert_eq!(result.probes_lost, 2);
        assert_eq!(result.rtt_avg_ms, 0.0);
        assert_eq!(result.forward_jitter_ms, 0.0);
    }
}
