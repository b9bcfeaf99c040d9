//! iperf3 data plane: parallel send/receive workers sharing a wall-clock
//! deadline, with token-bucket pacing on the send path.

use rand::RngCore;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

use crate::error::{Iperf3Error, Result};
use crate::protocol::COOKIE_SIZE;

const STREAM_CREATE_TIMEOUT: Duration = Duration::from_secs(5);
const PACING_SLEEP_CEILING: Duration = Duration::from_millis(100);

/// A single data stream, TCP or UDP, already identified to the server by
/// cookie.
pub enum DataStream {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

/// Open `count` data connections to `addr`, sending the session cookie on
/// each (spec.md §4.4's CreateStreams action), bounded by a 5-second
/// per-stream timeout.
pub async fn open_data_streams(
    addr: SocketAddr,
    count: u32,
    udp: bool,
    cookie: [u8; COOKIE_SIZE],
) -> Result<Vec<DataStream>> {
    let mut streams = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let result = tokio::time::timeout(STREAM_CREATE_TIMEOUT, async {
            if udp {
                let socket = UdpSocket::bind("0.0.0.0:0").await?;
                socket.connect(addr).await?;
                socket.send(&cookie).await?;
                Ok::<DataStream, std::io::Error>(DataStream::Udp(socket))
            } else {
                let mut stream = TcpStream::connect(addr).await?;
                stream.write_all(&cookie).await?;
                Ok(DataStream::Tcp(stream))
            }
        })
        .await;

        match result {
            Ok(Ok(stream)) => streams.push(stream),
            Ok(Err(source)) => {
                return Err(Iperf3Error::Connect {
                    host: addr.ip().to_string(),
                    port: addr.port(),
                    source,
                });
            }
            Err(_) => return Err(Iperf3Error::Timeout(STREAM_CREATE_TIMEOUT)),
        }
    }
    Ok(streams)
}

/// Fill `buf` with pacing payload bytes. Non-cryptographic randomness is
/// fine here (unlike the cookie, this buffer has no secrecy requirement).
fn fill_payload(buf: &mut [u8]) {
    rand::thread_rng().fill_bytes(buf);
}

/// Totals accumulated across all data-plane workers for one test.
#[derive(Debug, Default)]
pub struct Totals {
    bytes: Arc<AtomicU64>,
}

impl Totals {
    pub fn new() -> Self {
        Totals { bytes: Arc::new(AtomicU64::new(0)) }
    }

    pub fn handle(&self) -> Arc<AtomicU64> {
        self.bytes.clone()
    }

    pub fn total_bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

/// Run the send-mode workers (non-reverse test): each stream writes a
/// prefilled buffer repeatedly, paced to its share of `total_bps`, until
/// `deadline`.
pub async fn run_senders(
    streams: Vec<DataStream>,
    block_size: usize,
    total_bps: u64,
    deadline: Instant,
) -> Totals {
    let parallel = streams.len().max(1) as u64;
    let target_bytes_per_second = (total_bps as f64 / parallel as f64) / 8.0;
    let chunk_size = block_size.min(64 * 1024);

    let totals = Totals::new();
    let mut handles = Vec::with_capacity(streams.len());

    for stream in streams {
        let counter = totals.handle();
        handles.push(tokio::spawn(async move {
            run_sender_worker(stream, chunk_size, target_bytes_per_second, deadline, counter).await;
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }
    totals
}

async fn run_sender_worker(
    mut stream: DataStream,
    chunk_size: usize,
    target_bytes_per_second: f64,
    deadline: Instant,
    counter: Arc<AtomicU64>,
) {
    let mut buf = vec![0u8; chunk_size];
    fill_payload(&mut buf);

    let start = Instant::now();
    let mut stream_bytes: u64 = 0;

    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }

        let write_result = match &mut stream {
            DataStream::Tcp(s) => s.write_all(&buf).await,
            DataStream::Udp(s) => s.send(&buf).await.map(|_| ()),
        };

        match write_result {
            Ok(()) => {
                stream_bytes += buf.len() as u64;
                counter.fetch_add(buf.len() as u64, Ordering::Relaxed);
            }
            Err(_) => break,
        }

        if target_bytes_per_second > 0.0 {
            let elapsed = start.elapsed().as_secs_f64();
            let expected_bytes = target_bytes_per_second * elapsed;
            if (stream_bytes as f64) > expected_bytes {
                let sleep_secs = (stream_bytes as f64 - expected_bytes) / target_bytes_per_second;
                let sleep_duration = Duration::from_secs_f64(sleep_secs).min(PACING_SLEEP_CEILING);
                tokio::time::sleep(sleep_duration).await;
            }
        }
    }
}

/// Run the receive-mode workers (reverse test): each stream reads
/// unpaced until `deadline` or an error.
pub async fn run_receivers(streams: Vec<DataStream>, block_size: usize, deadline: Instant) -> Totals {
    let totals = Totals::new();
    let mut handles = Vec::with_capacity(streams.len());

    for stream in streams {
        let counter = totals.handle();
        handles.push(tokio::spawn(async move {
            run_receiver_worker(stream, block_size, deadline, counter).await;
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }
    totals
}

async fn run_receiver_worker(
    mut stream: DataStream,
    block_size: usize,
    deadline: Instant,
    counter: Arc<AtomicU64>,
) {
    let mut buf = vec![0u8; block_size];

    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        let remaining = deadline.saturating_duration_since(now);

        let read_result = tokio::time::timeout(remaining, async {
            match &mut stream {
                DataStream::Tcp(s) => s.read(&mut buf).await,
                DataStream::Udp(s) => s.recv(&mut buf).await,
            }
        })
        .await;

        match read_result {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => {
                counter.fetch_add(n as u64, Ordering::Relaxed);
            }
            Ok(Err(_)) | Err(_) => break,
        }
    }
}

/// `bandwidthMbps = (totalBytes × 8) / (actualDurationSeconds × 10^6)` per
/// spec.md §4.5.
pub fn bandwidth_mbps(total_bytes: u64, actual_duration: Duration) -> f64 {
    let secs = actual_duration.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    (total_bytes as f64 * 8.0) / (secs * 1_000_000.0)
}
