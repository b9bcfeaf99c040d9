//! The iperf3 control channel: cookie handshake, state byte exchange, and
//! parameter negotiation.

use crate::cookie::generate_cookie;
use crate::error::{Iperf3Error, Result};
use crate::framing::{read_framed_json, write_framed_json};
use crate::protocol::{Protocol, TestParameters, WireState, COOKIE_SIZE};
use crate::session_state::SessionState;
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// The control connection to an iperf3 server, and the session state it drives.
pub struct ControlChannel {
    stream: TcpStream,
    state: SessionState,
    pub cookie: [u8; COOKIE_SIZE],
}

impl ControlChannel {
    /// Connect to `addr`, bounded by a 10-second connect timeout, and send
    /// the session cookie (per spec.md §4.4's Connecting → ParamExchange
    /// transition).
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| Iperf3Error::Timeout(CONNECT_TIMEOUT))?
            .map_err(|source| Iperf3Error::Connect {
                host: addr.ip().to_string(),
                port: addr.port(),
                source,
            })?;

        let mut channel = ControlChannel {
            stream,
            state: SessionState::Connecting,
            cookie: generate_cookie(),
        };
        channel.stream.write_all(&channel.cookie).await?;
        channel.state = SessionState::ParamExchange;
        Ok(channel)
    }

    async fn read_state_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.stream.read_exact(&mut buf).await?;
        Ok(buf[0])
    }

    async fn write_state_byte(&mut self, state: WireState) -> Result<()> {
        self.stream.write_all(&[state.to_byte()]).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn advance(&mut self, expected: WireState) -> Result<()> {
        let byte = self.read_state_byte().await?;
        self.state = self.state.advance_on(byte, expected)?;
        Ok(())
    }

    async fn write_json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        write_framed_json(&mut self.stream, value).await
    }

    async fn read_json(&mut self) -> Result<serde_json::Value> {
        read_framed_json(&mut self.stream).await
    }

    /// Drive ParamExchange → CreateStreams: wait for state 9, then write the
    /// framed parameter JSON.
    pub async fn exchange_parameters(
        &mut self,
        protocol: Protocol,
        duration_secs: u64,
        parallel_streams: u32,
        reverse: bool,
    ) -> Result<()> {
        self.advance(WireState::ParamExchange).await?;
        let params = TestParameters::for_test(protocol, duration_secs, parallel_streams, reverse);
        self.write_json(&params).await
    }

    /// Drive CreateStreams → TestStart. The caller opens the data streams
    /// between this call and `await_test_start`.
    pub async fn await_create_streams(&mut self) -> Result<()> {
        self.advance(WireState::CreateStreams).await
    }

    /// Drive TestStart → TestRunning.
    pub async fn await_test_start(&mut self) -> Result<()> {
        self.advance(WireState::TestStart).await
    }

    /// Drive TestRunning → TestRunning (the server echoes state 2 once the
    /// test actually begins).
    pub async fn await_test_running(&mut self) -> Result<()> {
        self.advance(WireState::TestRunning).await
    }

    /// Send TestEnd (state 4) once the shared deadline is reached.
    pub async fn send_test_end(&mut self) -> Result<()> {
        self.write_state_byte(WireState::TestEnd).await?;
        self.state = SessionState::TestEnd;
        Ok(())
    }

    /// Drive TestEnd → ExchangeResults: wait for state 13, write an empty
    /// JSON object, then read and discard the server's results JSON.
    pub async fn exchange_results(&mut self) -> Result<()> {
        self.advance(WireState::ExchangeResults).await?;
        self.write_json(&serde_json::json!({})).await?;
        let _ = self.read_json().await?;
        Ok(())
    }

    /// Drive ExchangeResults → DisplayResults → Done: wait for state 14,
    /// write IPERF_DONE.
    pub async fn finish(&mut self) -> Result<()> {
        self.advance(WireState::DisplayResults).await?;
        self.write_state_byte(WireState::IperfDone).await?;
        self.state = SessionState::Done;
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Drives a minimal happy-path control handshake against a fake server
    /// running in the same process, per spec.md §8's "visits each state in
    /// §4.4 exactly once" testable property.
    #[tokio::test]
    async fn happy_path_visits_every_state_once() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();

            let mut cookie = [0u8; COOKIE_SIZE];
            sock.read_exact(&mut cookie).await.unwrap();
            assert_eq!(cookie[COOKIE_SIZE - 1], 0);

            sock.write_all(&[WireState::ParamExchange.to_byte()]).await.unwrap();
            let _params = read_framed_json(&mut sock).await.unwrap();

            sock.write_all(&[WireState::CreateStreams.to_byte()]).await.unwrap();
            sock.write_all(&[WireState::TestStart.to_byte()]).await.unwrap();
            sock.write_all(&[WireState::TestRunning.to_byte()]).await.unwrap();

            let mut end = [0u8; 1];
            sock.read_exact(&mut end).await.unwrap();
            assert_eq!(end[0], WireState::TestEnd.to_byte());

            sock.write_all(&[WireState::ExchangeResults.to_byte()]).await.unwrap();
            let _empty = read_framed_json(&mut sock).await.unwrap();
            write_framed_json(&mut sock, &serde_json::json!({"end": true})).await.unwrap();

            sock.write_all(&[WireState::DisplayResults.to_byte()]).await.unwrap();
            let mut done = [0u8; 1];
            sock.read_exact(&mut done).await.unwrap();
            assert_eq!(done[0], WireState::IperfDone.to_byte());
        });

        let mut client = ControlChannel::connect(addr).await.unwrap();
        client.exchange_parameters(Protocol::Tcp, 5, 1, false).await.unwrap();
        client.await_create_streams().await.unwrap();
        client.await_test_start().await.unwrap();
        client.await_test_running().await.unwrap();
        client.send_test_end().await.unwrap();
        client.exchange_results().await.unwrap();
        client.finish().await.unwrap();

        assert_eq!(client.state(), SessionState::Done);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn access_denied_fails_the_session() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut cookie = [0u8; COOKIE_SIZE];
            sock.read_exact(&mut cookie).await.unwrap();
            sock.write_all(&[WireState::AccessDenied.to_byte()]).await.unwrap();
        });

        let mut client = ControlChannel::connect(addr).await.unwrap();
        let err = client
            .exchange_parameters(Protocol::Tcp, 5, 1, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Iperf3Error::AccessDenied));
        server.await.unwrap();
    }
}
