//! Length-prefixed JSON framing shared by the control channel and the
//! results exchange.

use crate::error::{Iperf3Error, Result};
use crate::protocol::MAX_FRAME_LEN;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read a `uint32BE(length)` + `length` bytes frame and parse it as JSON.
///
/// Rejects `length == 0` and `length > MAX_FRAME_LEN` before allocating the
/// payload buffer, per spec.md §4.4.
pub async fn read_framed_json<R: AsyncRead + Unpin>(reader: &mut R) -> Result<serde_json::Value> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);

    if len == 0 || len > MAX_FRAME_LEN {
        return Err(Iperf3Error::protocol(
            format!("invalid frame length {}", len),
            None,
            None,
        ));
    }

    let mut data = vec![0u8; len as usize];
    reader.read_exact(&mut data).await?;
    Ok(serde_json::from_slice(&data)?)
}

/// Write a JSON-serializable value framed with a 4-byte big-endian length prefix.
pub async fn write_framed_json<W: AsyncWrite + Unpin, T: Serialize>(
    writer: &mut W,
    value: &T,
) -> Result<()> {
    let data = serde_json::to_vec(value)?;
    let len = data.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&data).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[tokio::test]
    async fn round_trips_a_json_value() {
        let mut buf = Vec::new();
        write_framed_json(&mut buf, &json!({"tcp": true, "time": 5})).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let parsed = read_framed_json(&mut cursor).await.unwrap();
        assert_eq!(parsed["tcp"], true);
        assert_eq!(parsed["time"], 5);
    }

    #[tokio::test]
    async fn rejects_zero_length_frame() {
        let mut cursor = Cursor::new(0u32.to_be_bytes().to_vec());
        let err = read_framed_json(&mut cursor).await.unwrap_err();
        assert!(matches!(err, Iperf3Error::Protocol { .. }));
    }

    #[tokio::test]
    async fn rejects_oversized_frame() {
        let mut cursor = Cursor::new((MAX_FRAME_LEN + 1).to_be_bytes().to_vec());
        let err = read_framed_json(&mut cursor).await.unwrap_err();
        assert!(matches!(err, Iperf3Error::Protocol { .. }));
    }
}
