use crate::MAX_FRAME_LEN;
use rt_metrics_types::MetricRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// The request/response envelope exchanged over the RPC listener. Covers
/// exactly the two insertion shapes the HTTP surface also exposes
/// (`/update/` and `/updates/`), plus a uniform acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Frame {
    InsertOne(MetricRecord),
    InsertBatch(Vec<MetricRecord>),
    Ack,
    Error(String),
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame length {len} exceeds maximum {max}")]
    TooLarge { len: u32, max: u32 },
    #[error("failed to encode frame: {0}")]
    Encode(#[from] bincode::Error),
}

/// Write `frame` as a 4-byte big-endian length prefix followed by its
/// `bincode` encoding.
pub async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    frame: &Frame,
) -> Result<(), RpcError> {
    let encoded = bincode::serialize(frame)?;
    let len = u32::try_from(encoded.len()).map_err(|_| RpcError::TooLarge {
        len: u32::MAX,
        max: MAX_FRAME_LEN,
    })?;
    if len > MAX_FRAME_LEN {
        return Err(RpcError::TooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed `bincode` frame from `reader`.
pub async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Frame, RpcError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(RpcError::TooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    let frame = bincode::deserialize(&payload)?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trips_insert_one() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        let frame = Frame::InsertOne(MetricRecord::gauge("Alloc", 3.14));
        write_frame(&mut client, &frame).await.unwrap();
        let read_back = read_frame(&mut server).await.unwrap();
        match read_back {
            Frame::InsertOne(record) => assert_eq!(record.value, Some(3.14)),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn write_then_read_round_trips_batch() {
        let (mut client, mut server) = tokio::io::duplex(8192);
        let frame = Frame::InsertBatch(vec![
            MetricRecord::gauge("Alloc", 1.0),
            MetricRecord::counter("PollCount", 3),
        ]);
        write_frame(&mut client, &frame).await.unwrap();
        let read_back = read_frame(&mut server).await.unwrap();
        match read_back {
            Frame::InsertBatch(records) => assert_eq!(records.len(), 2),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_rejected_without_allocating() {
        let (mut client, mut server) = tokio::io::duplex(16);
        client
            .write_all(&(crate::MAX_FRAME_LEN + 1).to_be_bytes())
            .await
            .unwrap();
        let err = read_frame(&mut server).await.unwrap_err();
        assert!(matches!(err, RpcError::TooLarge { .. }));
    }
}
