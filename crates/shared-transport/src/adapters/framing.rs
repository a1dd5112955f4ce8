//! Async helpers for length-prefixed frames on a byte stream.

use crate::error::TransportResult;
use shared_types::codec::{encode_frame, frame_length};
use shared_types::FRAME_HEADER_LEN;
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read one frame body. `Ok(None)` means the peer closed the stream cleanly
/// between frames.
pub(crate) async fn read_frame<R>(reader: &mut R, max_frame_size: usize) -> TransportResult<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; FRAME_HEADER_LEN];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = frame_length(header, max_frame_size)?;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

pub(crate) async fn write_frame<W>(writer: &mut W, body: &[u8], max_frame_size: usize) -> TransportResult<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(body, max_frame_size)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}
