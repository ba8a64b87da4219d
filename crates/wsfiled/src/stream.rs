//! Chunked streaming pipeline.
//!
//! Drains a resource's bytes in bounded chunks and writes them to the
//! connection's outbound queue, framed or not depending on the command's
//! mode. Content is an opaque byte stream; chunk boundaries carry no meaning.

use bytes::Bytes;
use thiserror::Error;
use tracing::trace;
use wsfile_proto::command::StreamMode;
use wsfile_proto::constants::MAX_ASYNC_PAYLOAD;
use wsfile_proto::error::ProtoError;
use wsfile_proto::packet::encode_packet;

use crate::net::OutboundTx;

#[derive(Debug, Error)]
pub enum StreamError {
    /// The connection writer is gone; this pipeline instance aborts, nothing
    /// else is affected.
    #[error("connection closed mid-stream")]
    ConnectionClosed,
    /// Framing rejected a chunk. Chunks are bounded to `MAX_ASYNC_PAYLOAD`
    /// here, so this is a pipeline bug, never a runtime condition to retry.
    #[error(transparent)]
    Proto(#[from] ProtoError),
}

/// Stream `content` to the connection in consecutive chunks of at most
/// `MAX_ASYNC_PAYLOAD` bytes, then signal end of stream.
///
/// Async mode frames every chunk with the channel id and a sequence number
/// that starts at 1 and increments per packet; the terminal packet carries
/// the next sequence number and an empty payload. Sync mode writes chunks
/// unframed and terminates with a zero-length message. Zero-length content
/// yields exactly the terminal signal.
pub async fn stream_content(
    out: &OutboundTx,
    mode: StreamMode,
    content: &[u8],
) -> Result<(), StreamError> {
    match mode {
        StreamMode::Async { channel } => {
            let mut seq: u16 = 0;
            for chunk in content.chunks(MAX_ASYNC_PAYLOAD) {
                seq = seq.wrapping_add(1);
                trace!(channel, seq, len = chunk.len(), "sending packet");
                send(out, Bytes::from(encode_packet(channel, seq, chunk)?)).await?;
            }
            seq = seq.wrapping_add(1);
            trace!(channel, seq, "sending end-of-stream packet");
            send(out, Bytes::from(encode_packet(channel, seq, &[])?)).await
        }
        StreamMode::Sync => {
            for chunk in content.chunks(MAX_ASYNC_PAYLOAD) {
                trace!(len = chunk.len(), "sending chunk");
                send(out, Bytes::copy_from_slice(chunk)).await?;
            }
            send(out, Bytes::new()).await
        }
    }
}

async fn send(out: &OutboundTx, frame: Bytes) -> Result<(), StreamError> {
    out.send(frame)
        .await
        .map_err(|_| StreamError::ConnectionClosed)
}
