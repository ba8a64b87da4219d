use crate::{
    constants::{HEADER_LEN, MAX_ASYNC_PAYLOAD},
    error::ProtoError,
    header::Header,
};

/// Encode one framed packet: `[Header][Payload]`.
///
/// Rejects `payload.len() > MAX_ASYNC_PAYLOAD` with `PayloadTooLarge` before
/// any bytes are produced. An oversized payload is a chunking bug upstream,
/// not a retryable condition.
///
/// Pure function; safe to call concurrently from multiple streams.
pub fn encode_packet(channel: u16, seq: u16, payload: &[u8]) -> Result<Vec<u8>, ProtoError> {
    if payload.len() > MAX_ASYNC_PAYLOAD {
        return Err(ProtoError::PayloadTooLarge(payload.len()));
    }

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());

    let mut hbuf = [0u8; HEADER_LEN];
    Header::new(channel, seq).encode_into(&mut hbuf);
    out.extend_from_slice(&hbuf);
    out.extend_from_slice(payload);
    Ok(out)
}

/// Decode one framed packet into its header and payload slice.
pub fn decode_packet(buf: &[u8]) -> Result<(Header, &[u8]), ProtoError> {
    Header::decode(buf)
}

/// A zero-length payload terminates its channel's stream.
pub fn is_end_of_stream(payload: &[u8]) -> bool {
    payload.is_empty()
}
