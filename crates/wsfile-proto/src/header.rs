use crate::{constants::HEADER_LEN, error::ProtoError};

/// Packet header (wire format).
///
/// Encoding rules:
/// - Fixed size: exactly `HEADER_LEN` bytes.
/// - Integer fields are big-endian.
/// - Layout is defined by `encode_into()` / `decode()` offsets below.
///
/// Decode rules:
/// - Requires `buf.len() >= HEADER_LEN`.
/// - Everything after the header is the payload; zero payload bytes is the
///   end-of-stream sentinel for the header's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Client-chosen logical channel this packet belongs to.
    pub channel: u16,

    /// Per-channel sequence number, starting at 1 for the first content
    /// packet of a stream and incrementing once per packet.
    pub seq: u16,
}

impl Header {
    /// Header size in bytes for the current wire layout.
    pub const LEN: usize = HEADER_LEN;

    pub fn new(channel: u16, seq: u16) -> Self {
        Self { channel, seq }
    }

    /// Encode this header into `out` using the current fixed wire layout.
    ///
    /// Offsets (bytes):
    /// - 0..2 channel (u16 BE)
    /// - 2..4 seq (u16 BE)
    pub fn encode_into(&self, out: &mut [u8; HEADER_LEN]) {
        out[0..2].copy_from_slice(&self.channel.to_be_bytes());
        out[2..4].copy_from_slice(&self.seq.to_be_bytes());
    }

    /// Decode a packet buffer that contains `[Header][Payload]`.
    ///
    /// - If `buf.len() < HEADER_LEN`, returns `TooShort`.
    /// - On success, returns `(Header, payload_slice)`; the payload slice may
    ///   be empty.
    pub fn decode(buf: &[u8]) -> Result<(Header, &[u8]), ProtoError> {
        if buf.len() < HEADER_LEN {
            return Err(ProtoError::TooShort);
        }

        let channel = read_u16_be(buf, 0)?;
        let seq = read_u16_be(buf, 2)?;

        Ok((Header { channel, seq }, &buf[HEADER_LEN..]))
    }
}

fn read_u16_be(buf: &[u8], start: usize) -> Result<u16, ProtoError> {
    let bytes: [u8; 2] = buf
        .get(start..start + 2)
        .ok_or(ProtoError::TooShort)?
        .try_into()
        .map_err(|_| ProtoError::TooShort)?;
    Ok(u16::from_be_bytes(bytes))
}
