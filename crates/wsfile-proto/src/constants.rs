/// Maximum size of a single outbound packet (header + payload), in bytes.
/// The transport's outbound write buffer must be at least this large so a
/// packet is never split across writes.
pub const MAX_PACKET_SIZE: usize = 50_000;

/// Fixed header length in bytes (wire format).
pub const HEADER_LEN: usize = 4;

/// Maximum payload size for a framed (async-mode) packet, in bytes.
pub const MAX_ASYNC_PAYLOAD: usize = MAX_PACKET_SIZE - HEADER_LEN;
