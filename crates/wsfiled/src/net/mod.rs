pub mod ws;

/// Sender used by dispatched commands to write binary messages to their
/// connection. All writers for one connection share this queue, which is the
/// only path to the socket: one packet's bytes are never interleaved with
/// another's.
pub type OutboundTx = tokio::sync::mpsc::Sender<bytes::Bytes>;
