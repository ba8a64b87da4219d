//! WebSocket transport: accept loop, per-connection receive loop and the
//! writer task that serializes all outbound packets onto the socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::{accept_async, tungstenite, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::ServerState;
use crate::dispatch::dispatch_command;

/// WebSocket keep-alive ping period.
const PING_PERIOD: Duration = Duration::from_secs(30);

/// Outbound queue depth per connection, in frames. Streaming pipelines block
/// here when the peer reads slower than they produce.
const OUTBOUND_QUEUE: usize = 64;

/// Run the accept loop on an existing listener. Each accepted connection is
/// served on its own task; one client's failure never affects another.
pub async fn run_listener(listener: TcpListener, state: Arc<ServerState>) -> anyhow::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            handle_connection(stream, peer, state).await;
        });
    }
}

/// Serve one client: upgrade to WebSocket, then read text commands until the
/// connection closes, dispatching each command as an independent task.
async fn handle_connection(stream: TcpStream, peer: SocketAddr, state: Arc<ServerState>) {
    let _ = stream.set_nodelay(true);

    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, error = %e, "WebSocket handshake failed");
            return;
        }
    };
    info!(%peer, "client connected");

    let (write, mut read) = ws.split();

    // All outbound frames funnel through this queue; the writer task owns the
    // sink half, so concurrent command pipelines cannot interleave packets.
    let (out_tx, out_rx) = mpsc::channel::<Bytes>(OUTBOUND_QUEUE);
    let writer = spawn_writer(write, out_rx);

    let mut disconnect_reason = "eof".to_string();

    // Commands are read sequentially but dispatched concurrently: the loop
    // never waits for a command's streaming to finish before reading the next.
    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(cmd)) => {
                let state = state.clone();
                let out = out_tx.clone();
                tokio::spawn(async move {
                    dispatch_command(state, out, cmd.as_str()).await;
                });
            }
            Ok(Message::Close(_)) => {
                disconnect_reason = "close frame".to_string();
                break;
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(other) => {
                debug!(%peer, kind = ?other, "ignoring non-text message");
            }
            Err(e) => {
                disconnect_reason = format!("read error: {}", e);
                break;
            }
        }
    }

    info!(%peer, reason = %disconnect_reason, "client disconnected");

    // Close the outbound queue so the writer exits once in-flight command
    // tasks drop their senders. The tasks themselves are not cancelled; they
    // fail naturally on their next send.
    drop(out_tx);
    let _ = writer.await;
}

/// Spawn the writer task for one connection.
///
/// Wraps every queued frame in a binary message and pings the peer on a
/// fixed period. Exits when the queue closes or a socket write fails.
fn spawn_writer<S>(
    mut write: S,
    mut rx: mpsc::Receiver<Bytes>,
) -> tokio::task::JoinHandle<Result<(), tungstenite::Error>>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut ping = tokio::time::interval(PING_PERIOD);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it.
        ping.tick().await;

        loop {
            tokio::select! {
                frame = rx.recv() => match frame {
                    Some(frame) => write.send(Message::Binary(frame)).await?,
                    None => break,
                },
                _ = ping.tick() => write.send(Message::Ping(Bytes::new())).await?,
            }
        }
        write.close().await?;
        Ok(())
    })
}
