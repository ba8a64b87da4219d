//! Command dispatch: parse one inbound text command, resolve its content and
//! run the streaming pipeline.
//!
//! The protocol has no error-response frame, so every failure here is
//! server-side observability only: log and drop, never crash the connection
//! or any other in-flight command.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};
use wsfile_proto::command::{Command, Target};

use crate::ServerState;
use crate::net::OutboundTx;
use crate::source::{self, SourceError};
use crate::stream::stream_content;

/// Handle one inbound command. Runs as its own task, concurrently with the
/// connection's receive loop and any other dispatched commands.
pub async fn dispatch_command(state: Arc<ServerState>, out: OutboundTx, raw: &str) {
    debug!(raw, "processing command");

    let cmd = match Command::parse(raw) {
        Ok(cmd) => cmd,
        Err(e) => {
            debug!(raw, error = %e, "dropping malformed command");
            return;
        }
    };

    let content = match resolve(&state, &cmd.target).await {
        Ok(content) => content,
        Err(e) => {
            warn!(target = ?cmd.target, error = %e, "dropping command, content unavailable");
            return;
        }
    };

    if let Err(e) = stream_content(&out, cmd.mode, &content).await {
        warn!(target = ?cmd.target, error = %e, "stream aborted");
    }
}

/// Resolve a command target to its full content.
///
/// Local files are read directly; remote URLs go through the response cache
/// so concurrent commands for the same resource share one upstream fetch.
async fn resolve(state: &ServerState, target: &Target) -> Result<Bytes, SourceError> {
    match target {
        Target::File(path) => source::read_file(path).await,
        Target::Url(url) => {
            state
                .cache
                .get_or_fetch(url, || source::fetch_url(&state.http, url))
                .await
        }
    }
}
