use crate::error::CommandError;

/// How a requested resource is written back on the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Unframed payload chunks; a zero-length message terminates the stream.
    /// One stream at a time, no multiplexing.
    Sync,
    /// Framed packets tagged with `channel`; multiple streams may share the
    /// connection as long as they use distinct channel ids.
    Async { channel: u16 },
}

/// What the command asks the server to stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Local filesystem path (the command's leading `/` already stripped).
    File(String),
    /// Absolute HTTP(S) URL, fetched through the response cache.
    Url(String),
}

/// One parsed inbound command. Lives only for the duration of its dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub mode: StreamMode,
    pub target: Target,
}

impl Command {
    /// Parse one inbound text message: `METHOD ARG1 [ARG2]`.
    ///
    /// Only `GET` is recognized (case-insensitive). With two arguments the
    /// first is a decimal channel id in [0, 65535] and the mode is async;
    /// with one argument the mode is sync.
    pub fn parse(raw: &str) -> Result<Command, CommandError> {
        let raw = raw.trim();
        let (method, rest) = raw.split_once(' ').ok_or(CommandError::MissingArgument)?;

        if !method.eq_ignore_ascii_case("GET") {
            return Err(CommandError::UnknownMethod(method.to_string()));
        }

        let (mode, target) = match rest.split_once(' ') {
            Some((chan, target)) => {
                let channel: u16 = chan
                    .parse()
                    .map_err(|_| CommandError::BadChannelId(chan.to_string()))?;
                (StreamMode::Async { channel }, target)
            }
            None => (StreamMode::Sync, rest),
        };

        let target = parse_target(target)?;
        Ok(Command { mode, target })
    }
}

fn parse_target(target: &str) -> Result<Target, CommandError> {
    if let Some(path) = target.strip_prefix('/') {
        if path.is_empty() {
            return Err(CommandError::BadTarget(target.to_string()));
        }
        Ok(Target::File(path.to_string()))
    } else if target.len() > 4 && target.starts_with("http") {
        Ok(Target::Url(target.to_string()))
    } else {
        Err(CommandError::BadTarget(target.to_string()))
    }
}
