use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtoError {
    #[error("buffer too short")]
    TooShort,
    #[error("payload too large: {0}")]
    PayloadTooLarge(usize),
}

/// Why an inbound text command was rejected.
///
/// The wire protocol has no error-response frame, so these never reach the
/// client; the dispatcher logs them and drops the command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown method: {0}")]
    UnknownMethod(String),
    #[error("missing argument")]
    MissingArgument,
    #[error("bad channel id: {0}")]
    BadChannelId(String),
    #[error("target is neither a path nor a url: {0}")]
    BadTarget(String),
}
