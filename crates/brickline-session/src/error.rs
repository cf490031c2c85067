use std::path::PathBuf;
use std::time::Duration;

use brickline_frame::{ReplyKind, SystemStatus};

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] brickline_transport::TransportError),

    /// A command could not be framed.
    #[error("frame error: {0}")]
    Frame(#[from] brickline_frame::FrameError),

    /// The session has no open link.
    #[error("not connected")]
    NotConnected,

    /// `connect` was called on a live session.
    #[error("already connected")]
    AlreadyConnected,

    /// No reply arrived within the request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The link went down while a reply was outstanding.
    #[error("disconnected while waiting for a reply")]
    Disconnected,

    /// The brick answered with a reply kind the operation cannot use.
    #[error("unexpected reply kind {0:?}")]
    UnexpectedReply(ReplyKind),

    /// The reply is missing bytes the operation needs.
    #[error("malformed reply: {0}")]
    MalformedReply(&'static str),

    /// The brick refused to open a file for writing.
    #[error("begin download failed: {}", status_name(.0))]
    BeginDownloadFailed(Option<SystemStatus>),

    /// A chunk of an upload was rejected.
    #[error("transfer failed: {}", status_name(.0))]
    TransferFailed(Option<SystemStatus>),

    /// A single-step system operation was rejected.
    #[error("operation failed: {}", status_name(.0))]
    OperationFailed(Option<SystemStatus>),

    /// Reading a local file failed.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn status_name(status: &Option<SystemStatus>) -> String {
    match status {
        Some(status) => format!("{status:?}"),
        None => "no status".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
