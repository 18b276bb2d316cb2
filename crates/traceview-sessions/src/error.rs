use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the session engine.
///
/// Malformed lines, bad timestamps and dangling tool references are not
/// errors; they degrade to skipped lines or absent values.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine home directory")]
    HomeDirNotFound,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Event {event_id} not found in session {session_id}")]
    EventNotFound { session_id: String, event_id: String },
}

impl TraceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TraceError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TraceError>;
