//! Unified error type for bdstream.
//!
//! Every fallible navigation operation funnels into [`Error`]. The variants
//! mirror what a player needs to decide next: retry an open, report a bad
//! index, halt playback on a read failure, or stop calling a closed session.

use std::fmt;

/// Unified error type covering all failure modes of a disc session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The disc could not be opened (bad path, not a Blu-ray, encrypted,
    /// or the retry budget ran out).
    #[error("Open error [{path}]: {reason}")]
    Open {
        /// The path that was opened.
        path: String,
        /// Human-readable failure description.
        reason: String,
    },

    /// A title, playlist, chapter or angle index is out of range.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "title", "playlist").
        entity: String,
        /// The index that was looked up.
        id: String,
    },

    /// The engine failed to deliver data after the permitted retry.
    #[error("IO error: {0}")]
    Io(String),

    /// The seek target is out of range or was rejected by the engine.
    #[error("Seek error: {0}")]
    Seek(String),

    /// A restore token does not match the open disc.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The engine refused a navigation request (title, playlist, angle,
    /// stream or menu change).
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// Configuration could not be parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// The session has been closed.
    #[error("session closed")]
    Closed,
}

impl Error {
    /// Whether playback can continue after this error.
    ///
    /// Read failures and closed sessions end playback; everything else only
    /// rejects the single request that caused it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Closed | Error::Open { .. })
    }

    /// Convenience constructor for [`Error::Open`].
    pub fn open(path: impl fmt::Display, reason: impl Into<String>) -> Self {
        Error::Open {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Navigation`].
    pub fn navigation(message: impl Into<String>) -> Self {
        Error::Navigation(message.into())
    }

    /// Convenience constructor for [`Error::InvalidState`].
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Error::InvalidState(message.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
