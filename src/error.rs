//! Error types for playlist decoding.

use std::io;
use thiserror::Error;

/// Result type for playlist operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type returned when a playlist cannot be decoded.
///
/// Every variant is fatal for the playlist it was raised for and for that
/// playlist only; a caller walking a whole disc should keep going with the
/// remaining playlists.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error occurred while reading the playlist into memory.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The byte stream is not a valid movie playlist.
    #[error("malformed playlist {playlist}: {reason}")]
    MalformedPlaylist { playlist: String, reason: String },

    /// A play item references a clip info file that is not on the disc.
    #[error("playlist {playlist} references missing clip info file {file}")]
    MissingClipInfo { playlist: String, file: String },

    /// An alternate angle references a stream or clip info file that is not
    /// on the disc.
    #[error("playlist {playlist} references missing angle file {file}")]
    MissingAngleFile { playlist: String, file: String },
}

impl Error {
    pub(crate) fn malformed(playlist: &str, reason: impl ToString) -> Self {
        Self::MalformedPlaylist {
            playlist: playlist.to_owned(),
            reason: reason.to_string(),
        }
    }
}
