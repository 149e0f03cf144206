// Error types for the set list core
// Everything the collection or the exporter can refuse ends up here, so the shell
// and the CLI can print one clear message instead of guessing

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetlistError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{filename} is not a usable song: {reason}")]
    InvalidFormat { filename: String, reason: String },

    #[error("index {index} is out of range (setlist has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("export failed at {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SetlistError {
    pub fn invalid(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            filename: filename.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SetlistError>;
