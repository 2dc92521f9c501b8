use std::path::{Path, PathBuf};

use needletail::errors::ParseError;

/// Everything that can go wrong while reading annotations or sequences,
/// writing regions, or keeping track of work status.
///
/// Bad intervals are not errors: they are skipped by the segmenter and
/// reported through [`crate::Segments::rejected`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sequence input: {0}")]
    Fastx(#[from] ParseError),

    #[error("{}:{line}: {reason}", .path.display())]
    Annotation {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("invalid status record {}: {reason}", .path.display())]
    InvalidStatus { path: PathBuf, reason: String },

    #[error("invalid work unit key {0:?}")]
    InvalidKey(String),

    #[error("refusing to write output named {0:?}")]
    UnsafeName(String),
}

impl Error {
    /// Wraps an `io::Error` with the path it happened on.
    /// Meant for `map_err(Error::io(path))`.
    pub fn io(path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.as_ref().to_path_buf();
        move |source| Error::Io { path, source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
