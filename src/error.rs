//! Error type shared by persistence, configuration and export.

use std::io;
use std::path::PathBuf;

/// Failures that reach the caller.
///
/// Generation itself never fails: placement that runs out of retries is
/// skipped, and malformed save data is clamped with a warning.
#[derive(Debug, thiserror::Error)]
pub enum OvermapError {
    /// A save file or export target could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A configuration file was not valid JSON for [`crate::config::GenerationConfig`].
    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be written out as JSON.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("image export failed: {0}")]
    Image(#[from] image::ImageError),

    /// A z-level outside the vertical range of an overmap.
    #[error("z-level {0} is outside the overmap")]
    InvalidLevel(i32),

    /// A region was expected in the buffer but is not loaded.
    #[error("region ({x}, {y}) is not loaded")]
    MissingRegion { x: i32, y: i32 },
}

impl OvermapError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        OvermapError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, OvermapError>;
