use std::path::PathBuf;

use thiserror::Error;

use crate::imagegen::ImageGenError;

/// Recoverable failures surfaced by the library.
///
/// Graph invariant violations are not represented here; they panic.
#[derive(Debug, Error)]
pub enum TilingError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image generation failed: {0}")]
    ImageGen(#[from] ImageGenError),
}

impl TilingError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TilingError::Io {
            path: path.into(),
            source,
        }
    }
}
