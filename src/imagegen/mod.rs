//! Asynchronous texture generation for macro-tiles.
//!
//! The tiling core never waits on images. It hands an [`ImageRequest`] to an
//! [`ImagePool`], keeps stepping, and applies each [`ImageEvent`] whenever it
//! is drained, possibly many steps later.

mod command;
mod pool;

pub use command::CommandGenerator;
pub use pool::ImagePool;

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Opaque reference to a generated texture.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageHandle(PathBuf);

impl ImageHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// One tile of a request: its image id and disk-projected center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RequestTile {
    pub image_id: u64,
    pub x: f64,
    pub z: f64,
}

/// Everything a generator needs to texture one macro-tile.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageRequest {
    /// Tiles to generate images for, with consecutive image ids.
    pub members: Vec<RequestTile>,
    /// Visible tiles that already have images, for context.
    pub world: Vec<RequestTile>,
}

impl ImageRequest {
    pub fn image_ids(&self) -> Vec<u64> {
        self.members.iter().map(|t| t.image_id).collect()
    }
}

#[derive(Debug, Error)]
pub enum ImageGenError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    ExitStatus { program: PathBuf, status: String },

    #[error("expected output {path} was not written")]
    MissingOutput { path: PathBuf },

    #[error("image worker panicked")]
    WorkerPanicked,
}

/// Produces textures for a request, blocking until done.
pub trait ImageGenerator: Send + Sync {
    /// One handle per member, in member order.
    fn generate(&self, request: &ImageRequest) -> Result<Vec<(u64, ImageHandle)>, ImageGenError>;
}

/// Outcome of a request, reported by [`ImagePool::poll`].
#[derive(Debug)]
pub enum ImageEvent {
    Ready {
        images: Vec<(u64, ImageHandle)>,
    },
    /// Every attempt failed; the members keep their placeholder.
    Failed {
        image_ids: Vec<u64>,
        attempts: u32,
        error: ImageGenError,
    },
}
