//! Procedurally expanding regular `{n,k}` tiling of the hyperbolic plane.
//!
//! The tiling lives on the hyperboloid model (see the `hyperboloid` crate) and
//! is stored as an arena graph of vertices, edges and tiles. Each navigation
//! step re-roots the tiling at the tile under the viewer and expands it
//! breadth-first out to a bounded horizon, creating tiles on demand.
//!
//! - [`tiling`] - vertex/edge graph, tile construction, breadth-first expansion
//! - [`driver`] - navigation and per-step orchestration
//! - [`render`] - disk projection of visible tiles into draw-ready buffers
//! - [`imagegen`] - asynchronous texture generation for macro-tiles

pub mod config;
pub mod driver;
pub mod error;
pub mod imagegen;
pub mod render;
pub mod tiling;
pub mod util;

pub use config::{Config, ImageGenConfig, TilingConfig};
pub use error::TilingError;
