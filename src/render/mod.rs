//! Projection of visible tiles into draw-ready data.
//!
//! Nothing here touches a GPU. [`visible_tiles`] projects each visible tile
//! into the disk, and [`TileMesh`] packs them into one vertex/index buffer
//! pair that a renderer can upload as is.

mod mesh;
mod vertex;
mod view;

pub use mesh::{TileDraw, TileMesh};
pub use vertex::TileVertex;
pub use view::{visible_tiles, VisibleTile};
