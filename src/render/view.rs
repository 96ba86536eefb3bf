use glam::DVec2;
use hyperboloid::Projection;
use rayon::prelude::*;

use crate::imagegen::ImageHandle;
use crate::tiling::{Texture, TileId, Tiling};

/// A visible tile projected into the disk.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibleTile {
    pub id: TileId,
    /// Corners in counterclockwise order.
    pub corners: Vec<DVec2>,
    pub center: DVec2,
    pub color: [f32; 4],
    pub texture: Option<ImageHandle>,
    /// An image has been requested but not delivered.
    pub placeholder: bool,
}

/// Project every visible tile, in visiting order.
pub fn visible_tiles(tiling: &Tiling, projection: Projection) -> Vec<VisibleTile> {
    tiling
        .visible()
        .par_iter()
        .map(|&id| {
            let tile = tiling.tile(id);
            VisibleTile {
                id,
                corners: tiling
                    .corners(id)
                    .iter()
                    .map(|&c| projection.to_disk(c))
                    .collect(),
                center: projection.to_disk(tile.center()),
                color: tile.color(),
                texture: tile.texture().handle().cloned(),
                placeholder: *tile.texture() == Texture::Placeholder,
            }
        })
        .collect()
}
