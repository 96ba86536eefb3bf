use std::ops::Range;

use rayon::prelude::*;

use super::{TileVertex, VisibleTile};
use crate::imagegen::ImageHandle;
use crate::tiling::TileId;

/// Index range drawing one tile.
#[derive(Clone, Debug, PartialEq)]
pub struct TileDraw {
    pub tile: TileId,
    pub indices: Range<u32>,
    pub texture: Option<ImageHandle>,
}

/// Fan-triangulated polygons of every visible tile.
///
/// A tile with `n` corners contributes `n` vertices and `n - 2` triangles.
#[derive(Clone, Debug, Default)]
pub struct TileMesh {
    pub vertices: Vec<TileVertex>,
    pub indices: Vec<u32>,
    pub draws: Vec<TileDraw>,
}

impl TileMesh {
    pub fn build(tiles: &[VisibleTile]) -> Self {
        let parts: Vec<Vec<TileVertex>> = tiles
            .par_iter()
            .map(|tile| {
                let n = tile.corners.len();
                tile.corners
                    .iter()
                    .enumerate()
                    .map(|(i, &c)| TileVertex::new(c, TileVertex::corner_uv(i, n), tile.color))
                    .collect()
            })
            .collect();

        let mut mesh = TileMesh::default();
        for (tile, part) in tiles.iter().zip(parts) {
            let base = mesh.vertices.len() as u32;
            let start = mesh.indices.len() as u32;
            for i in 1..part.len().saturating_sub(1) as u32 {
                mesh.indices.extend_from_slice(&[base, base + i, base + i + 1]);
            }
            mesh.vertices.extend(part);
            mesh.draws.push(TileDraw {
                tile: tile.id,
                indices: start..mesh.indices.len() as u32,
                texture: tile.texture.clone(),
            });
        }
        mesh
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
