//! Grouping tiles into macro-tiles for image generation.
//!
//! When a re-root lands on a tile with no macro parent, that tile becomes a
//! macro-tile root and claims every unclaimed tile within `macro_radius`
//! steps. Roots queue in FIFO order; popping one assigns each member a fresh
//! image id and a placeholder texture. The queue holds at most
//! `max_pending_macro` roots; the oldest is dropped and its tiles released
//! so a later re-root can claim them again.

use glam::DVec2;
use hyperboloid::Projection;
use rustc_hash::FxHashSet;

use super::{PendingMacro, Texture, TileId, Tiling};
use crate::imagegen::{ImageHandle, ImageRequest, RequestTile};

/// A tile in a macro-tile batch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MacroMember {
    pub tile: TileId,
    pub image_id: u64,
    /// Poincaré-disk center.
    pub center: DVec2,
}

/// A visible tile that already has an image, sent along as context.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldTile {
    pub image_id: u64,
    pub center: DVec2,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MacroTileBatch {
    pub root: TileId,
    /// Members with consecutive image ids, root first.
    pub members: Vec<MacroMember>,
    pub world: Vec<WorldTile>,
}

impl From<&MacroTileBatch> for ImageRequest {
    fn from(batch: &MacroTileBatch) -> Self {
        ImageRequest {
            members: batch
                .members
                .iter()
                .map(|m| RequestTile {
                    image_id: m.image_id,
                    x: m.center.x,
                    z: m.center.y,
                })
                .collect(),
            world: batch
                .world
                .iter()
                .map(|w| RequestTile {
                    image_id: w.image_id,
                    x: w.center.x,
                    z: w.center.y,
                })
                .collect(),
        }
    }
}

impl Tiling {
    /// Make `root` a macro-tile root unless it already belongs to one.
    pub(super) fn assign_macro_parent(&mut self, root: TileId) {
        if self.tiles[root.index()].parent.is_some() {
            return;
        }
        self.tiles[root.index()].parent = Some(root);

        let mut members = vec![root];
        let mut seen = FxHashSet::default();
        seen.insert(root);
        let mut ring = vec![root];
        for _ in 0..self.config.macro_radius {
            let mut next_ring = Vec::new();
            for &t in &ring {
                for nb in self.neighbors(t) {
                    if !seen.insert(nb) || self.tiles[nb.index()].parent.is_some() {
                        continue;
                    }
                    self.tiles[nb.index()].parent = Some(root);
                    members.push(nb);
                    next_ring.push(nb);
                }
            }
            ring = next_ring;
        }

        log::debug!("macro-tile {root} claims {} tiles", members.len());
        self.pending_macro.push_back(PendingMacro { root, members });

        while self.pending_macro.len() > self.config.max_pending_macro {
            let Some(dropped) = self.pending_macro.pop_front() else {
                break;
            };
            for &t in &dropped.members {
                if self.tiles[t.index()].parent == Some(dropped.root) {
                    self.tiles[t.index()].parent = None;
                }
            }
            log::debug!(
                "macro queue full, dropped {} and released {} tiles",
                dropped.root,
                dropped.members.len()
            );
        }
    }

    pub fn pending_macro_tiles(&self) -> usize {
        self.pending_macro.len()
    }

    /// Pop the oldest macro-tile and assign image ids to its members.
    ///
    /// World context is every visible tile that already has an image id,
    /// taken before this batch is numbered.
    pub fn next_macro_tile(&mut self) -> Option<MacroTileBatch> {
        let pending = self.pending_macro.pop_front()?;
        let projection = Projection::Poincare;

        let world: Vec<WorldTile> = self
            .state
            .visible
            .iter()
            .filter_map(|&id| {
                let tile = &self.tiles[id.index()];
                tile.image_id.map(|image_id| WorldTile {
                    image_id,
                    center: projection.to_disk(tile.center),
                })
            })
            .collect();

        let mut members = Vec::with_capacity(pending.members.len());
        for tile in pending.members {
            let image_id = self.next_image_id;
            self.next_image_id += 1;
            self.image_index.insert(image_id, tile);
            let t = &mut self.tiles[tile.index()];
            t.image_id = Some(image_id);
            t.texture = Texture::Placeholder;
            members.push(MacroMember {
                tile,
                image_id,
                center: projection.to_disk(t.center),
            });
        }

        log::info!(
            "dispatching macro-tile {} with {} members, image ids from {}",
            pending.root,
            members.len(),
            members.first().map_or(0, |m: &MacroMember| m.image_id)
        );
        Some(MacroTileBatch {
            root: pending.root,
            members,
            world,
        })
    }

    /// Attach a generated image to the tile holding `image_id`, visible or not.
    /// Returns false for an unknown id.
    pub fn apply_image(&mut self, image_id: u64, handle: ImageHandle) -> bool {
        let Some(&tile) = self.image_index.get(&image_id) else {
            log::warn!("image {image_id} does not belong to any tile");
            return false;
        };
        self.tiles[tile.index()].texture = Texture::Image(handle);
        true
    }

    /// Record that `image_id` will never arrive; the tile keeps its placeholder.
    pub fn image_failed(&mut self, image_id: u64) -> bool {
        match self.image_index.get(&image_id) {
            Some(&tile) => {
                log::warn!("image {image_id} for tile {tile} failed, keeping placeholder");
                true
            }
            None => false,
        }
    }

    /// Tile that was given `image_id`.
    pub fn tile_for_image(&self, image_id: u64) -> Option<TileId> {
        self.image_index.get(&image_id).copied()
    }
}
