//! The tiling engine.
//!
//! A [`Tiling`] owns the vertex/edge [`Graph`], every tile ever built, and
//! the per-re-root [`TilingState`]. Tiles are never discarded: once out of
//! view they go `Stale` and keep their place in the graph, so walking back
//! reuses them.
//!
//! - `graph` - arena vertices and edges, dangling placeholders and merges
//! - `tile` - origin and from-reference tile construction
//! - `expand` - breadth-first re-rooting (`set_start`)
//! - `reconcile` - position-based neighbor scan over freshly built tiles
//! - `macro_tile` - batching tiles for image generation
//! - `validation` - structural and geometric checks

pub mod constants;
mod expand;
mod graph;
mod macro_tile;
mod reconcile;
mod tile;
mod validation;

pub use expand::{RoundStats, SetStartReport};
pub use graph::{AddTileOutcome, Edge, EdgeId, Graph, GraphStats, Vertex, VertexId};
pub use macro_tile::{MacroMember, MacroTileBatch, WorldTile};
pub use tile::{Texture, Tile, TileId, TileState};
pub use validation::{validate, ValidationResult};

use std::collections::VecDeque;

use glam::DVec3;
use hyperboloid::circumradius;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::config::TilingConfig;
use crate::TilingError;

/// Transient sets rebuilt by every re-root.
#[derive(Clone, Debug, Default)]
pub struct TilingState {
    /// Visible tiles in the order they were reached.
    visible: Vec<TileId>,
    visible_set: FxHashSet<TileId>,
    /// Tiles reached in the last round, not yet expanded.
    frontier: Vec<TileId>,
    /// Tiles built during the current re-root.
    created: Vec<TileId>,
}

impl TilingState {
    fn reset(&mut self, root: TileId) {
        self.visible.clear();
        self.visible_set.clear();
        self.frontier.clear();
        self.created.clear();
        self.mark_visible(root);
        self.frontier.push(root);
    }

    /// Returns false if the tile was already visible.
    fn mark_visible(&mut self, tile: TileId) -> bool {
        if self.visible_set.insert(tile) {
            self.visible.push(tile);
            true
        } else {
            false
        }
    }

    pub fn visible(&self) -> &[TileId] {
        &self.visible
    }

    pub fn is_visible(&self, tile: TileId) -> bool {
        self.visible_set.contains(&tile)
    }

    pub fn frontier(&self) -> &[TileId] {
        &self.frontier
    }

    pub fn created(&self) -> &[TileId] {
        &self.created
    }
}

/// A macro-tile root waiting for its image request.
#[derive(Clone, Debug)]
struct PendingMacro {
    root: TileId,
    members: Vec<TileId>,
}

pub struct Tiling {
    config: TilingConfig,
    /// Poincaré radius of each tile's circumcircle.
    circumradius: f64,
    graph: Graph,
    tiles: Vec<Tile>,
    rng: ChaCha8Rng,
    state: TilingState,
    root: TileId,
    pending_macro: VecDeque<PendingMacro>,
    image_index: FxHashMap<u64, TileId>,
    next_image_id: u64,
    fallback_links: usize,
}

impl Tiling {
    /// Validate `config` and build the origin tile, centered at `(0, 1, 0)`.
    pub fn new(config: TilingConfig) -> Result<Self, TilingError> {
        config.validate()?;
        let mut tiling = Self {
            circumradius: circumradius(config.n, config.k),
            graph: Graph::new(config.k),
            tiles: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            state: TilingState::default(),
            root: TileId(0),
            pending_macro: VecDeque::new(),
            image_index: FxHashMap::default(),
            next_image_id: 1,
            fallback_links: 0,
            config,
        };
        let origin = tiling.build_origin_tile();
        tiling.root = origin;
        tiling.state.reset(origin);
        tiling.tiles[origin.index()].state = TileState::Visible;
        log::debug!(
            "{{{},{}}} tiling, circumradius {:.6}",
            tiling.config.n,
            tiling.config.k,
            tiling.circumradius
        );
        Ok(tiling)
    }

    pub fn config(&self) -> &TilingConfig {
        &self.config
    }

    pub fn circumradius(&self) -> f64 {
        self.circumradius
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn state(&self) -> &TilingState {
        &self.state
    }

    /// The tile the last re-root started from.
    pub fn root(&self) -> TileId {
        self.root
    }

    pub fn tile(&self, id: TileId) -> &Tile {
        &self.tiles[id.index()]
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn visible(&self) -> &[TileId] {
        self.state.visible()
    }

    pub fn is_visible(&self, tile: TileId) -> bool {
        self.state.is_visible(tile)
    }

    /// Total position-based links recorded since construction.
    pub fn fallback_link_count(&self) -> usize {
        self.fallback_links
    }

    /// Orientation used when `tile` next becomes the root.
    pub fn set_angle(&mut self, tile: TileId, angle: f64) {
        self.tiles[tile.index()].angle = angle;
    }

    /// Current corner positions of a tile, counterclockwise.
    pub fn corners(&self, tile: TileId) -> SmallVec<[DVec3; 8]> {
        self.tile(tile)
            .vertices
            .iter()
            .map(|&v| self.graph.pos(v))
            .collect()
    }

    /// The tile across `edge` from `tile`, if it has been built.
    pub fn neighbor_across(&self, tile: TileId, edge: EdgeId) -> Option<TileId> {
        self.graph.edge(edge).other_tile(tile)
    }

    /// Neighbors reached through shared edges, in edge order.
    pub fn edge_neighbors(&self, tile: TileId) -> SmallVec<[TileId; 8]> {
        self.tile(tile)
            .edges
            .iter()
            .filter_map(|&e| self.neighbor_across(tile, e))
            .collect()
    }

    /// Edge neighbors followed by any position-based links.
    pub fn neighbors(&self, tile: TileId) -> SmallVec<[TileId; 8]> {
        let mut out = self.edge_neighbors(tile);
        for &link in &self.tile(tile).fallback_links {
            if !out.contains(&link) {
                out.push(link);
            }
        }
        out
    }
}
