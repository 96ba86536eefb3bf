//! Tiles: regular n-gons bounded by graph vertices and edges.

use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::fmt;

use glam::DVec3;
use hyperboloid::{extend, inverse_disk_projection, rotate, ORIGIN};
use rand::Rng;
use smallvec::SmallVec;

use super::graph::{EdgeId, VertexId};
use super::Tiling;
use crate::imagegen::ImageHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u32);

impl TileId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Lifecycle of a tile.
///
/// Construction moves a tile from `Unpositioned` through `PartiallyResolved`
/// to `Resolved`. Afterwards each re-root toggles it between `Visible` and
/// `Stale`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileState {
    Unpositioned,
    PartiallyResolved,
    Resolved,
    Visible,
    Stale,
}

/// What to draw on a tile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Texture {
    #[default]
    None,
    /// An image has been requested but has not arrived.
    Placeholder,
    Image(ImageHandle),
}

impl Texture {
    pub fn handle(&self) -> Option<&ImageHandle> {
        match self {
            Texture::Image(handle) => Some(handle),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Tile {
    pub(crate) id: TileId,
    pub(crate) center: DVec3,
    pub(crate) vertices: SmallVec<[VertexId; 8]>,
    pub(crate) edges: SmallVec<[EdgeId; 8]>,
    pub(crate) color: [f32; 4],
    pub(crate) texture: Texture,
    /// Bearing of vertex 0 around the center when this tile is the root.
    pub(crate) angle: f64,
    pub(crate) image_id: Option<u64>,
    pub(crate) parent: Option<TileId>,
    /// Adjacency found by position rather than through a shared edge.
    pub(crate) fallback_links: SmallVec<[TileId; 2]>,
    pub(crate) state: TileState,
}

impl Tile {
    fn new(id: TileId, center: DVec3, color: [f32; 4]) -> Self {
        Self {
            id,
            center,
            vertices: SmallVec::new(),
            edges: SmallVec::new(),
            color,
            texture: Texture::None,
            angle: 0.0,
            image_id: None,
            parent: None,
            fallback_links: SmallVec::new(),
            state: TileState::Unpositioned,
        }
    }

    #[inline]
    pub fn id(&self) -> TileId {
        self.id
    }

    #[inline]
    pub fn center(&self) -> DVec3 {
        self.center
    }

    /// Boundary vertices, counterclockwise.
    #[inline]
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// `edges[i]` joins `vertices[i]` and `vertices[i + 1]`.
    #[inline]
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn image_id(&self) -> Option<u64> {
        self.image_id
    }

    pub fn parent(&self) -> Option<TileId> {
        self.parent
    }

    pub fn fallback_links(&self) -> &[TileId] {
        &self.fallback_links
    }

    pub fn state(&self) -> TileState {
        self.state
    }
}

impl Tiling {
    pub(super) fn alloc_tile(&mut self, center: DVec3) -> TileId {
        let id = TileId(self.tiles.len() as u32);
        let color = [
            self.rng.gen_range(0.0..1.0),
            self.rng.gen_range(0.0..1.0),
            self.rng.gen_range(0.0..1.0),
            1.0,
        ];
        self.tiles.push(Tile::new(id, center, color));
        id
    }

    /// Record the boundary and derive the edge list from it.
    fn finish_tile(&mut self, id: TileId, vertices: SmallVec<[VertexId; 8]>) {
        let n = self.config.n;
        assert_eq!(vertices.len(), n, "tile {id} closed with {} vertices", vertices.len());
        let edges: SmallVec<[EdgeId; 8]> = (0..n)
            .map(|i| self.graph.seek_vertex(vertices[i], vertices[(i + 1) % n]))
            .collect();
        let tile = &mut self.tiles[id.index()];
        tile.vertices = vertices;
        tile.edges = edges;
        tile.state = TileState::Resolved;
    }

    /// Build the first tile around the origin from nothing.
    ///
    /// Vertex 0 sits at the circumradius on the positive x axis; each further
    /// vertex is the previous one rotated by `2π/n`, reached by turning
    /// clockwise at the previous vertex. The last loose edge is merged into
    /// vertex 0 to close the polygon.
    pub(super) fn build_origin_tile(&mut self) -> TileId {
        let n = self.config.n;
        let id = self.alloc_tile(ORIGIN);
        self.tiles[id.index()].state = TileState::PartiallyResolved;

        let v0 = self.graph.add_vertex();
        self.graph
            .clamp(v0, inverse_disk_projection(self.circumradius, 0.0));
        let first = self.graph.vertex(v0).edges()[0];
        let mut vertices: SmallVec<[VertexId; 8]> = SmallVec::new();
        vertices.push(v0);

        let mut edge = first;
        self.graph.add_tile(edge, id);
        for i in 1..n {
            let v = self.graph.edge(edge).vertex2();
            let pos = rotate(self.graph.pos(vertices[i - 1]), TAU / n as f64);
            self.graph.clamp(v, pos);
            vertices.push(v);
            edge = self.graph.prev(v, edge);
            self.graph.add_tile(edge, id);
        }
        let closing = self.graph.next(v0, first);
        self.graph.merge(edge, closing);

        self.finish_tile(id, vertices);
        id
    }

    /// Build the tile across `shared` from `reference`.
    ///
    /// The new center is the reference center reflected through the edge
    /// midpoint. Starting at the shared edge, the boundary is first walked
    /// backwards over edges whose endpoints are already placed. If that walk
    /// comes all the way around, the tile is closed. Otherwise the remaining
    /// vertices are placed forward from the shared edge by mirroring the
    /// matching reference vertices through the midpoint, and the final loose
    /// edge is merged into the end of the backward walk.
    pub(super) fn build_tile_from(&mut self, reference: TileId, shared: EdgeId) -> TileId {
        let n = self.config.n;
        let ref_center = self.tiles[reference.index()].center;
        let mid = self.graph.edge_midpoint(shared);
        let center = extend(ref_center, mid);
        let id = self.alloc_tile(center);
        self.tiles[id.index()].state = TileState::PartiallyResolved;
        self.graph.add_tile(shared, id);

        let [back, front] = self.graph.ordered_vertices(shared, center);
        let mut vertices: VecDeque<VertexId> = VecDeque::with_capacity(n);
        vertices.push_back(back);
        vertices.push_back(front);

        let mut back_vertex = back;
        let mut back_edge = self.graph.next(back, shared);
        while back_vertex != front && !self.graph.has_dangling(back_edge) {
            self.graph.add_tile(back_edge, id);
            back_vertex = self.graph.other_end(back_edge, back_vertex);
            vertices.push_front(back_vertex);
            back_edge = self.graph.next(back_vertex, back_edge);
        }

        if back_vertex == front {
            // Walked all the way round; front is now listed twice
            vertices.pop_front();
        } else {
            let mut v = front;
            let mut edge = self.graph.prev(front, shared);
            self.graph.add_tile(edge, id);
            let mut ref_vertex = self.graph.ordered_vertices(shared, ref_center)[1];
            let mut ref_edge = self.graph.prev(ref_vertex, shared);
            for _ in vertices.len()..n {
                ref_vertex = self.graph.other_end(ref_edge, ref_vertex);
                let pos = extend(self.graph.pos(ref_vertex), mid);
                let next = self.graph.other_end(edge, v);
                if self.graph.is_initialized(next) {
                    self.graph.set_pos(next, pos);
                } else {
                    self.graph.clamp(next, pos);
                }
                v = next;
                vertices.push_back(v);
                edge = self.graph.prev(v, edge);
                ref_edge = self.graph.prev(ref_vertex, ref_edge);
                self.graph.add_tile(edge, id);
            }
            self.graph.merge(edge, back_edge);
        }

        self.finish_tile(id, vertices.into_iter().collect());
        log::trace!("built tile {id} from {reference} across edge {shared}");
        id
    }
}
