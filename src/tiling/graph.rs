//! Vertex/edge graph of a regular `{n,k}` tiling.
//!
//! Vertices and edges live in arenas addressed by stable `u32` ids. A
//! vertex is created *dangling* (no position) as the loose end of a
//! placeholder edge. [`Graph::clamp`] fixes its position and grows it to
//! exactly `k` edges in counterclockwise order. When a tile boundary closes,
//! [`Graph::merge`] fuses two placeholder edges into one real edge and
//! discards their dangling ends. Removed slots are never reused, so an id
//! stays meaningful for the life of the graph.

use std::f64::consts::{PI, TAU};
use std::fmt;

use glam::DVec3;
use hyperboloid::{disk_projection, midpoint};
use smallvec::SmallVec;

use super::TileId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl VertexId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A tiling vertex. Once initialized it has exactly `k` edges.
#[derive(Clone, Debug)]
pub struct Vertex {
    pos: DVec3,
    initialized: bool,
    edges: SmallVec<[EdgeId; 8]>,
}

impl Vertex {
    /// Current position. Meaningless until the vertex is initialized.
    #[inline]
    pub fn pos(&self) -> DVec3 {
        self.pos
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Incident edges in counterclockwise order.
    #[inline]
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }
}

/// An edge between two vertices, bordering at most two tiles.
#[derive(Clone, Debug)]
pub struct Edge {
    vertex1: VertexId,
    vertex2: VertexId,
    tiles: SmallVec<[TileId; 2]>,
}

impl Edge {
    #[inline]
    pub fn vertex1(&self) -> VertexId {
        self.vertex1
    }

    #[inline]
    pub fn vertex2(&self) -> VertexId {
        self.vertex2
    }

    /// Both endpoints, unordered.
    #[inline]
    pub fn vertices(&self) -> [VertexId; 2] {
        [self.vertex1, self.vertex2]
    }

    #[inline]
    pub fn tiles(&self) -> &[TileId] {
        &self.tiles
    }

    #[inline]
    pub fn joins(&self, a: VertexId, b: VertexId) -> bool {
        (self.vertex1 == a && self.vertex2 == b) || (self.vertex1 == b && self.vertex2 == a)
    }

    /// The tile on the far side from `tile`, once both sides exist.
    pub fn other_tile(&self, tile: TileId) -> Option<TileId> {
        match self.tiles.as_slice() {
            [a, b, ..] => Some(if *a == tile { *b } else { *a }),
            _ => None,
        }
    }
}

/// Result of registering a tile on an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddTileOutcome {
    Added,
    /// The tile was already registered on this edge.
    Duplicate,
    /// The edge already borders two other tiles.
    Oversubscribed,
}

/// Running counters for graph construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub vertices_created: usize,
    pub edges_created: usize,
    pub merges: usize,
    /// Dangling vertices and redundant edges discarded by merges.
    pub placeholders_removed: usize,
    pub duplicate_tiles: usize,
    pub oversubscribed_edges: usize,
}

impl GraphStats {
    /// Tile/edge associations that were refused.
    pub fn anomalies(&self) -> usize {
        self.duplicate_tiles + self.oversubscribed_edges
    }
}

#[derive(Clone, Debug)]
pub struct Graph {
    k: usize,
    vertices: Vec<Option<Vertex>>,
    edges: Vec<Option<Edge>>,
    live_vertices: usize,
    live_edges: usize,
    stats: GraphStats,
}

impl Graph {
    /// Empty graph whose vertices each carry `k` edges.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            vertices: Vec::new(),
            edges: Vec::new(),
            live_vertices: 0,
            live_edges: 0,
            stats: GraphStats::default(),
        }
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn stats(&self) -> GraphStats {
        self.stats
    }

    pub fn vertex_count(&self) -> usize {
        self.live_vertices
    }

    pub fn edge_count(&self) -> usize {
        self.live_edges
    }

    pub fn try_vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index()).and_then(Option::as_ref)
    }

    pub fn try_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index()).and_then(Option::as_ref)
    }

    /// Panics if `id` was removed by a merge.
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        match self.try_vertex(id) {
            Some(v) => v,
            None => panic!("vertex {id} does not exist"),
        }
    }

    /// Panics if `id` was removed by a merge.
    pub fn edge(&self, id: EdgeId) -> &Edge {
        match self.try_edge(id) {
            Some(e) => e,
            None => panic!("edge {id} does not exist"),
        }
    }

    fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        match self.vertices.get_mut(id.index()).and_then(Option::as_mut) {
            Some(v) => v,
            None => panic!("vertex {id} does not exist"),
        }
    }

    fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        match self.edges.get_mut(id.index()).and_then(Option::as_mut) {
            Some(e) => e,
            None => panic!("edge {id} does not exist"),
        }
    }

    /// Live vertices in id order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (VertexId(i as u32), v)))
    }

    /// Live edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EdgeId(i as u32), e)))
    }

    /// New dangling vertex with no edges.
    pub fn add_vertex(&mut self) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Some(Vertex {
            pos: DVec3::ZERO,
            initialized: false,
            edges: SmallVec::new(),
        }));
        self.live_vertices += 1;
        self.stats.vertices_created += 1;
        id
    }

    /// New edge `a`–`b`, appended to both endpoints' edge lists.
    pub fn add_edge(&mut self, a: VertexId, b: VertexId) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Some(Edge {
            vertex1: a,
            vertex2: b,
            tiles: SmallVec::new(),
        }));
        self.vertex_mut(a).edges.push(id);
        self.vertex_mut(b).edges.push(id);
        self.live_edges += 1;
        self.stats.edges_created += 1;
        id
    }

    #[inline]
    pub fn pos(&self, v: VertexId) -> DVec3 {
        self.vertex(v).pos
    }

    #[inline]
    pub fn is_initialized(&self, v: VertexId) -> bool {
        self.vertex(v).initialized
    }

    /// Move an already placed vertex.
    #[inline]
    pub fn set_pos(&mut self, v: VertexId, pos: DVec3) {
        self.vertex_mut(v).pos = pos;
    }

    /// Fix the position of a dangling vertex and give it its missing edges.
    ///
    /// Each new edge runs from `v` (as `vertex1`) to a fresh dangling vertex.
    pub fn clamp(&mut self, v: VertexId, pos: DVec3) {
        let k = self.k;
        let vertex = self.vertex_mut(v);
        assert!(!vertex.initialized, "vertex {v} clamped twice");
        vertex.initialized = true;
        vertex.pos = pos;
        let missing = k.saturating_sub(vertex.edges.len());
        for _ in 0..missing {
            let loose = self.add_vertex();
            self.add_edge(v, loose);
        }
    }

    /// Position of `e` in `v`'s edge list, if incident.
    pub fn seek_edge(&self, v: VertexId, e: EdgeId) -> Option<usize> {
        self.vertex(v).edges.iter().position(|&x| x == e)
    }

    fn rotate_edge(&self, v: VertexId, e: EdgeId, forward: bool) -> EdgeId {
        let vertex = self.vertex(v);
        assert_eq!(
            vertex.edges.len(),
            self.k,
            "vertex {v} has {} edges, expected {}",
            vertex.edges.len(),
            self.k
        );
        let Some(i) = self.seek_edge(v, e) else {
            panic!("edge {e} is not incident to vertex {v}");
        };
        let j = if forward {
            (i + 1) % self.k
        } else {
            (i + self.k - 1) % self.k
        };
        vertex.edges[j]
    }

    /// Edge one step counterclockwise from `e` around `v`.
    #[inline]
    pub fn next(&self, v: VertexId, e: EdgeId) -> EdgeId {
        self.rotate_edge(v, e, true)
    }

    /// Edge one step clockwise from `e` around `v`.
    #[inline]
    pub fn prev(&self, v: VertexId, e: EdgeId) -> EdgeId {
        self.rotate_edge(v, e, false)
    }

    /// The edge joining `v` and `w`. Panics if they are not adjacent.
    pub fn seek_vertex(&self, v: VertexId, w: VertexId) -> EdgeId {
        let found = self
            .vertex(v)
            .edges
            .iter()
            .copied()
            .find(|&e| self.edge(e).joins(v, w));
        match found {
            Some(e) => e,
            None => panic!("no edge joins {v} and {w}"),
        }
    }

    /// Swap `old` for `new` in `v`'s edge list, keeping its slot.
    pub fn replace_edge(&mut self, v: VertexId, old: EdgeId, new: EdgeId) {
        let Some(i) = self.seek_edge(v, old) else {
            panic!("edge {old} is not incident to vertex {v}");
        };
        self.vertex_mut(v).edges[i] = new;
    }

    /// The endpoint of `e` that is not `v`.
    pub fn other_end(&self, e: EdgeId, v: VertexId) -> VertexId {
        let edge = self.edge(e);
        if edge.vertex1 == v {
            edge.vertex2
        } else {
            assert_eq!(edge.vertex2, v, "vertex {v} is not an endpoint of edge {e}");
            edge.vertex1
        }
    }

    /// Whether either endpoint is still unplaced.
    pub fn has_dangling(&self, e: EdgeId) -> bool {
        let edge = self.edge(e);
        !self.is_initialized(edge.vertex1) || !self.is_initialized(edge.vertex2)
    }

    /// Register `tile` as bordering `e`.
    ///
    /// Re-adding a tile or adding a third tile is refused, logged and counted;
    /// the first two associations stand.
    pub fn add_tile(&mut self, e: EdgeId, tile: TileId) -> AddTileOutcome {
        let edge = self.edge_mut(e);
        if edge.tiles.contains(&tile) {
            self.stats.duplicate_tiles += 1;
            log::warn!("tile {tile} added to edge {e} twice");
            return AddTileOutcome::Duplicate;
        }
        if edge.tiles.len() >= 2 {
            let existing = [edge.tiles[0], edge.tiles[1]];
            self.stats.oversubscribed_edges += 1;
            log::warn!(
                "edge {e} already borders {} and {}, ignoring tile {tile}",
                existing[0],
                existing[1]
            );
            return AddTileOutcome::Oversubscribed;
        }
        edge.tiles.push(tile);
        AddTileOutcome::Added
    }

    /// Endpoints of `e` in counterclockwise order as seen from `center`.
    ///
    /// Compares disk-projected bearings: if the second endpoint lies more than
    /// half a turn counterclockwise of the first, the order is swapped.
    pub fn ordered_vertices(&self, e: EdgeId, center: DVec3) -> [VertexId; 2] {
        let edge = self.edge(e);
        let c = disk_projection(center);
        let a = disk_projection(self.pos(edge.vertex1)) - c;
        let b = disk_projection(self.pos(edge.vertex2)) - c;
        let r1 = a.z.atan2(a.x);
        let r2 = b.z.atan2(b.x);
        let angle = (r2 - r1 + TAU).rem_euclid(TAU);
        if angle > PI {
            [edge.vertex2, edge.vertex1]
        } else {
            [edge.vertex1, edge.vertex2]
        }
    }

    /// Geodesic midpoint of an edge whose endpoints are placed.
    pub fn edge_midpoint(&self, e: EdgeId) -> DVec3 {
        let edge = self.edge(e);
        midpoint(self.pos(edge.vertex1), self.pos(edge.vertex2))
    }

    fn dangling_slot(&self, e: EdgeId) -> (VertexId, VertexId) {
        let edge = self.edge(e);
        let (v1, v2) = (edge.vertex1, edge.vertex2);
        match (self.is_initialized(v1), self.is_initialized(v2)) {
            (true, false) => (v1, v2),
            (false, true) => (v2, v1),
            _ => panic!("edge {e} must have exactly one dangling endpoint"),
        }
    }

    /// Close a boundary: splice `other`'s placed endpoint into `e`.
    ///
    /// Both edges must have exactly one dangling endpoint. Afterwards `e`
    /// joins the two placed endpoints, `other`'s placed endpoint refers to
    /// `e` in the slot where it had `other`, and `other` plus both dangling
    /// vertices are gone.
    pub fn merge(&mut self, e: EdgeId, other: EdgeId) {
        assert_ne!(e, other, "edge {e} merged with itself");
        let (_, dangling) = self.dangling_slot(e);
        let (keep, other_dangling) = self.dangling_slot(other);

        let edge = self.edge_mut(e);
        if edge.vertex1 == dangling {
            edge.vertex1 = keep;
        } else {
            edge.vertex2 = keep;
        }
        self.replace_edge(keep, other, e);

        self.remove_edge(other);
        self.remove_vertex(dangling);
        self.remove_vertex(other_dangling);
        self.stats.merges += 1;
    }

    fn remove_edge(&mut self, e: EdgeId) {
        if self.edges[e.index()].take().is_some() {
            self.live_edges -= 1;
            self.stats.placeholders_removed += 1;
        }
    }

    fn remove_vertex(&mut self, v: VertexId) {
        if self.vertices[v.index()].take().is_some() {
            self.live_vertices -= 1;
            self.stats.placeholders_removed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperboloid::{inverse_disk_projection, translate_x, ORIGIN};

    fn clamped(graph: &mut Graph, pos: DVec3) -> VertexId {
        let v = graph.add_vertex();
        graph.clamp(v, pos);
        v
    }

    #[test]
    fn test_clamp_creates_loose_edges() {
        let mut graph = Graph::new(5);
        let v = clamped(&mut graph, ORIGIN);
        let vertex = graph.vertex(v);
        assert!(vertex.is_initialized());
        assert_eq!(vertex.edges().len(), 5);
        for &e in vertex.edges() {
            assert_eq!(graph.edge(e).vertex1(), v);
            assert!(!graph.is_initialized(graph.edge(e).vertex2()));
            assert!(graph.has_dangling(e));
        }
        assert_eq!(graph.vertex_count(), 6);
        assert_eq!(graph.edge_count(), 5);
    }

    #[test]
    fn test_clamp_keeps_existing_edges() {
        let mut graph = Graph::new(4);
        let a = clamped(&mut graph, ORIGIN);
        let first = graph.vertex(a).edges()[0];
        let b = graph.edge(first).vertex2();
        graph.clamp(b, translate_x(ORIGIN, 1.0));
        // The connecting edge keeps slot 0
        assert_eq!(graph.vertex(b).edges()[0], first);
        assert_eq!(graph.vertex(b).edges().len(), 4);
        assert!(!graph.has_dangling(first));
    }

    #[test]
    #[should_panic(expected = "clamped twice")]
    fn test_double_clamp_panics() {
        let mut graph = Graph::new(3);
        let v = clamped(&mut graph, ORIGIN);
        graph.clamp(v, ORIGIN);
    }

    #[test]
    fn test_next_and_prev_cycle() {
        let mut graph = Graph::new(5);
        let v = clamped(&mut graph, ORIGIN);
        let edges = graph.vertex(v).edges().to_vec();
        for (i, &e) in edges.iter().enumerate() {
            assert_eq!(graph.next(v, e), edges[(i + 1) % 5]);
            assert_eq!(graph.prev(v, e), edges[(i + 4) % 5]);
            assert_eq!(graph.prev(v, graph.next(v, e)), e);
        }
        let mut e = edges[0];
        for _ in 0..5 {
            e = graph.next(v, e);
        }
        assert_eq!(e, edges[0]);
    }

    #[test]
    #[should_panic(expected = "is not incident")]
    fn test_next_with_foreign_edge_panics() {
        let mut graph = Graph::new(3);
        let a = clamped(&mut graph, ORIGIN);
        let b = clamped(&mut graph, translate_x(ORIGIN, 1.0));
        let foreign = graph.vertex(b).edges()[0];
        graph.next(a, foreign);
    }

    #[test]
    #[should_panic(expected = "expected 4")]
    fn test_next_on_dangling_vertex_panics() {
        let mut graph = Graph::new(4);
        let a = clamped(&mut graph, ORIGIN);
        let e = graph.vertex(a).edges()[0];
        let loose = graph.edge(e).vertex2();
        graph.next(loose, e);
    }

    #[test]
    fn test_merge_joins_placed_endpoints() {
        let mut graph = Graph::new(4);
        let a = clamped(&mut graph, ORIGIN);
        let b = clamped(&mut graph, translate_x(ORIGIN, 1.0));
        let ea = graph.vertex(a).edges()[1];
        let eb = graph.vertex(b).edges()[2];
        let dangling_a = graph.edge(ea).vertex2();
        let dangling_b = graph.edge(eb).vertex2();
        let (vertices, edges) = (graph.vertex_count(), graph.edge_count());

        graph.merge(ea, eb);

        assert!(graph.edge(ea).joins(a, b));
        assert!(!graph.has_dangling(ea));
        assert_eq!(graph.vertex(b).edges()[2], ea);
        assert_eq!(graph.seek_vertex(a, b), ea);
        assert_eq!(graph.seek_vertex(b, a), ea);
        assert!(graph.try_edge(eb).is_none());
        assert!(graph.try_vertex(dangling_a).is_none());
        assert!(graph.try_vertex(dangling_b).is_none());
        assert_eq!(graph.vertex_count(), vertices - 2);
        assert_eq!(graph.edge_count(), edges - 1);
        assert_eq!(graph.stats().merges, 1);
        assert_eq!(graph.stats().placeholders_removed, 3);
    }

    #[test]
    #[should_panic(expected = "exactly one dangling endpoint")]
    fn test_merge_requires_dangling_edges() {
        let mut graph = Graph::new(3);
        let a = clamped(&mut graph, ORIGIN);
        let e = graph.vertex(a).edges()[0];
        let b = graph.edge(e).vertex2();
        graph.clamp(b, translate_x(ORIGIN, 1.0));
        let other = graph.vertex(a).edges()[1];
        graph.merge(e, other);
    }

    #[test]
    fn test_add_tile_refuses_duplicates_and_third_tiles() {
        let mut graph = Graph::new(3);
        let a = clamped(&mut graph, ORIGIN);
        let e = graph.vertex(a).edges()[0];
        assert_eq!(graph.add_tile(e, TileId(0)), AddTileOutcome::Added);
        assert_eq!(graph.add_tile(e, TileId(0)), AddTileOutcome::Duplicate);
        assert_eq!(graph.add_tile(e, TileId(1)), AddTileOutcome::Added);
        assert_eq!(graph.add_tile(e, TileId(2)), AddTileOutcome::Oversubscribed);
        assert_eq!(graph.edge(e).tiles(), &[TileId(0), TileId(1)]);
        assert_eq!(graph.edge(e).other_tile(TileId(1)), Some(TileId(0)));
        assert_eq!(graph.stats().anomalies(), 2);
    }

    #[test]
    fn test_ordered_vertices_counterclockwise() {
        let mut graph = Graph::new(3);
        let a = clamped(&mut graph, inverse_disk_projection(0.5, 0.0));
        let e = graph.vertex(a).edges()[0];
        let b = graph.edge(e).vertex2();
        graph.clamp(b, inverse_disk_projection(0.0, 0.5));
        // b sits a quarter turn counterclockwise of a around the origin
        assert_eq!(graph.ordered_vertices(e, ORIGIN), [a, b]);
        // Seen from beyond the edge the order flips
        let beyond = inverse_disk_projection(0.6, 0.6);
        assert_eq!(graph.ordered_vertices(e, beyond), [b, a]);
    }

    #[test]
    #[should_panic(expected = "no edge joins")]
    fn test_seek_vertex_panics_when_not_adjacent() {
        let mut graph = Graph::new(3);
        let a = clamped(&mut graph, ORIGIN);
        let b = clamped(&mut graph, translate_x(ORIGIN, 1.0));
        graph.seek_vertex(a, b);
    }
}
