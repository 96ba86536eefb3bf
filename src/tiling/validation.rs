//! Validation utilities for the tiling graph.
//!
//! These check the structural invariants every construction step is meant
//! to keep, plus the geometry of the currently visible tiles. Stale tiles
//! keep whatever positions they had when last seen, so only visible tiles
//! are checked geometrically.

use hyperboloid::{distance, inverse_disk_projection, ORIGIN};

use super::constants::{COINCIDENT_CENTER_TOLERANCE, REGULARITY_TOLERANCE};
use super::{EdgeId, TileId, Tiling, VertexId};

/// Results of validating a tiling.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub num_tiles: usize,
    pub num_visible: usize,
    pub num_vertices: usize,
    pub num_edges: usize,
    /// Tiles whose vertex list is not `n` long
    pub wrong_vertex_count: Vec<(TileId, usize)>,
    /// Tiles whose edge list is not `n` long
    pub wrong_edge_count: Vec<(TileId, usize)>,
    /// Tile edges that do not join the matching consecutive vertices
    pub disconnected_edges: Vec<(TileId, usize)>, // tile, edge slot
    /// Edges listing a tile that does not list them back
    pub unlisted_edges: Vec<(EdgeId, TileId)>,
    /// Edges bordering more than two tiles
    pub overcounted_edges: Vec<(EdgeId, usize)>,
    /// Placed vertices without exactly `k` edges
    pub wrong_valence: Vec<(VertexId, usize)>,
    /// Visible tiles whose corners stray from the circumradius
    pub irregular_tiles: Vec<(TileId, f64)>, // tile, worst deviation
    /// Distinct visible tiles sharing a center
    pub coincident_centers: Vec<(TileId, TileId)>,
    /// Position-based links recorded so far (drift, not an error)
    pub fallback_links: usize,
    /// Refused tile/edge associations (not an error)
    pub anomalies: usize,
}

impl ValidationResult {
    /// Check if the tiling is valid (no hard errors)
    pub fn is_valid(&self) -> bool {
        self.issue_count() == 0
    }

    /// Total number of hard issues found
    pub fn issue_count(&self) -> usize {
        self.wrong_vertex_count.len()
            + self.wrong_edge_count.len()
            + self.disconnected_edges.len()
            + self.unlisted_edges.len()
            + self.overcounted_edges.len()
            + self.wrong_valence.len()
            + self.irregular_tiles.len()
            + self.coincident_centers.len()
    }

    /// Log a summary of validation results
    pub fn log_summary(&self) {
        log::info!(
            "tiling validation: {} tiles ({} visible), {} vertices, {} edges",
            self.num_tiles,
            self.num_visible,
            self.num_vertices,
            self.num_edges
        );
        if self.fallback_links > 0 || self.anomalies > 0 {
            log::warn!(
                "  {} fallback links, {} refused tile/edge associations",
                self.fallback_links,
                self.anomalies
            );
        }
        if self.is_valid() {
            log::info!("  status: VALID");
            return;
        }
        log::warn!("  status: INVALID ({} issues)", self.issue_count());
        let sections: [(&str, usize); 8] = [
            ("tiles with wrong vertex count", self.wrong_vertex_count.len()),
            ("tiles with wrong edge count", self.wrong_edge_count.len()),
            ("edges not joining consecutive vertices", self.disconnected_edges.len()),
            ("edges listing tiles that do not list them", self.unlisted_edges.len()),
            ("edges with more than two tiles", self.overcounted_edges.len()),
            ("vertices without k edges", self.wrong_valence.len()),
            ("irregular visible tiles", self.irregular_tiles.len()),
            ("coincident visible centers", self.coincident_centers.len()),
        ];
        for (label, count) in sections {
            if count > 0 {
                log::warn!("  {label}: {count}");
            }
        }
        if let Some((tile, dev)) = self
            .irregular_tiles
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
        {
            log::warn!("  worst irregularity: tile {tile} off by {dev:.3e}");
        }
    }
}

/// Check structural invariants over the whole graph and geometry over the
/// visible tiles.
pub fn validate(tiling: &Tiling) -> ValidationResult {
    let n = tiling.config().n;
    let k = tiling.config().k;
    let graph = tiling.graph();
    let mut result = ValidationResult {
        num_tiles: tiling.tile_count(),
        num_visible: tiling.visible().len(),
        num_vertices: graph.vertex_count(),
        num_edges: graph.edge_count(),
        fallback_links: tiling.fallback_link_count(),
        anomalies: graph.stats().anomalies(),
        ..Default::default()
    };

    for tile in tiling.tiles() {
        let id = tile.id();
        let (vertices, edges) = (tile.vertices(), tile.edges());
        if vertices.len() != n {
            result.wrong_vertex_count.push((id, vertices.len()));
        }
        if edges.len() != n {
            result.wrong_edge_count.push((id, edges.len()));
        }
        if vertices.len() != edges.len() || vertices.is_empty() {
            continue;
        }
        let m = vertices.len();
        for (i, &e) in edges.iter().enumerate() {
            if !graph.edge(e).joins(vertices[i], vertices[(i + 1) % m]) {
                result.disconnected_edges.push((id, i));
            }
        }
    }

    for (e, edge) in graph.edges() {
        if edge.tiles().len() > 2 {
            result.overcounted_edges.push((e, edge.tiles().len()));
        }
        for &t in edge.tiles() {
            if !tiling.tile(t).edges().contains(&e) {
                result.unlisted_edges.push((e, t));
            }
        }
    }

    for (v, vertex) in graph.vertices() {
        if vertex.is_initialized() && vertex.edges().len() != k {
            result.wrong_valence.push((v, vertex.edges().len()));
        }
    }

    let radius = distance(ORIGIN, inverse_disk_projection(tiling.circumradius(), 0.0));
    for &id in tiling.visible() {
        let center = tiling.tile(id).center();
        let worst = tiling
            .corners(id)
            .iter()
            .map(|&c| (distance(center, c) - radius).abs())
            .fold(0.0, f64::max);
        if worst > REGULARITY_TOLERANCE {
            result.irregular_tiles.push((id, worst));
        }
    }

    let visible = tiling.visible();
    for (i, &a) in visible.iter().enumerate() {
        let ca = tiling.tile(a).center();
        for &b in &visible[i + 1..] {
            if ca.distance_squared(tiling.tile(b).center()) < COINCIDENT_CENTER_TOLERANCE {
                result.coincident_centers.push((a, b));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TilingConfig;
    use glam::DVec2;

    #[test]
    fn test_fresh_tiling_is_valid() {
        let tiling = Tiling::new(TilingConfig::new(4, 5)).unwrap();
        let result = validate(&tiling);
        assert!(result.is_valid(), "{result:?}");
        assert_eq!(result.num_tiles, 1);
        assert_eq!(result.num_visible, 1);
    }

    #[test]
    fn test_expanded_tiling_is_valid() {
        for (n, k) in [(4, 5), (5, 4), (3, 7), (7, 3), (6, 4)] {
            let mut tiling = Tiling::new(TilingConfig::new(n, k)).unwrap();
            let origin = tiling.root();
            tiling.set_start(origin, DVec2::new(0.05, -0.1));
            let result = validate(&tiling);
            assert!(result.is_valid(), "{{{n},{k}}}: {result:?}");
            assert_eq!(result.fallback_links, 0);
            assert_eq!(result.anomalies, 0);
        }
    }

    #[test]
    fn test_detects_coincident_centers() {
        let mut tiling = Tiling::new(TilingConfig::new(4, 5).with_depth(1, 1)).unwrap();
        let origin = tiling.root();
        tiling.set_start(origin, DVec2::ZERO);
        let neighbor = tiling.edge_neighbors(origin)[0];
        tiling.tiles[neighbor.index()].center = tiling.tile(origin).center();

        let result = validate(&tiling);
        assert!(!result.is_valid());
        assert_eq!(result.coincident_centers, vec![(origin, neighbor)]);
        assert_eq!(result.irregular_tiles.len(), 1);
    }

    #[test]
    fn test_detects_broken_boundary() {
        let mut tiling = Tiling::new(TilingConfig::new(4, 5)).unwrap();
        let origin = tiling.root();
        tiling.tiles[origin.index()].edges.swap(0, 1);
        let result = validate(&tiling);
        assert_eq!(result.disconnected_edges, vec![(origin, 0), (origin, 1)]);
    }
}
