//! Position-based neighbor scan over freshly built tiles.
//!
//! Edge merging is the authority on adjacency. This pass looks for a visible
//! tile sitting where a missing neighbor of a new tile would be; finding one
//! means two construction paths reached the same place without meeting in
//! the graph. The pair is linked both ways so traversal still sees it, and
//! the drift is logged.

use hyperboloid::{approximately_equal, extend};

use super::{TileId, Tiling};

impl Tiling {
    /// Link each tile in `created` to any visible tile found at one of its
    /// unbuilt neighbor positions. Returns the number of new links.
    pub(super) fn connect_in_tiles(&mut self, created: &[TileId]) -> usize {
        let tolerance = self.config.match_tolerance;
        let mut links = 0;
        for &tile in created {
            let center = self.tiles[tile.index()].center;
            let open_edges: Vec<_> = self.tiles[tile.index()]
                .edges
                .iter()
                .copied()
                .filter(|&e| self.graph.edge(e).tiles().len() < 2)
                .collect();
            for edge in open_edges {
                let predicted = extend(center, self.graph.edge_midpoint(edge));
                let found = self.state.visible.iter().copied().find(|&other| {
                    other != tile
                        && !self.tiles[tile.index()].fallback_links.contains(&other)
                        && approximately_equal(self.tiles[other.index()].center, predicted, tolerance)
                });
                let Some(other) = found else {
                    continue;
                };
                log::warn!(
                    "tile {other} sits across open edge {edge} of {tile} without sharing it, linking by position"
                );
                self.tiles[tile.index()].fallback_links.push(other);
                if !self.tiles[other.index()].fallback_links.contains(&tile) {
                    self.tiles[other.index()].fallback_links.push(tile);
                }
                links += 1;
            }
        }
        self.fallback_links += links;
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TilingConfig;
    use glam::DVec2;
    use hyperboloid::ORIGIN;

    #[test]
    fn test_consistent_graph_needs_no_links() {
        let mut tiling = Tiling::new(TilingConfig::new(4, 5).with_depth(3, 3)).unwrap();
        let origin = tiling.root();
        let report = tiling.set_start(origin, DVec2::ZERO);
        assert_eq!(report.fallback_links(), 0);
        let created = tiling.state().created().to_vec();
        assert_eq!(tiling.connect_in_tiles(&created), 0);
    }

    #[test]
    fn test_tile_at_predicted_position_is_linked() {
        let mut tiling = Tiling::new(TilingConfig::new(4, 5).with_depth(1, 1)).unwrap();
        let origin = tiling.root();
        tiling.set_start(origin, DVec2::ZERO);
        let first = tiling.edge_neighbors(origin)[0];

        // A stray tile placed where `first` has an unbuilt neighbor
        let open = tiling
            .tile(first)
            .edges()
            .iter()
            .copied()
            .find(|&e| tiling.graph().edge(e).tiles().len() < 2)
            .unwrap();
        let predicted = extend(tiling.tile(first).center(), tiling.graph().edge_midpoint(open));
        let stray = tiling.alloc_tile(predicted);
        tiling.state.mark_visible(stray);

        assert_eq!(tiling.connect_in_tiles(&[first]), 1);
        assert_eq!(tiling.tile(first).fallback_links(), &[stray]);
        assert_eq!(tiling.tile(stray).fallback_links(), &[first]);
        assert!(tiling.neighbors(first).contains(&stray));
        assert!(!tiling.edge_neighbors(first).contains(&stray));
        assert_eq!(tiling.fallback_link_count(), 1);
        // Already linked, nothing new
        assert_eq!(tiling.connect_in_tiles(&[first]), 0);
        assert_ne!(tiling.tile(stray).center(), ORIGIN);
    }
}
