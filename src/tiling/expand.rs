//! Breadth-first re-rooting around the viewer.

use std::f64::consts::TAU;

use glam::{DVec2, DVec3};
use hyperboloid::{
    disk_projection, extend, inverse_disk_projection, reflect_across_bisector, rotate,
    translate_both, ORIGIN,
};

use super::{EdgeId, TileId, TileState, Tiling};
use crate::util::Timed;

/// Counts for one breadth-first round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoundStats {
    pub round: usize,
    /// Whether this round could build tiles.
    pub create: bool,
    pub expanded: usize,
    /// Frontier tiles skipped for lying outside the disk radius.
    pub culled: usize,
    pub created: usize,
    pub fallback_links: usize,
}

/// Summary of a [`Tiling::set_start`] call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SetStartReport {
    pub root: Option<TileId>,
    pub offset: DVec2,
    pub rounds: Vec<RoundStats>,
    pub visible: usize,
}

impl SetStartReport {
    pub fn created(&self) -> usize {
        self.rounds.iter().map(|r| r.created).sum()
    }

    pub fn culled(&self) -> usize {
        self.rounds.iter().map(|r| r.culled).sum()
    }

    pub fn fallback_links(&self) -> usize {
        self.rounds.iter().map(|r| r.fallback_links).sum()
    }
}

impl Tiling {
    /// Re-root the tiling at `tile`, placed at symmetric offset `offset`
    /// from the origin, and expand breadth-first.
    ///
    /// The root's corners are recomputed from the canonical origin tile,
    /// rotated by its stored angle and translated by `offset`. Each of the
    /// `depth` rounds expands the current frontier; the first `create_depth`
    /// rounds may build missing neighbors. Frontier tiles other than the
    /// root are only expanded while some corner lies within `disk_radius`.
    pub fn set_start(&mut self, tile: TileId, offset: DVec2) -> SetStartReport {
        let _timer = Timed::debug("set_start");
        let n = self.config.n;

        let root = &self.tiles[tile.index()];
        let anchor = rotate(inverse_disk_projection(self.circumradius, 0.0), root.angle);
        for (i, &v) in root.vertices.iter().enumerate() {
            let corner = rotate(anchor, i as f64 * TAU / n as f64);
            self.graph
                .set_pos(v, translate_both(corner, offset.x, offset.y));
        }
        self.tiles[tile.index()].center = translate_both(ORIGIN, offset.x, offset.y);

        for &id in &self.state.visible {
            self.tiles[id.index()].state = TileState::Stale;
        }
        self.state.reset(tile);
        self.tiles[tile.index()].state = TileState::Visible;
        self.root = tile;

        let mut report = SetStartReport {
            root: Some(tile),
            offset,
            ..Default::default()
        };
        let mut frontier = std::mem::take(&mut self.state.frontier);
        for round in 0..self.config.depth {
            let mut stats = RoundStats {
                round,
                create: round < self.config.create_depth,
                ..Default::default()
            };
            let mut next = Vec::new();
            let mut created = Vec::new();
            for &t in &frontier {
                if t != tile && !self.within_disk_radius(t) {
                    stats.culled += 1;
                    continue;
                }
                self.expand(t, stats.create, &mut next, &mut created);
                stats.expanded += 1;
            }
            stats.created = created.len();
            stats.fallback_links = self.connect_in_tiles(&created);
            log::trace!("round {round}: {stats:?}");
            report.rounds.push(stats);
            self.state.created.extend(created);
            frontier = next;
        }
        self.state.frontier = frontier;

        self.assign_macro_parent(tile);
        report.visible = self.state.visible.len();
        log::debug!(
            "re-rooted at {tile}: {} visible, {} created, {} culled",
            report.visible,
            report.created(),
            report.culled()
        );
        report
    }

    /// Whether any corner of `tile` projects inside the disk radius.
    pub fn within_disk_radius(&self, tile: TileId) -> bool {
        let radius_sq = self.config.disk_radius * self.config.disk_radius;
        self.tiles[tile.index()].vertices.iter().any(|&v| {
            let p = disk_projection(self.graph.pos(v));
            p.x * p.x + p.z * p.z < radius_sq
        })
    }

    /// Visit every neighbor of `tile`, building missing ones when `create`
    /// is set. Neighbors not yet visible this re-root are marked visible,
    /// repositioned against `tile`, and queued on `next`.
    pub(super) fn expand(
        &mut self,
        tile: TileId,
        create: bool,
        next: &mut Vec<TileId>,
        created: &mut Vec<TileId>,
    ) {
        let edges = self.tiles[tile.index()].edges.clone();
        for edge in edges {
            let neighbor = match self.graph.edge(edge).other_tile(tile) {
                Some(existing) => existing,
                None if create => {
                    let built = self.build_tile_from(tile, edge);
                    created.push(built);
                    built
                }
                None => continue,
            };
            if self.state.mark_visible(neighbor) {
                self.tiles[neighbor.index()].state = TileState::Visible;
                next.push(neighbor);
                self.reposition(neighbor, tile, edge);
            }
        }
    }

    /// Move `tile`'s center and far corners to mirror `reference` across
    /// their shared edge.
    ///
    /// The two shared corners are already placed; the other `n - 2` are
    /// reflected across the perpendicular bisector of the two centers,
    /// walking `tile` clockwise and `reference` counterclockwise in step.
    pub(super) fn reposition(&mut self, tile: TileId, reference: TileId, shared: EdgeId) {
        let n = self.config.n;
        let ref_center = self.tiles[reference.index()].center;
        let center = extend(ref_center, self.graph.edge_midpoint(shared));
        self.tiles[tile.index()].center = center;

        let mut v = self.graph.ordered_vertices(shared, center)[1];
        let mut edge = self.graph.prev(v, shared);
        let mut ref_vertex = v;
        let mut ref_edge = self.graph.next(v, shared);
        for _ in 0..n - 2 {
            v = self.graph.other_end(edge, v);
            ref_vertex = self.graph.other_end(ref_edge, ref_vertex);
            let pos: DVec3 = reflect_across_bisector(self.graph.pos(ref_vertex), ref_center, center);
            self.graph.set_pos(v, pos);
            edge = self.graph.prev(v, edge);
            ref_edge = self.graph.next(ref_vertex, ref_edge);
        }
    }
}
