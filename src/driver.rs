//! Per-step orchestration: navigation, re-rooting, and image bookkeeping.

use std::sync::Arc;
use std::time::Duration;

use glam::{DVec2, DVec3};
use hyperboloid::{
    inverse_disk_projection, offset_of, reverse_translate_both, rotate, translate_both,
    translate_x, translate_z, Projection, ORIGIN,
};
use ordered_float::OrderedFloat;

use crate::config::{Config, ImageGenConfig, TilingConfig};
use crate::imagegen::{CommandGenerator, ImageEvent, ImageGenerator, ImagePool, ImageRequest};
use crate::render::{visible_tiles, TileMesh, VisibleTile};
use crate::tiling::{SetStartReport, TileId, Tiling};
use crate::TilingError;

/// Tracks where the root tile sits relative to the viewer.
///
/// The viewer is always at the origin of the hyperboloid. The root tile's
/// center is `translate_both(ORIGIN, offset.x, offset.y)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Navigator {
    offset: DVec2,
}

/// Outcome of one navigation step.
#[derive(Clone, Debug, PartialEq)]
pub struct NavigationStep {
    /// The last re-root of the step.
    pub report: SetStartReport,
    /// New root, when the viewer crossed into another tile.
    pub switched: Option<TileId>,
    /// Root changes made during the step.
    pub switches: usize,
    /// Tiles built over every re-root of the step.
    pub created: usize,
    pub fallback_links: usize,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> DVec2 {
        self.offset
    }

    /// Move the root by `delta` and re-root.
    ///
    /// The move is applied as a boost of the root's frame, x then z, and the
    /// offset and angle are read back from the moved center and first corner.
    /// Afterwards the root hands over to its closest edge neighbor for as
    /// long as one is closer to the viewer, so the step ends on the tile
    /// containing the viewer however far it moved.
    pub fn step(&mut self, tiling: &mut Tiling, delta: DVec2) -> NavigationStep {
        let root = tiling.root();
        let anchor = rotate(
            inverse_disk_projection(tiling.circumradius(), 0.0),
            tiling.tile(root).angle(),
        );
        let center = boost(translate_both(ORIGIN, self.offset.x, self.offset.y), delta);
        let corner = boost(translate_both(anchor, self.offset.x, self.offset.y), delta);
        let (offset, angle) = frame_of(center, corner);
        tiling.set_angle(root, angle);
        self.offset = offset;

        let mut report = tiling.set_start(root, offset);
        let mut step = NavigationStep {
            created: report.created(),
            fallback_links: report.fallback_links(),
            report: SetStartReport::default(),
            switched: None,
            switches: 0,
        };
        while let Some(next) = closer_neighbor(tiling) {
            let tile = tiling.tile(next);
            let (offset, angle) = frame_of(tile.center(), tiling.graph().pos(tile.vertices()[0]));
            tiling.set_angle(next, angle);
            self.offset = offset;
            log::debug!("crossing from {} into {next}", tiling.root());

            report = tiling.set_start(next, offset);
            step.created += report.created();
            step.fallback_links += report.fallback_links();
            step.switched = Some(next);
            step.switches += 1;
        }
        step.report = report;
        step
    }
}

/// Boost `v` along x by `delta.x`, then along z by `delta.y`.
fn boost(v: DVec3, delta: DVec2) -> DVec3 {
    translate_z(translate_x(v, delta.x), delta.y)
}

/// Offset and angle that `set_start` needs to put a tile's center at
/// `center` and its vertex 0 at `corner`.
fn frame_of(center: DVec3, corner: DVec3) -> (DVec2, f64) {
    let offset = offset_of(center);
    let local = reverse_translate_both(corner, offset.x, offset.y);
    (offset, local.z.atan2(local.x))
}

/// Height a neighbor must gain on the root before the root hands over.
const SWITCH_MARGIN: f64 = 1e-9;

/// The edge neighbor of the root nearest the viewer, if nearer than the root.
fn closer_neighbor(tiling: &Tiling) -> Option<TileId> {
    let root = tiling.root();
    let root_height = tiling.tile(root).center().y;
    tiling
        .edge_neighbors(root)
        .into_iter()
        .filter(|&t| tiling.tile(t).center().y < root_height - SWITCH_MARGIN)
        .min_by_key(|&t| OrderedFloat(tiling.tile(t).center().y))
}

/// What happened during one [`TilingDriver::step`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    pub root: Option<TileId>,
    pub switched: bool,
    pub switches: usize,
    pub visible: usize,
    pub created: usize,
    pub fallback_links: usize,
    /// Macro-tile requests handed to the image pool.
    pub dispatched: usize,
    pub images_applied: usize,
    pub images_failed: usize,
}

/// Owns a tiling, the viewer position, and optional image generation.
pub struct TilingDriver {
    tiling: Tiling,
    navigator: Navigator,
    images: Option<ImagePool>,
}

impl TilingDriver {
    /// Driver for `config`, running the configured image program if any.
    pub fn new(config: &Config) -> Result<Self, TilingError> {
        config.validate()?;
        let images = config.image_gen.as_ref().map(pool_for);
        Self::build(config.tiling.clone(), images)
    }

    /// Driver using a custom image generator.
    pub fn with_generator(
        config: TilingConfig,
        generator: Arc<dyn ImageGenerator>,
        max_workers: usize,
        max_attempts: u32,
    ) -> Result<Self, TilingError> {
        Self::build(config, Some(ImagePool::new(generator, max_workers, max_attempts)))
    }

    fn build(config: TilingConfig, images: Option<ImagePool>) -> Result<Self, TilingError> {
        let mut tiling = Tiling::new(config)?;
        let origin = tiling.root();
        tiling.set_start(origin, DVec2::ZERO);
        let mut driver = Self {
            tiling,
            navigator: Navigator::new(),
            images,
        };
        driver.dispatch_macro_tiles();
        Ok(driver)
    }

    pub fn tiling(&self) -> &Tiling {
        &self.tiling
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Move the viewer by `delta`, re-root, and exchange image work.
    pub fn step(&mut self, delta: DVec2) -> StepReport {
        let nav = self.navigator.step(&mut self.tiling, delta);
        let mut report = StepReport {
            root: Some(self.tiling.root()),
            switched: nav.switched.is_some(),
            switches: nav.switches,
            visible: nav.report.visible,
            created: nav.created,
            fallback_links: nav.fallback_links,
            ..Default::default()
        };
        report.dispatched = self.dispatch_macro_tiles();
        if let Some(pool) = self.images.as_mut() {
            let events = pool.poll();
            let (applied, failed) = apply_events(&mut self.tiling, events);
            report.images_applied = applied;
            report.images_failed = failed;
        }
        report
    }

    /// Block until outstanding image requests finish or `timeout` passes.
    /// Returns `(applied, failed)` image counts.
    pub fn finish_images(&mut self, timeout: Duration) -> (usize, usize) {
        match self.images.as_mut() {
            Some(pool) => {
                let events = pool.wait_idle(timeout);
                apply_events(&mut self.tiling, events)
            }
            None => (0, 0),
        }
    }

    pub fn visible_tiles(&self, projection: Projection) -> Vec<VisibleTile> {
        visible_tiles(&self.tiling, projection)
    }

    pub fn mesh(&self, projection: Projection) -> TileMesh {
        TileMesh::build(&self.visible_tiles(projection))
    }

    /// Hand every pending macro-tile to the pool. Without a pool they stay queued.
    fn dispatch_macro_tiles(&mut self) -> usize {
        let Some(pool) = self.images.as_mut() else {
            return 0;
        };
        let mut dispatched = 0;
        while let Some(batch) = self.tiling.next_macro_tile() {
            pool.submit(ImageRequest::from(&batch));
            dispatched += 1;
        }
        dispatched
    }
}

fn pool_for(config: &ImageGenConfig) -> ImagePool {
    ImagePool::new(
        Arc::new(CommandGenerator::new(config.clone())),
        config.max_workers,
        config.max_attempts,
    )
}

fn apply_events(tiling: &mut Tiling, events: Vec<ImageEvent>) -> (usize, usize) {
    let (mut applied, mut failed) = (0, 0);
    for event in events {
        match event {
            ImageEvent::Ready { images } => {
                for (image_id, handle) in images {
                    if tiling.apply_image(image_id, handle) {
                        applied += 1;
                    }
                }
            }
            ImageEvent::Failed { image_ids, .. } => {
                for image_id in image_ids {
                    if tiling.image_failed(image_id) {
                        failed += 1;
                    }
                }
            }
        }
    }
    (applied, failed)
}
