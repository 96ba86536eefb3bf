pub mod export;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use glam::DVec2;
use hyperboloid::Projection;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use hypertile::driver::TilingDriver;
use hypertile::tiling::validate;
use hypertile::util::StepTimings;
use hypertile::{Config, TilingError};

/// Kept apart from the tile-color stream so changing the walk leaves colors alone.
const WALK_SEED_SALT: u64 = 0x77a1_6b3e;

/// Largest heading change per step, in radians.
const MAX_TURN: f64 = 0.6;

const IMAGE_TIMEOUT: Duration = Duration::from_secs(120);

/// Headless run settings from the command line.
pub struct WalkOptions {
    pub steps: usize,
    pub step_size: f64,
    pub projection: Projection,
    pub validate: bool,
    pub export: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct WalkTotals {
    switches: usize,
    created: usize,
    fallback_links: usize,
    dispatched: usize,
    images_applied: usize,
    images_failed: usize,
}

/// Walk the viewer through the tiling along a seeded random heading.
///
/// Returns false when validation was requested and found issues.
pub fn run_headless(config: &Config, options: &WalkOptions) -> Result<bool, TilingError> {
    let tiling = &config.tiling;
    println!(
        "Headless walk: {{{},{}}} seed={}, depth={}/{}, steps={}",
        tiling.n, tiling.k, tiling.seed, tiling.depth, tiling.create_depth, options.steps
    );

    print!("Building origin... ");
    let start = Instant::now();
    let mut driver = TilingDriver::new(config)?;
    println!("{:.1}ms", start.elapsed().as_secs_f64() * 1000.0);

    let mut rng = ChaCha8Rng::seed_from_u64(tiling.seed ^ WALK_SEED_SALT);
    let mut heading = rng.gen_range(0.0..std::f64::consts::TAU);
    let mut timings = StepTimings::default();
    let mut totals = WalkTotals::default();

    print!("Walking {} steps... ", options.steps);
    let start = Instant::now();
    for _ in 0..options.steps {
        heading += rng.gen_range(-MAX_TURN..MAX_TURN);
        let delta = DVec2::from_angle(heading) * options.step_size;

        let step_start = Instant::now();
        let report = driver.step(delta);
        timings.record(step_start.elapsed());

        totals.switches += report.switches;
        totals.created += report.created;
        totals.fallback_links += report.fallback_links;
        totals.dispatched += report.dispatched;
        totals.images_applied += report.images_applied;
        totals.images_failed += report.images_failed;
    }
    println!("{:.1}ms", start.elapsed().as_secs_f64() * 1000.0);

    if config.image_gen.is_some() {
        print!("Waiting for images... ");
        let start = Instant::now();
        let (applied, failed) = driver.finish_images(IMAGE_TIMEOUT);
        totals.images_applied += applied;
        totals.images_failed += failed;
        println!("{:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
    }

    print_walk_stats(&driver, &totals, &timings);

    let mut valid = true;
    if options.validate {
        let result = validate(driver.tiling());
        result.log_summary();
        valid = result.is_valid();
        if valid {
            println!("Validation: VALID");
        } else {
            println!("Validation: INVALID ({} issues)", result.issue_count());
        }
    }

    if let Some(path) = &options.export {
        export::export_tiling(&driver, options.projection, path)?;
    }

    Ok(valid)
}

fn print_walk_stats(driver: &TilingDriver, totals: &WalkTotals, timings: &StepTimings) {
    let tiling = driver.tiling();
    let graph = tiling.graph();
    let stats = graph.stats();

    println!("\n=== Walk Statistics ===");
    println!(
        "  Tiles: {} built, {} visible, root {}",
        tiling.tile_count(),
        tiling.visible().len(),
        tiling.root()
    );
    println!(
        "  Graph: {} vertices, {} edges, {} merges",
        graph.vertex_count(),
        graph.edge_count(),
        stats.merges
    );
    println!(
        "  Root switches: {} (final offset {:.4}, {:.4})",
        totals.switches,
        driver.navigator().offset().x,
        driver.navigator().offset().y
    );
    println!("  Tiles created while walking: {}", totals.created);
    if totals.fallback_links > 0 || stats.anomalies() > 0 {
        println!(
            "  Drift: {} fallback links, {} refused associations",
            totals.fallback_links,
            stats.anomalies()
        );
    }
    println!(
        "  Step time: mean {:.3}ms, max {:.3}ms over {} steps",
        timings.mean().as_secs_f64() * 1000.0,
        timings.max().as_secs_f64() * 1000.0,
        timings.count()
    );
    if totals.dispatched > 0 || tiling.pending_macro_tiles() > 0 {
        println!(
            "  Macro-tiles: {} dispatched, {} queued; images {} applied, {} failed",
            totals.dispatched,
            tiling.pending_macro_tiles(),
            totals.images_applied,
            totals.images_failed
        );
    }
}
