mod app;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use hyperboloid::Projection;

use app::WalkOptions;
use hypertile::{Config, ImageGenConfig, TilingError};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliProjection {
    Poincare,
    Klein,
}

impl From<CliProjection> for Projection {
    fn from(value: CliProjection) -> Self {
        match value {
            CliProjection::Poincare => Projection::Poincare,
            CliProjection::Klein => Projection::Klein,
        }
    }
}

/// Hypertile - procedurally expanding hyperbolic tilings
#[derive(Parser, Debug)]
#[command(name = "hypertile", version, about)]
struct Cli {
    /// Sides per tile
    #[arg(long)]
    n: Option<usize>,

    /// Tiles meeting at each vertex
    #[arg(long)]
    k: Option<usize>,

    /// Breadth-first rounds per re-root
    #[arg(long)]
    depth: Option<usize>,

    /// Leading rounds that may build new tiles
    #[arg(long)]
    create_depth: Option<usize>,

    /// Number of random-walk steps
    #[arg(long, default_value_t = 200)]
    steps: usize,

    /// Distance moved per step, in translation-parameter units
    #[arg(long, default_value_t = 0.05)]
    step_size: f64,

    /// Random seed for tile colors and the walk
    #[arg(long)]
    seed: Option<u64>,

    /// JSON config file; command-line values override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Export the final visible tiles (supports .json and .json.gz)
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Disk model used for export
    #[arg(long, value_enum, default_value_t = CliProjection::Poincare)]
    projection: CliProjection,

    /// Check graph and geometry invariants after the walk
    #[arg(long)]
    validate: bool,

    /// External program that renders macro-tile images
    #[arg(long, value_name = "PROGRAM")]
    image_program: Option<PathBuf>,

    /// Directory the image program writes into
    #[arg(long, value_name = "DIR")]
    image_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Returns false when validation was requested and found issues.
fn run(cli: &Cli) -> Result<bool, TilingError> {
    let config = build_config(cli)?;
    let options = WalkOptions {
        steps: cli.steps,
        step_size: cli.step_size,
        projection: cli.projection.into(),
        validate: cli.validate,
        export: cli.export.clone(),
    };
    app::run_headless(&config, &options)
}

fn build_config(cli: &Cli) -> Result<Config, TilingError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let tiling = &mut config.tiling;
    if let Some(n) = cli.n {
        tiling.n = n;
    }
    if let Some(k) = cli.k {
        tiling.k = k;
    }
    if let Some(depth) = cli.depth {
        tiling.depth = depth;
    }
    if let Some(create_depth) = cli.create_depth {
        tiling.create_depth = create_depth;
    }
    match cli.seed {
        Some(seed) => tiling.seed = seed,
        None if cli.config.is_none() => tiling.seed = rand::random(),
        None => {}
    }

    if let Some(program) = &cli.image_program {
        let image_gen = config.image_gen.get_or_insert_with(ImageGenConfig::default);
        image_gen.program = program.clone();
    }
    if let Some(dir) = &cli.image_dir {
        match config.image_gen.as_mut() {
            Some(image_gen) => image_gen.output_dir = dir.clone(),
            None => log::warn!("--image-dir ignored without an image program"),
        }
    }

    config.validate()?;
    Ok(config)
}
