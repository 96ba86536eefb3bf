//! Visible-tile snapshot export for external analysis.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use flate2::write::GzEncoder;
use flate2::Compression;
use hyperboloid::Projection;
use serde::Serialize;

use hypertile::driver::TilingDriver;
use hypertile::render::VisibleTile;
use hypertile::TilingError;

/// Export the visible tiles to a JSON file (optionally gzipped).
pub fn export_tiling(
    driver: &TilingDriver,
    projection: Projection,
    path: &Path,
) -> Result<(), TilingError> {
    print!("Exporting to {}... ", path.display());
    let start = Instant::now();

    let data = TilingExport::from_driver(driver, projection);
    let file = File::create(path).map_err(|e| TilingError::io(path, e))?;

    let is_gzip = path.extension().map(|ext| ext == "gz").unwrap_or(false);
    if is_gzip {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(&mut encoder, &data)?;
        let mut writer = encoder.finish().map_err(|e| TilingError::io(path, e))?;
        writer.flush().map_err(|e| TilingError::io(path, e))?;
    } else {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &data)?;
        writer.flush().map_err(|e| TilingError::io(path, e))?;
    }

    println!("{:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
    Ok(())
}

#[derive(Serialize)]
struct TilingExport {
    metadata: Metadata,
    tiles: Vec<TileData>,
}

#[derive(Serialize)]
struct Metadata {
    seed: u64,
    n: usize,
    k: usize,
    depth: usize,
    create_depth: usize,
    projection: &'static str,
    root: u32,
    offset: [f64; 2],
    circumradius: f64,
    num_tiles: usize,
    num_visible: usize,
    num_vertices: usize,
    num_edges: usize,
    fallback_links: usize,
}

#[derive(Serialize)]
struct TileData {
    id: u32,
    center: [f64; 2],
    corners: Vec<[f64; 2]>,
    color: [f32; 4],
    #[serde(skip_serializing_if = "Option::is_none")]
    image_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    texture: Option<String>,
    placeholder: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<u32>,
}

impl TilingExport {
    fn from_driver(driver: &TilingDriver, projection: Projection) -> Self {
        let tiling = driver.tiling();
        let config = tiling.config();
        let offset = driver.navigator().offset();
        let metadata = Metadata {
            seed: config.seed,
            n: config.n,
            k: config.k,
            depth: config.depth,
            create_depth: config.create_depth,
            projection: projection.name(),
            root: tiling.root().0,
            offset: [offset.x, offset.y],
            circumradius: tiling.circumradius(),
            num_tiles: tiling.tile_count(),
            num_visible: tiling.visible().len(),
            num_vertices: tiling.graph().vertex_count(),
            num_edges: tiling.graph().edge_count(),
            fallback_links: tiling.fallback_link_count(),
        };

        let tiles = driver
            .visible_tiles(projection)
            .into_iter()
            .map(|visible| TileData::new(driver, visible))
            .collect();

        Self { metadata, tiles }
    }
}

impl TileData {
    fn new(driver: &TilingDriver, visible: VisibleTile) -> Self {
        let tile = driver.tiling().tile(visible.id);
        Self {
            id: visible.id.0,
            center: visible.center.to_array(),
            corners: visible.corners.iter().map(|c| c.to_array()).collect(),
            color: visible.color,
            image_id: tile.image_id(),
            texture: visible
                .texture
                .map(|handle| handle.path().display().to_string()),
            placeholder: visible.placeholder,
            parent: tile.parent().map(|p| p.0),
        }
    }
}
