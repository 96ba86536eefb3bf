//! Tiling and image generation parameters.
//!
//! Every field has a default, so a JSON config only needs the values it
//! overrides:
//!
//! ```json
//! { "tiling": { "n": 6, "k": 4, "depth": 5 } }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::tiling::constants::*;
use crate::TilingError;

/// Shape of the tiling and bounds of each breadth-first re-root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilingConfig {
    /// Sides per tile.
    pub n: usize,
    /// Tiles meeting at each vertex.
    pub k: usize,
    /// Breadth-first rounds per re-root.
    pub depth: usize,
    /// Rounds that may create tiles; `depth - create_depth` outer rounds only traverse.
    pub create_depth: usize,
    /// Poincaré radius a frontier tile must reach into to keep expanding.
    pub disk_radius: f64,
    /// Squared-distance threshold for treating two positions as the same.
    pub match_tolerance: f64,
    /// Tile-steps from a macro-tile root that join its batch.
    pub macro_radius: usize,
    /// Queued macro-tiles kept when nothing is dispatching them.
    pub max_pending_macro: usize,
    /// Seed for tile colors.
    pub seed: u64,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            n: DEFAULT_N,
            k: DEFAULT_K,
            depth: DEFAULT_DEPTH,
            create_depth: DEFAULT_CREATE_DEPTH,
            disk_radius: DEFAULT_DISK_RADIUS,
            match_tolerance: DEFAULT_MATCH_TOLERANCE,
            macro_radius: DEFAULT_MACRO_RADIUS,
            max_pending_macro: DEFAULT_MAX_PENDING_MACRO,
            seed: DEFAULT_SEED,
        }
    }
}

impl TilingConfig {
    /// Config for the regular `{n,k}` tiling with default bounds.
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            ..Default::default()
        }
    }

    pub fn with_depth(mut self, depth: usize, create_depth: usize) -> Self {
        self.depth = depth;
        self.create_depth = create_depth;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), TilingError> {
        let invalid = |msg: String| Err(TilingError::InvalidConfig(msg));
        if self.n < 3 || self.k < 3 {
            return invalid(format!(
                "{{{},{}}} needs at least 3 sides and 3 tiles per vertex",
                self.n, self.k
            ));
        }
        if (self.n - 2) * (self.k - 2) <= 4 {
            return invalid(format!(
                "{{{},{}}} is not hyperbolic: (n-2)(k-2) must exceed 4",
                self.n, self.k
            ));
        }
        if self.depth == 0 {
            return invalid("depth must be at least 1".to_string());
        }
        if self.create_depth > self.depth {
            return invalid(format!(
                "create_depth {} exceeds depth {}",
                self.create_depth, self.depth
            ));
        }
        if !(self.disk_radius > 0.0 && self.disk_radius <= 1.0) {
            return invalid(format!("disk_radius {} outside (0, 1]", self.disk_radius));
        }
        if !(self.match_tolerance > 0.0) {
            return invalid(format!(
                "match_tolerance {} must be positive",
                self.match_tolerance
            ));
        }
        if self.max_pending_macro == 0 {
            return invalid("max_pending_macro must be at least 1".to_string());
        }
        Ok(())
    }
}

/// External image generator settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageGenConfig {
    /// Program invoked once per macro-tile.
    pub program: PathBuf,
    /// Arguments placed before the generated tile arguments.
    pub args: Vec<String>,
    /// Directory the program writes `tile<id>.png` files into.
    pub output_dir: PathBuf,
    pub max_workers: usize,
    pub max_attempts: u32,
}

impl Default for ImageGenConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::new(),
            args: Vec::new(),
            output_dir: PathBuf::from("."),
            max_workers: DEFAULT_MAX_WORKERS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ImageGenConfig {
    pub fn validate(&self) -> Result<(), TilingError> {
        if self.program.as_os_str().is_empty() {
            return Err(TilingError::InvalidConfig(
                "image generator program is empty".to_string(),
            ));
        }
        if self.max_workers == 0 {
            return Err(TilingError::InvalidConfig(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(TilingError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tiling: TilingConfig,
    pub image_gen: Option<ImageGenConfig>,
}

impl Config {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, TilingError> {
        let text = std::fs::read_to_string(path).map_err(|e| TilingError::io(path, e))?;
        let config = Self::from_json(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, TilingError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TilingError> {
        self.tiling.validate()?;
        if let Some(image_gen) = &self.image_gen {
            image_gen.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tiling.n, 4);
        assert_eq!(config.tiling.k, 5);
        assert!(config.image_gen.is_none());
    }

    #[test]
    fn test_rejects_euclidean_and_spherical_pairs() {
        for (n, k) in [(4, 4), (6, 3), (3, 6), (3, 5), (5, 3)] {
            let err = TilingConfig::new(n, k).validate();
            assert!(
                matches!(err, Err(TilingError::InvalidConfig(_))),
                "{{{n},{k}}} should be rejected"
            );
        }
        assert!(TilingConfig::new(2, 9).validate().is_err());
        assert!(TilingConfig::new(3, 7).validate().is_ok());
        assert!(TilingConfig::new(7, 3).validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_bounds() {
        assert!(TilingConfig::default().with_depth(0, 0).validate().is_err());
        assert!(TilingConfig::default().with_depth(2, 3).validate().is_err());
        let mut config = TilingConfig::default();
        config.disk_radius = 1.5;
        assert!(config.validate().is_err());
        config.disk_radius = 0.9;
        config.match_tolerance = 0.0;
        assert!(config.validate().is_err());
        config.match_tolerance = DEFAULT_MATCH_TOLERANCE;
        config.max_pending_macro = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = Config::from_json(r#"{ "tiling": { "n": 6, "k": 4, "seed": 7 } }"#).unwrap();
        assert_eq!(config.tiling.n, 6);
        assert_eq!(config.tiling.k, 4);
        assert_eq!(config.tiling.seed, 7);
        assert_eq!(config.tiling.depth, DEFAULT_DEPTH);
    }

    #[test]
    fn test_json_image_gen_section() {
        let config = Config::from_json(
            r#"{ "image_gen": { "program": "gen.sh", "output_dir": "/tmp/tiles", "max_workers": 3 } }"#,
        )
        .unwrap();
        let image_gen = config.image_gen.unwrap();
        assert_eq!(image_gen.program, PathBuf::from("gen.sh"));
        assert_eq!(image_gen.max_workers, 3);
        assert_eq!(image_gen.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_invalid_json_section_is_rejected() {
        let err = Config::from_json(r#"{ "image_gen": { "program": "" } }"#);
        assert!(matches!(err, Err(TilingError::InvalidConfig(_))));
        assert!(matches!(Config::from_json("{ nope"), Err(TilingError::Json(_))));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = Config::load(Path::new("/definitely/not/here.json"));
        assert!(matches!(err, Err(TilingError::Io { .. })));
    }
}
