//! Default parameters for tiling construction and image generation.

/// Sides per tile in the default `{n,k}` tiling.
pub const DEFAULT_N: usize = 4;

/// Tiles meeting at each vertex in the default tiling.
pub const DEFAULT_K: usize = 5;

/// Breadth-first rounds run by each re-root.
pub const DEFAULT_DEPTH: usize = 4;

/// Rounds (counted from the root) that may allocate new tiles.
/// Later rounds only traverse tiles that already exist.
pub const DEFAULT_CREATE_DEPTH: usize = 3;

/// Poincaré-disk radius inside which a frontier tile must have a vertex
/// to be expanded further.
pub const DEFAULT_DISK_RADIUS: f64 = 0.9;

/// Squared Euclidean distance under which two positions are the same point.
pub const DEFAULT_MATCH_TOLERANCE: f64 = hyperboloid::DEFAULT_MATCH_TOLERANCE;

/// Tile-steps from a macro-tile root that still join its batch.
pub const DEFAULT_MACRO_RADIUS: usize = 1;

/// Macro-tiles held for dispatch before the oldest is dropped.
pub const DEFAULT_MAX_PENDING_MACRO: usize = 64;

/// Concurrent image generation workers.
pub const DEFAULT_MAX_WORKERS: usize = 1;

/// Attempts per image request before it is reported failed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Default seed for tile colors.
pub const DEFAULT_SEED: u64 = 0x5eed;

/// Deviation from the circumradius tolerated by validation (hyperbolic units).
pub const REGULARITY_TOLERANCE: f64 = 1e-3;

/// Squared Euclidean distance under which two visible centers count as one tile.
pub const COINCIDENT_CENTER_TOLERANCE: f64 = 1e-6;
