//! Geometry on the hyperboloid model of the hyperbolic plane.
//!
//! Points are `glam::DVec3` values on the upper sheet `y² − x² − z² = 1, y > 0`
//! of Minkowski space. Every function here is pure and closed-form; they are
//! the hot-path primitives used to place tiles of a regular `{n,k}` tiling.
//!
//! Inputs are expected to lie on the hyperboloid. Functions that would
//! otherwise produce NaN from accumulated floating point drift clamp to their
//! domain and log a warning instead; the `try_*` variants report the
//! violation as a [`DomainError`].
//!
//! # Example
//!
//! ```
//! use hyperboloid::{distance, extend, minkowski_dot, translate_x, ORIGIN};
//!
//! let a = ORIGIN;
//! let b = translate_x(ORIGIN, 0.5);
//! assert!((minkowski_dot(b, b) - 1.0).abs() < 1e-12);
//!
//! // Reflecting a through b doubles the distance.
//! let c = extend(a, b);
//! assert!((distance(a, c) - 1.0).abs() < 1e-9);
//! ```

mod error;
mod kernel;
mod projection;
mod translate;

pub use error::DomainError;
pub use kernel::*;
pub use projection::*;
pub use translate::*;

use glam::DVec3;

/// The apex of the hyperboloid, `(0, 1, 0)`.
pub const ORIGIN: DVec3 = DVec3::new(0.0, 1.0, 0.0);
