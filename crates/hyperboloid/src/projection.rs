//! Maps between the hyperboloid and Euclidean disk models.

use glam::{DVec2, DVec3};

use crate::DomainError;

/// Largest disk radius [`inverse_disk_projection`] clamps to.
const MAX_DISK_RADIUS: f64 = 1.0 - 1e-9;

/// Which disk model to draw the tiling in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    /// Conformal Poincaré disk (stereographic from `(0, -1, 0)`).
    #[default]
    Poincare,
    /// Beltrami–Klein disk (gnomonic from the origin); geodesics are straight.
    Klein,
}

impl Projection {
    /// Project a hyperboloid point into the unit disk as `(x, z)`.
    pub fn to_disk(self, v: DVec3) -> DVec2 {
        let p = match self {
            Projection::Poincare => disk_projection(v),
            Projection::Klein => klein_projection(v),
        };
        DVec2::new(p.x, p.z)
    }

    /// Lowercase model name, as written to exports.
    pub fn name(self) -> &'static str {
        match self {
            Projection::Poincare => "poincare",
            Projection::Klein => "klein",
        }
    }
}

/// Poincaré projection: `(v.x / (v.y + 1), 0, v.z / (v.y + 1))`.
#[inline]
pub fn disk_projection(v: DVec3) -> DVec3 {
    let denom = v.y + 1.0;
    DVec3::new(v.x / denom, 0.0, v.z / denom)
}

/// Beltrami–Klein projection: `(v.x / v.y, 0, v.z / v.y)`.
#[inline]
pub fn klein_projection(v: DVec3) -> DVec3 {
    DVec3::new(v.x / v.y, 0.0, v.z / v.y)
}

/// Inverse Poincaré projection of the disk point `(a, b)`.
///
/// Fails unless `a² + b² < 1`.
pub fn try_inverse_disk_projection(a: f64, b: f64) -> Result<DVec3, DomainError> {
    let d = a * a + b * b;
    if !(d < 1.0) {
        return Err(DomainError::OutsideDisk { a, b });
    }
    let y = (1.0 + d) / (1.0 - d);
    Ok(DVec3::new(a * (y + 1.0), y, b * (y + 1.0)))
}

/// Inverse Poincaré projection, pulling points on or outside the unit circle
/// back just inside it.
pub fn inverse_disk_projection(a: f64, b: f64) -> DVec3 {
    match try_inverse_disk_projection(a, b) {
        Ok(v) => v,
        Err(err) => {
            log::warn!("{err}, clamping to radius {MAX_DISK_RADIUS}");
            let r = (a * a + b * b).sqrt();
            let (a, b) = if r.is_finite() && r > 0.0 {
                (a / r * MAX_DISK_RADIUS, b / r * MAX_DISK_RADIUS)
            } else {
                (MAX_DISK_RADIUS, 0.0)
            };
            let d = a * a + b * b;
            let y = (1.0 + d) / (1.0 - d);
            DVec3::new(a * (y + 1.0), y, b * (y + 1.0))
        }
    }
}
