//! Hyperbolic translations (Lorentz boosts) used to place the root tile.
//!
//! Compositions apply right to left: to translate by `A` then `B`, call
//! `B(A(v))`. The two-axis helpers below each have an explicit inverse.

use glam::{DVec2, DVec3};

use crate::{DomainError, ORIGIN};

/// Smallest `1 − a·b` accepted by [`translate_both`] before clamping.
const MIN_SYMMETRIC_DENOM: f64 = 1e-12;

/// Boost along the x axis by hyperbolic distance `dist`.
#[inline]
pub fn translate_x(v: DVec3, dist: f64) -> DVec3 {
    let (si, co) = (dist.sinh(), dist.cosh());
    DVec3::new(co * v.x + si * v.y, si * v.x + co * v.y, v.z)
}

/// Boost along the z axis by hyperbolic distance `dist`.
#[inline]
pub fn translate_z(v: DVec3, dist: f64) -> DVec3 {
    let (si, co) = (dist.sinh(), dist.cosh());
    DVec3::new(v.x, si * v.z + co * v.y, co * v.z + si * v.y)
}

/// Corrected x distance for the symmetric two-axis translation.
///
/// Translating x then z by naive amounts is asymmetric. Requiring the x→z and
/// z→x orders to agree gives `fx = acosh(sqrt((1 + a) / (1 − a·b)))` with
/// `a = sinh²(dx)`, `b = sinh²(dz)`. The result carries the sign of `dx`.
pub fn try_symmetric_x_distance(dx: f64, dz: f64) -> Result<f64, DomainError> {
    let a = dx.sinh().powi(2);
    let b = dz.sinh().powi(2);
    let denom = 1.0 - a * b;
    if !(denom > 0.0) {
        return Err(DomainError::DegenerateTranslation { dx, dz });
    }
    let fx = ((1.0 + a) / denom).sqrt().acosh();
    Ok(if dx > 0.0 { fx } else { -fx })
}

fn symmetric_x_distance(dx: f64, dz: f64) -> f64 {
    match try_symmetric_x_distance(dx, dz) {
        Ok(fx) => fx,
        Err(err) => {
            log::warn!("{err}, clamping correction denominator");
            let a = dx.sinh().powi(2);
            let fx = ((1.0 + a) / MIN_SYMMETRIC_DENOM).sqrt().acosh();
            if dx > 0.0 {
                fx
            } else {
                -fx
            }
        }
    }
}

/// Symmetric translation by `(dx, dz)`: equal positive and negative offsets
/// are mirror images of each other.
pub fn translate_both(v: DVec3, dx: f64, dz: f64) -> DVec3 {
    let fx = symmetric_x_distance(dx, dz);
    translate_z(translate_x(v, fx), dz)
}

/// Inverse of [`translate_both`] for the same `(dx, dz)`.
pub fn reverse_translate_both(v: DVec3, dx: f64, dz: f64) -> DVec3 {
    let fx = symmetric_x_distance(dx, dz);
    translate_x(translate_z(v, -dz), -fx)
}

/// Offsets `(dx, dz)` such that `translate_both(ORIGIN, dx, dz) == v`.
///
/// Every point has such an offset, and it always lies inside the region where
/// [`try_symmetric_x_distance`] succeeds.
pub fn offset_of(v: DVec3) -> DVec2 {
    let fx = v.x.asinh();
    let dz = (v.z / fx.cosh()).asinh();

    let cosh_sq = fx.cosh().powi(2);
    let a = (cosh_sq - 1.0) / (1.0 + cosh_sq * dz.sinh().powi(2));
    let dx = a.max(0.0).sqrt().asinh();
    DVec2::new(if fx > 0.0 { dx } else { -dx }, dz)
}

/// Translation that keeps coordinates: translating the origin by `(x, z)`
/// lands on a point whose x and z coordinates are exactly `x` and `z`.
pub fn translate_preserving(v: DVec3, x: f64, z: f64) -> DVec3 {
    let xdist = x.asinh();
    let zdist = (z / xdist.cosh()).asinh();
    translate_z(translate_x(v, xdist), zdist)
}

/// Inverse of [`translate_preserving`] for the same `(x, z)`.
pub fn reverse_translate_preserving(v: DVec3, x: f64, z: f64) -> DVec3 {
    let xdist = x.asinh();
    let zdist = (z / xdist.cosh()).asinh();
    translate_x(translate_z(v, -zdist), -xdist)
}

/// The point in direction `(x, z)` at hyperbolic distance `sqrt(x² + z²)` from the origin.
pub fn from_origin(x: f64, z: f64) -> DVec3 {
    if x == 0.0 && z == 0.0 {
        return ORIGIN;
    }
    let dist = (x * x + z * z).sqrt();
    let y = dist.cosh();
    let ratio = dist.sinh() / dist;
    DVec3::new(ratio * x, y, ratio * z)
}
