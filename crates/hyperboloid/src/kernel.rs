//! Core hyperboloid operations: inner product, distances, geodesics.

use std::f64::consts::{FRAC_PI_2, PI};

use glam::DVec3;

/// Default squared-Euclidean threshold for [`approximately_equal`].
///
/// Large enough to absorb the drift of many chained [`extend`] calls, small
/// enough that distinct tile centers near the viewer never compare equal.
pub const DEFAULT_MATCH_TOLERANCE: f64 = 0.1;

/// Minkowski dot products below `1 - DRIFT_WARN_EPSILON` are reported when
/// clamped by [`distance`]; smaller shortfalls are ordinary rounding.
const DRIFT_WARN_EPSILON: f64 = 1e-6;

/// Evaluate the hyperboloid form `y² − x² − z²`.
///
/// Equals `1` for points on the surface and is negative for spacelike vectors
/// such as the difference of two surface points.
#[inline]
pub fn hyperboloid_eval(v: DVec3) -> f64 {
    v.y * v.y - v.x * v.x - v.z * v.z
}

/// Minkowski inner product `a.y·b.y − a.x·b.x − a.z·b.z`.
#[inline]
pub fn minkowski_dot(a: DVec3, b: DVec3) -> f64 {
    a.y * b.y - a.x * b.x - a.z * b.z
}

/// Rescale `v` along its ray so that `|⟨v, v⟩| = 1`.
#[inline]
pub fn normalize(v: DVec3) -> DVec3 {
    v / hyperboloid_eval(v).abs().sqrt()
}

/// Midpoint of the geodesic segment joining `a` and `b`.
#[inline]
pub fn midpoint(a: DVec3, b: DVec3) -> DVec3 {
    normalize((a + b) * 0.5)
}

/// Hyperbolic distance between two surface points.
///
/// `⟨a, b⟩ ≥ 1` holds exactly for surface points; drift below 1 is clamped
/// to a distance of zero.
pub fn distance(a: DVec3, b: DVec3) -> f64 {
    let dot = minkowski_dot(a, b);
    if dot < 1.0 {
        if dot < 1.0 - DRIFT_WARN_EPSILON || dot.is_nan() {
            log::warn!("acosh argument {dot} below domain, clamping distance to 0");
        }
        return 0.0;
    }
    dot.acosh()
}

/// Project `a` onto the line through the origin and `b` under the Minkowski form.
#[inline]
pub fn minkowski_projection(a: DVec3, b: DVec3) -> DVec3 {
    b * (minkowski_dot(a, b) / minkowski_dot(b, b))
}

/// Squared tangent length below which two points count as coincident.
const COINCIDENT_EPSILON: f64 = 1e-20;

/// Unit tangent at `a` pointing along the geodesic toward `b`, or `None`
/// when the points coincide and no direction exists.
#[inline]
fn tangent_toward(a: DVec3, b: DVec3) -> Option<DVec3> {
    let diff = b - minkowski_projection(b, a);
    let norm_sq = -hyperboloid_eval(diff);
    (norm_sq > COINCIDENT_EPSILON).then(|| diff / norm_sq.sqrt())
}

/// Extend `a` through `b` to the point `c` whose geodesic midpoint with `a` is `b`.
///
/// Equivalently, the point reflection of `a` through `b`. Extending through
/// itself returns `a`.
pub fn extend(a: DVec3, b: DVec3) -> DVec3 {
    let Some(proj) = tangent_toward(a, b) else {
        return a;
    };
    let w = distance(a, b);
    a * (2.0 * w).cosh() + proj * (2.0 * w).sinh()
}

/// The point at distance `d` from `a` along the geodesic from `a` toward `b`.
pub fn line(a: DVec3, b: DVec3, d: f64) -> DVec3 {
    let Some(proj) = tangent_toward(a, b) else {
        return a;
    };
    a * d.cosh() + proj * d.sinh()
}

/// Reflect `x` across the geodesic that perpendicularly bisects `pq`.
///
/// The reflection swaps `p` and `q` and fixes every point equidistant from
/// both, so mirroring a tile's vertices across the bisector of its center
/// and a neighbor's center yields the neighbor's vertices. A degenerate
/// segment (`p == q`) leaves `x` unchanged.
pub fn reflect_across_bisector(x: DVec3, p: DVec3, q: DVec3) -> DVec3 {
    let diff = p - q;
    let norm_sq = -hyperboloid_eval(diff);
    if norm_sq <= 0.0 {
        if norm_sq < 0.0 {
            log::warn!("bisector of non-spacelike segment (form {norm_sq}), skipping reflection");
        }
        return x;
    }
    let u = diff / norm_sq.sqrt();
    x + u * (2.0 * minkowski_dot(x, u))
}

/// Whether two points are within `tolerance` squared Euclidean distance.
///
/// Used to recognise the same vertex or tile center reached along different
/// construction paths.
#[inline]
pub fn approximately_equal(a: DVec3, b: DVec3, tolerance: f64) -> bool {
    a.distance_squared(b) < tolerance
}

/// Counterclockwise rotation about the vertical axis, preserving `y`.
#[inline]
pub fn rotate(v: DVec3, angle: f64) -> DVec3 {
    let (sin, cos) = angle.sin_cos();
    DVec3::new(v.x * cos - v.z * sin, v.y, v.x * sin + v.z * cos)
}

/// Poincaré-disk radius of the circumcircle of a tile in the regular `{n,k}` tiling.
///
/// `n` sides per tile, `k` tiles per vertex. Only meaningful for hyperbolic
/// pairs, `(n − 2)(k − 2) > 4`.
pub fn circumradius(n: usize, k: usize) -> f64 {
    let vertex_term = (FRAC_PI_2 - PI / k as f64).tan();
    let side_term = (PI / n as f64).tan();
    ((vertex_term - side_term) / (vertex_term + side_term)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{translate_x, translate_z, ORIGIN};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_origin_on_hyperboloid() {
        assert_eq!(hyperboloid_eval(ORIGIN), 1.0);
        assert_eq!(minkowski_dot(ORIGIN, ORIGIN), 1.0);
    }

    #[test]
    fn test_normalize_projects_ray_onto_surface() {
        let v = DVec3::new(0.3, 2.0, -0.4) * 3.7;
        let n = normalize(v);
        assert_abs_diff_eq!(hyperboloid_eval(n), 1.0, epsilon = 1e-12);
        // Same ray
        assert_abs_diff_eq!(n.x / n.y, v.x / v.y, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_along_axis() {
        let p = translate_x(ORIGIN, 1.25);
        assert_abs_diff_eq!(distance(ORIGIN, p), 1.25, epsilon = 1e-9);
        // acosh(1 + ε) ≈ sqrt(2ε), so rounding shows up around 1e-8
        assert_abs_diff_eq!(distance(p, p), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_distance_clamps_drift() {
        // Slightly off the surface so the dot product dips below 1
        let a = ORIGIN * 0.999;
        assert_eq!(distance(a, a), 0.0);
    }

    #[test]
    fn test_extend_through_self_is_identity() {
        let a = translate_z(ORIGIN, 0.4);
        assert!(extend(a, a).abs_diff_eq(a, 1e-12));
    }

    #[test]
    fn test_line_reaches_requested_distance() {
        let a = translate_x(ORIGIN, -0.3);
        let b = translate_z(ORIGIN, 0.8);
        let c = line(a, b, 2.0);
        assert_abs_diff_eq!(distance(a, c), 2.0, epsilon = 1e-9);
        // c stays on the geodesic through a and b
        let on_line = line(a, c, distance(a, b));
        assert!(on_line.abs_diff_eq(b, 1e-9));
    }

    #[test]
    fn test_reflection_swaps_endpoints() {
        let p = translate_x(ORIGIN, 0.7);
        let q = translate_z(ORIGIN, -0.2);
        assert!(reflect_across_bisector(p, p, q).abs_diff_eq(q, 1e-9));
        assert!(reflect_across_bisector(q, p, q).abs_diff_eq(p, 1e-9));
    }

    #[test]
    fn test_reflection_preserves_distances() {
        let p = translate_x(ORIGIN, 0.5);
        let q = translate_x(ORIGIN, -0.5);
        let x = translate_z(translate_x(ORIGIN, 0.9), 0.3);
        let y = reflect_across_bisector(x, p, q);
        assert_abs_diff_eq!(distance(x, p), distance(y, q), epsilon = 1e-9);
        assert_abs_diff_eq!(distance(x, q), distance(y, p), epsilon = 1e-9);
        assert_abs_diff_eq!(hyperboloid_eval(y), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let v = DVec3::new(1.0, 2.0_f64.sqrt(), 0.0);
        let r = rotate(v, FRAC_PI_2);
        assert!(r.abs_diff_eq(DVec3::new(0.0, 2.0_f64.sqrt(), 1.0), 1e-12));
    }

    #[test]
    fn test_approximately_equal_threshold() {
        let a = ORIGIN;
        assert!(approximately_equal(a, a + DVec3::new(0.2, 0.0, 0.0), DEFAULT_MATCH_TOLERANCE));
        assert!(!approximately_equal(a, a + DVec3::new(0.4, 0.0, 0.0), DEFAULT_MATCH_TOLERANCE));
    }

    #[test]
    fn test_circumradius_order_five_square() {
        // tan(54°) = 1.37638..., tan(45°) = 1
        let t = (0.3 * PI).tan();
        let expected = ((t - 1.0) / (t + 1.0)).sqrt();
        assert_abs_diff_eq!(circumradius(4, 5), expected, epsilon = 1e-12);
        assert!(circumradius(4, 5) < 1.0);
    }
}
