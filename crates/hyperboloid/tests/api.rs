//! Public API property tests for the hyperboloid kernel.

use approx::assert_abs_diff_eq;
use glam::DVec3;
use hyperboloid::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Random surface points within `max_dist` of the origin.
fn random_surface_points(n: usize, max_dist: f64, seed: u64) -> Vec<DVec3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let dist: f64 = rng.gen_range(0.0..max_dist);
            let theta: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
            rotate(translate_x(ORIGIN, dist), theta)
        })
        .collect()
}

#[test]
fn test_points_satisfy_surface_constraint() {
    for p in random_surface_points(200, 4.0, 1) {
        assert_abs_diff_eq!(minkowski_dot(p, p), 1.0, epsilon = 1e-9);
        assert!(p.y > 0.0);
        assert_abs_diff_eq!(distance(p, p), 0.0, epsilon = 1e-5);
    }
}

#[test]
fn test_extend_is_an_involution() {
    // Chained extends lose precision quickly with distance, keep samples near the origin
    let points = random_surface_points(100, 1.0, 2);
    for pair in points.chunks(2) {
        let (a, b) = (pair[0], pair[1]);
        let c = extend(a, b);
        let back = extend(c, b);
        let scale = a.abs().max_element().max(1.0);
        assert!(
            back.abs_diff_eq(a, 1e-7 * scale),
            "extend twice should return to start: {a:?} vs {back:?}"
        );
    }
}

#[test]
fn test_extend_places_b_at_the_midpoint() {
    let points = random_surface_points(60, 1.5, 3);
    for pair in points.chunks(2) {
        let (a, b) = (pair[0], pair[1]);
        let c = extend(a, b);
        assert_abs_diff_eq!(minkowski_dot(c, c), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(distance(a, b), distance(b, c), epsilon = 1e-7);
        assert!(midpoint(a, c).abs_diff_eq(b, 1e-6));
    }
}

#[test]
fn test_midpoint_is_equidistant() {
    let points = random_surface_points(100, 3.0, 4);
    for pair in points.chunks(2) {
        let (a, b) = (pair[0], pair[1]);
        let mid = midpoint(a, b);
        assert_abs_diff_eq!(distance(a, mid), distance(mid, b), epsilon = 1e-8);
        assert_abs_diff_eq!(2.0 * distance(a, mid), distance(a, b), epsilon = 1e-8);
    }
}

#[test]
fn test_disk_projection_round_trip() {
    for v in random_surface_points(200, 5.0, 5) {
        let p = disk_projection(v);
        assert!(p.x * p.x + p.z * p.z < 1.0);
        let back = inverse_disk_projection(p.x, p.z);
        let scale = v.y.max(1.0);
        assert!(back.abs_diff_eq(v, 1e-9 * scale), "{v:?} vs {back:?}");
    }
}

#[test]
fn test_translate_both_round_trip_grid() {
    let offsets = [-0.8, -0.3, 0.0, 0.25, 0.7];
    let samples = random_surface_points(8, 1.0, 6);
    for &dx in &offsets {
        for &dz in &offsets {
            for &v in &samples {
                let moved = translate_both(v, dx, dz);
                assert_abs_diff_eq!(minkowski_dot(moved, moved), 1.0, epsilon = 1e-9);
                let back = reverse_translate_both(moved, dx, dz);
                assert!(back.abs_diff_eq(v, 1e-9), "({dx}, {dz}): {v:?} vs {back:?}");
            }
        }
    }
}

#[test]
fn test_translate_both_moves_origin_by_offset_distance() {
    // Along a single axis the symmetric translation is a plain boost.
    let v = translate_both(ORIGIN, 0.9, 0.0);
    assert_abs_diff_eq!(distance(ORIGIN, v), 0.9, epsilon = 1e-9);
    let w = translate_both(ORIGIN, 0.0, -0.4);
    assert_abs_diff_eq!(distance(ORIGIN, w), 0.4, epsilon = 1e-9);
}

#[test]
fn test_reflection_is_an_isometry() {
    let points = random_surface_points(40, 2.0, 7);
    let (p, q) = (points[0], points[1]);
    for pair in points[2..].chunks(2) {
        let (x, y) = (pair[0], pair[1]);
        let rx = reflect_across_bisector(x, p, q);
        let ry = reflect_across_bisector(y, p, q);
        assert_abs_diff_eq!(distance(x, y), distance(rx, ry), epsilon = 1e-7);
        // Reflecting twice is the identity
        let back = reflect_across_bisector(rx, p, q);
        assert!(back.abs_diff_eq(x, 1e-8 * x.y));
    }
}

#[test]
fn test_circumradius_vertex_lands_on_hyperboloid() {
    for (n, k) in [(4, 5), (6, 8), (5, 4), (3, 7), (7, 3)] {
        let r = circumradius(n, k);
        assert!(r > 0.0 && r < 1.0, "{{{n},{k}}} radius {r}");
        let v = inverse_disk_projection(r, 0.0);
        assert_abs_diff_eq!(hyperboloid_eval(v), 1.0, epsilon = 1e-9);
    }
}

#[test]
fn test_projection_enum_stays_in_disk() {
    for v in random_surface_points(50, 6.0, 8) {
        for proj in [Projection::Poincare, Projection::Klein] {
            assert!(proj.to_disk(v).length() < 1.0, "{} escaped the disk", proj.name());
        }
    }
}
