//! Octahedral normal compression.
//!
//! A unit vector is projected onto the octahedron `|x| + |y| + |z| = 1`; the
//! lower hemisphere is folded over the diagonals so the whole sphere maps to
//! the unit square. Two channels in `[0, 1]` are enough to carry a surface
//! normal through the geometry buffer.

use glam::{Vec2, Vec3};

fn sign_not_zero(value: f32) -> f32 {
    if value >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Compresses a unit vector into two `[0, 1]` channels.
pub fn encode_normal(normal: Vec3) -> Vec2 {
    let scale = normal.x.abs() + normal.y.abs() + normal.z.abs();
    let projected = normal / scale;
    let folded = if projected.z >= 0.0 {
        Vec2::new(projected.x, projected.y)
    } else {
        Vec2::new(
            (1.0 - projected.y.abs()) * sign_not_zero(projected.x),
            (1.0 - projected.x.abs()) * sign_not_zero(projected.y),
        )
    };
    folded * 0.5 + 0.5
}

/// Inverse of [`encode_normal`]: remaps the channels to `[-1, 1]`, unfolds the
/// lower hemisphere and renormalizes. Always returns a unit vector.
pub fn decode_normal(encoded: Vec2) -> Vec3 {
    let f = encoded * 2.0 - 1.0;
    let mut n = Vec3::new(f.x, f.y, 1.0 - f.x.abs() - f.y.abs());
    let t = (-n.z).clamp(0.0, 1.0);
    n.x -= t * sign_not_zero(n.x);
    n.y -= t * sign_not_zero(n.y);
    n.normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-4;

    fn round_trip(normal: Vec3) {
        let normal = normal.normalize();
        let decoded = decode_normal(encode_normal(normal));
        assert!(
            (decoded - normal).length() < TOLERANCE,
            "{normal:?} decoded to {decoded:?}"
        );
    }

    #[test]
    fn axis_aligned_normals_round_trip() {
        for axis in [Vec3::X, Vec3::Y, Vec3::Z, -Vec3::X, -Vec3::Y, -Vec3::Z] {
            round_trip(axis);
        }
    }

    #[test]
    fn folded_hemisphere_round_trips() {
        round_trip(Vec3::new(0.3, -0.4, -0.86));
        round_trip(Vec3::new(-0.7, 0.1, -0.7));
        round_trip(Vec3::new(0.05, 0.05, -0.99));
    }

    #[test]
    fn arbitrary_directions_round_trip() {
        for i in 0..8 {
            for j in 0..8 {
                let theta = i as f32 * std::f32::consts::PI / 8.0 + 0.1;
                let phi = j as f32 * std::f32::consts::TAU / 8.0 + 0.1;
                round_trip(Vec3::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                ));
            }
        }
    }

    #[test]
    fn decode_always_yields_unit_length() {
        for i in 0..16 {
            for j in 0..16 {
                let encoded = Vec2::new(i as f32 / 15.0, j as f32 / 15.0);
                let decoded = decode_normal(encoded);
                assert!((decoded.length() - 1.0).abs() < TOLERANCE, "{encoded:?}");
            }
        }
    }
}
