//! Absolute orientation from gravity and magnetic field vectors.

use crate::types::AbsoluteOrientation;
use glam::{Mat3, Vec3};
use thiserror::Error;

/// Standard gravity in m/s^2.
pub const STANDARD_GRAVITY: f32 = 9.80665;

/// Below 10% of g the device is treated as in free fall.
const FREE_FALL_GRAVITY_SQUARED: f32 = 0.01 * STANDARD_GRAVITY * STANDARD_GRAVITY;

/// Minimum east-vector magnitude before the field is considered parallel to gravity.
const MIN_EAST_NORM: f32 = 0.1;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("Gravity magnitude too small ({norm_squared} m^2/s^4), device in free fall")]
    FreeFall { norm_squared: f32 },
    #[error("Magnetic field nearly parallel to gravity (east norm {east_norm})")]
    DegenerateField { east_norm: f32 },
}

/// Computes an absolute orientation from a gravity and a magnetic sample.
pub trait OrientationSolver: Send {
    fn solve(&self, gravity: Vec3, magnetic: Vec3) -> Result<AbsoluteOrientation, GeometryError>;
}

impl<F> OrientationSolver for F
where
    F: Fn(Vec3, Vec3) -> Result<AbsoluteOrientation, GeometryError> + Send,
{
    fn solve(&self, gravity: Vec3, magnetic: Vec3) -> Result<AbsoluteOrientation, GeometryError> {
        self(gravity, magnetic)
    }
}

/// Rotation-matrix based solver.
///
/// Builds the device-to-world rotation with rows (east, north, up) and
/// decomposes it into azimuth/pitch/roll.
#[derive(Debug, Clone, Copy, Default)]
pub struct GravityMagneticSolver;

impl OrientationSolver for GravityMagneticSolver {
    fn solve(&self, gravity: Vec3, magnetic: Vec3) -> Result<AbsoluteOrientation, GeometryError> {
        let rotation = rotation_matrix(gravity, magnetic)?;
        Ok(orientation(&rotation))
    }
}

/// Rotation matrix whose rows are the east, north and up axes in device coordinates.
pub fn rotation_matrix(gravity: Vec3, magnetic: Vec3) -> Result<Mat3, GeometryError> {
    let norm_squared = gravity.length_squared();
    if norm_squared < FREE_FALL_GRAVITY_SQUARED {
        return Err(GeometryError::FreeFall { norm_squared });
    }

    let east = magnetic.cross(gravity);
    let east_norm = east.length();
    if east_norm < MIN_EAST_NORM {
        return Err(GeometryError::DegenerateField { east_norm });
    }

    let east = east / east_norm;
    let up = gravity / norm_squared.sqrt();
    let north = up.cross(east);

    // glam is column-major; transpose so row(i) reads back the axes.
    Ok(Mat3::from_cols(east, north, up).transpose())
}

/// Decompose a rotation matrix into `(azimuth, pitch, roll)` radians.
pub fn orientation(rotation: &Mat3) -> AbsoluteOrientation {
    let east = rotation.row(0);
    let north = rotation.row(1);
    let up = rotation.row(2);
    AbsoluteOrientation {
        azimuth: east.y.atan2(north.y),
        pitch: (-up.y).clamp(-1.0, 1.0).asin(),
        roll: (-up.x).atan2(up.z),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPS: f32 = 1e-5;

    #[test]
    fn flat_device_facing_north() {
        // Screen up, y axis pointing north; field dips downward.
        let gravity = Vec3::new(0.0, 0.0, 9.81);
        let magnetic = Vec3::new(0.0, 22.0, -40.0);
        let o = GravityMagneticSolver.solve(gravity, magnetic).unwrap();
        assert!(o.azimuth.abs() < EPS);
        assert!(o.pitch.abs() < EPS);
        assert!(o.roll.abs() < EPS);
    }

    #[test]
    fn flat_device_facing_east() {
        // y axis points east, so north lies along -x.
        let gravity = Vec3::new(0.0, 0.0, 9.81);
        let magnetic = Vec3::new(-22.0, 0.0, -40.0);
        let o = GravityMagneticSolver.solve(gravity, magnetic).unwrap();
        assert!((o.azimuth - FRAC_PI_2).abs() < EPS);
        assert!(o.pitch.abs() < EPS);
    }

    #[test]
    fn upright_device_has_negative_pitch() {
        // Held upright: gravity reaction along +y.
        let gravity = Vec3::new(0.0, 9.81, 0.0);
        let magnetic = Vec3::new(0.0, -30.0, -25.0);
        let o = GravityMagneticSolver.solve(gravity, magnetic).unwrap();
        assert!((o.pitch + FRAC_PI_2).abs() < 1e-3);
    }

    #[test]
    fn rows_are_orthonormal() {
        let r = rotation_matrix(Vec3::new(1.2, -0.4, 9.6), Vec3::new(12.0, 18.0, -35.0)).unwrap();
        for i in 0..3 {
            assert!((r.row(i).length() - 1.0).abs() < EPS);
        }
        assert!(r.row(0).dot(r.row(1)).abs() < EPS);
        assert!(r.row(1).dot(r.row(2)).abs() < EPS);
    }

    #[test]
    fn free_fall_is_rejected() {
        let err = rotation_matrix(Vec3::new(0.0, 0.0, 0.5), Vec3::new(0.0, 22.0, -40.0));
        assert!(matches!(err, Err(GeometryError::FreeFall { .. })));
    }

    #[test]
    fn parallel_field_is_rejected() {
        let err = rotation_matrix(Vec3::new(0.0, 0.0, 9.81), Vec3::new(0.0, 0.0, 40.0));
        assert!(matches!(err, Err(GeometryError::DegenerateField { .. })));
    }
}
