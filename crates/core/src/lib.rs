//! Core types: math re-exports, errors, Transform, Camera, scene objects,
//! input state and viewer configuration. Renderer-agnostic.

pub use glam::{Mat4, Vec3, vec3};
use thiserror::Error;

pub mod camera;
pub mod config;
pub mod input;
pub mod scene;
pub mod transform;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Cartesian axis in model/world space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Sign of a movement along an [`Axis`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Direction::Positive => 1.0,
            Direction::Negative => -1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_units_are_orthonormal() {
        for a in Axis::ALL {
            assert_eq!(a.unit().length(), 1.0);
            assert_eq!(a.unit()[a.index()], 1.0);
        }
        assert_eq!(Axis::X.unit().dot(Axis::Y.unit()), 0.0);
    }

    #[test]
    fn camera_pv_is_finite() {
        let cam = camera::Camera::fixed_viewer(1.0);
        let pv = cam.proj_view();
        let a = pv.to_cols_array();
        assert!(a.iter().all(|f| f.is_finite()));
    }
}
