use crate::{Axis, Mat4, Vec3};

/// Accumulated rotation about a single axis. `axis == None` means no rotation
/// has been requested yet.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisRotation {
    pub axis: Option<Axis>,
    /// Radians.
    pub angle: f32,
}

/// Translation, single-axis rotation and uniform scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: AxisRotation,
    pub scale: f32,
}

impl Transform {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: AxisRotation {
                axis: None,
                angle: 0.0,
            },
            scale: 1.0,
        }
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Make `axis` the only rotation axis and advance the angle by `step`.
    /// Switching axes keeps the accumulated angle.
    pub fn rotate(&mut self, axis: Axis, step: f32) {
        self.rotation.axis = Some(axis);
        self.rotation.angle += step;
    }

    pub fn translate(&mut self, axis: Axis, amount: f32) {
        self.translation += axis.unit() * amount;
    }

    /// Build matrix = T * R * S (column-major Mat4 per glam).
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        let rotation = match self.rotation.axis {
            Some(axis) => Mat4::from_axis_angle(axis.unit(), self.rotation.angle),
            None => Mat4::IDENTITY,
        };
        Mat4::from_translation(self.translation)
            * rotation
            * Mat4::from_scale(Vec3::splat(self.scale))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
