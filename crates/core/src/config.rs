//! Viewer configuration. Values are fixed at build time; there is no config file.

use std::path::PathBuf;

use crate::{CoreError, CoreResult};

/// Per-frame motion amounts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionSteps {
    /// Radians added to the active rotation each frame.
    pub rotation: f32,
    /// World units moved per frame while a translate key is held.
    pub translation: f32,
    /// Relative scale change per scale key press.
    pub scale_factor: f32,
}

impl Default for MotionSteps {
    fn default() -> Self {
        Self {
            rotation: 0.02,
            translation: 0.02,
            scale_factor: 0.05,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub mesh_path: PathBuf,
    pub object_count: usize,
    /// Horizontal distance between neighbouring instances.
    pub spacing: f32,
    pub motion: MotionSteps,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "objview".to_owned(),
            window_width: 1000,
            window_height: 1000,
            mesh_path: PathBuf::from("assets/cube.obj"),
            object_count: 4,
            spacing: 2.75,
            motion: MotionSteps::default(),
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(CoreError::InvalidConfig(format!(
                "window size must be non-zero, got {}x{}",
                self.window_width, self.window_height
            )));
        }
        if self.object_count == 0 {
            return Err(CoreError::InvalidConfig(
                "object_count must be at least 1".into(),
            ));
        }
        let m = &self.motion;
        if !(m.rotation > 0.0 && m.translation > 0.0 && m.scale_factor > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "motion steps must be positive, got {m:?}"
            )));
        }
        if m.scale_factor >= 1.0 {
            return Err(CoreError::InvalidConfig(format!(
                "scale_factor must be below 1.0, got {}",
                m.scale_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ViewerConfig::default();
        cfg.validate().expect("defaults must validate");
        assert_eq!((cfg.window_width, cfg.window_height), (1000, 1000));
        assert_eq!(cfg.object_count, 4);
    }

    #[test]
    fn zero_objects_rejected() {
        let cfg = ViewerConfig {
            object_count: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn non_positive_steps_rejected() {
        let mut cfg = ViewerConfig::default();
        cfg.motion.translation = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = ViewerConfig::default();
        cfg.motion.scale_factor = 1.5;
        assert!(cfg.validate().is_err());
    }
}
