//! Scene objects: instances of one shared mesh, each with its own transform.

use crate::{
    Axis, Direction, Mat4, Vec3,
    config::MotionSteps,
    input::InputState,
    transform::Transform,
};

/// Id of a mesh uploaded to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

/// Non-owning reference to GPU mesh data. `vertex_count` is fixed at upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshHandle {
    pub id: MeshId,
    pub vertex_count: u32,
}

#[derive(Clone, Debug)]
pub struct SceneObject {
    transform: Transform,
    model: Mat4,
    mesh: MeshHandle,
}

impl SceneObject {
    pub fn new(mesh: MeshHandle, position: Vec3) -> Self {
        let transform = Transform::from_translation(position);
        Self {
            model: transform.matrix(),
            transform,
            mesh,
        }
    }

    #[inline]
    pub fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Model matrix as of the last [`update_model_matrix`](Self::update_model_matrix).
    #[inline]
    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    pub fn rotate(&mut self, axis: Axis, step: f32) {
        self.transform.rotate(axis, step);
    }

    pub fn translate(&mut self, axis: Axis, direction: Direction, step: f32) {
        self.transform.translate(axis, direction.sign() * step);
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.transform.scale = scale;
    }

    pub fn update_model_matrix(&mut self) {
        self.model = self.transform.matrix();
    }
}

/// All instances. Empty when the mesh failed to load.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row of `count` instances on the X axis, alternating sides of the origin:
    /// 0, +s, -s, +2s, -2s, ...
    pub fn generate(count: usize, spacing: f32, mesh: MeshHandle) -> Self {
        let objects = (0..count)
            .map(|i| SceneObject::new(mesh, vec3_x(row_position(i, spacing))))
            .collect();
        Self { objects }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Apply one frame of input to every object and refresh model matrices.
    pub fn update(&mut self, input: &InputState, steps: &MotionSteps) {
        for obj in &mut self.objects {
            if let Some(axis) = input.rotation {
                obj.rotate(axis, steps.rotation);
            }
            for axis in Axis::ALL {
                if let Some(dir) = input.translation_along(axis) {
                    obj.translate(axis, dir, steps.translation);
                }
            }
            obj.set_scale(input.scale);
            obj.update_model_matrix();
        }
    }
}

fn row_position(i: usize, spacing: f32) -> f32 {
    let half = (i / 2) as f32;
    if i % 2 == 0 {
        -spacing * half
    } else {
        spacing * (half + 1.0)
    }
}

#[inline]
fn vec3_x(x: f32) -> Vec3 {
    Vec3::new(x, 0.0, 0.0)
}
