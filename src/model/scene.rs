use glam::Mat4;

use crate::model::BoundMaterial;
use crate::utils::{create_cube_mesh, create_sphere_mesh, MeshBuffer};

pub const SKY_RADIUS: f32 = 500.0;

/// Per-frame rotation rate at full auxiliary input, in radians per frame.
/// Frame-based on purpose: the reference demo scales per-frame increments
/// by the pointer scalar rather than by elapsed time.
const SPIN_RATE: f32 = 0.05;

/// Everything the demo draws: the rotating cube (the target surface for
/// material swapping) and the sky dome around it.
pub struct Scene {
    pub cube: MeshBuffer,
    pub sky: MeshBuffer,
    /// Registry entry the cube is currently drawn with.
    pub cube_material: BoundMaterial,
    pub rotation_x: f32,
    pub rotation_y: f32,
}

impl Scene {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            cube: create_cube_mesh().upload(device),
            sky: create_sphere_mesh(SKY_RADIUS, 60, 40).upload(device),
            cube_material: BoundMaterial::default(),
            rotation_x: 0.0,
            rotation_y: 0.0,
        }
    }

    /// Advance the cube rotation by one frame, scaled by the pointer scalar.
    pub fn spin(&mut self, aux_input: f32) {
        self.rotation_x += SPIN_RATE * aux_input;
        self.rotation_y += SPIN_RATE * aux_input;
    }

    pub fn cube_transform(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation_y) * Mat4::from_rotation_x(self.rotation_x)
    }
}
