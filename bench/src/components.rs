//! Common component types used across benchmarks.
//!
//! These components are sized like real renderer components: small vector
//! math types, a 4x4 matrix, and a mesh-carrying renderable.

use prism_macros::Component;

/// 3D position component (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 3D velocity component (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Rotation as euler angles (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 4x4 transformation matrix (64 bytes).
#[derive(Component, Clone, Copy, Debug)]
pub struct Transform {
    pub matrix: [[f32; 4]; 4],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            matrix: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }
}

/// Renderable: references into the mesh store plus a model transform.
#[derive(Component, Clone, Debug, Default)]
pub struct Renderable {
    pub meshes: Vec<u32>,
    pub transform: Transform,
}
