// MODEL: scene state, camera, and the material gallery
pub mod camera;
pub mod gallery;
pub mod material;
pub mod scene;

pub use camera::Camera;
pub use material::{BoundMaterial, MaterialDesc, MaterialEntry, MaterialRegistry, StyleUniform, UpdateFn};
pub use scene::Scene;
