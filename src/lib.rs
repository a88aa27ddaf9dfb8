// Re-export all public modules so they can be used from main.rs
pub mod loader;
pub mod logging;
pub mod utils;

// MVC Architecture
pub mod controller;
pub mod model;
pub mod view;

pub use controller::InputState;
pub use loader::{FsShaderLoader, ShaderSourceLoader};
pub use model::{BoundMaterial, Camera, MaterialEntry, MaterialRegistry, Scene, StyleUniform};
pub use view::{GpuContext, GpuMaterial, RenderState};
