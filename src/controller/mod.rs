// CONTROLLER: input handling
pub mod input;

pub use input::InputState;
