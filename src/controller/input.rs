/// Pointer input state.
///
/// The demo consumes two inputs: the normalized vertical cursor position
/// (the auxiliary scalar fed to rotation and animated materials) and the
/// click that advances the material selection. Clicks are handled where
/// they are dispatched; only the scalar is state.
pub struct InputState {
    aux_input: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self { aux_input: 0.0 }
    }

    /// Track a cursor move: `y / viewport height`, clamped to [0, 1].
    pub fn set_cursor_y(&mut self, y: f32, viewport_height: f32) {
        if viewport_height > 0.0 {
            self.aux_input = (y / viewport_height).clamp(0.0, 1.0);
        }
    }

    pub fn aux_input(&self) -> f32 {
        self.aux_input
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_y_is_normalized_by_viewport_height() {
        let mut input = InputState::new();
        input.set_cursor_y(300.0, 600.0);
        assert_eq!(input.aux_input(), 0.5);
    }

    #[test]
    fn aux_input_is_clamped_to_unit_range() {
        let mut input = InputState::new();
        input.set_cursor_y(900.0, 600.0);
        assert_eq!(input.aux_input(), 1.0);
        input.set_cursor_y(-10.0, 600.0);
        assert_eq!(input.aux_input(), 0.0);
    }

    #[test]
    fn degenerate_viewport_is_ignored() {
        let mut input = InputState::new();
        input.set_cursor_y(100.0, 400.0);
        input.set_cursor_y(100.0, 0.0);
        assert_eq!(input.aux_input(), 0.25);
    }
}
