#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Camera controller that rotates the scene and cycles projections.

use tactics_core::{InputEvent, Key, KeyChord};
use tactics_system_control::{ControlContext, Controller};

/// Chord that switches to the next camera.
pub const CYCLE_CAMERA_KEY: KeyChord = KeyChord::bare(Key::Character('c'));

/// Controller translating wheel and key input into view changes.
#[derive(Debug, Default)]
pub struct CameraController;

impl CameraController {
    /// Creates a new camera controller.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Controller for CameraController {
    fn name(&self) -> &'static str {
        "camera"
    }

    fn handle_input(&mut self, input: &InputEvent, context: &mut ControlContext<'_>) {
        match *input {
            InputEvent::Wheel { delta_x, delta_y } => context.view_mut().rotate(delta_x, delta_y),
            InputEvent::KeyDown { .. } if input.chord() == Some(CYCLE_CAMERA_KEY) => {
                context.view_mut().cycle_camera();
                tracing::debug!(camera = ?context.view().camera(), "camera switched");
            }
            _ => {}
        }
    }
}
