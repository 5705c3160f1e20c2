//! Camera-facing view state shared between the camera controller and renderers.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, FRAC_PI_8, PI};

/// Projection used by a camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CameraKind {
    /// Parallel projection looking down on the board.
    Orthographic,
    /// Perspective projection.
    Perspective,
}

/// Cameras cycled through by the camera controller, in order.
pub const CAMERAS: [CameraKind; 2] = [CameraKind::Orthographic, CameraKind::Perspective];

const ROTATION_SCALE: f32 = PI / 1000.0;

/// Scene rotation and active camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    rotation_x: f32,
    rotation_y: f32,
    rotation_z: f32,
    camera_index: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            rotation_x: FRAC_PI_2 - FRAC_PI_8,
            rotation_y: 0.0,
            rotation_z: FRAC_PI_4,
            camera_index: 0,
        }
    }
}

impl ViewState {
    /// Rotates the scene by scroll deltas, scaled by `π / 1000` per unit.
    pub fn rotate(&mut self, delta_x: f32, delta_y: f32) {
        self.rotation_y += delta_x * ROTATION_SCALE;
        self.rotation_x += delta_y * ROTATION_SCALE;
    }

    /// Activates the next camera, wrapping around.
    pub fn cycle_camera(&mut self) {
        self.camera_index = (self.camera_index + 1) % CAMERAS.len();
    }

    /// Camera currently used for presentation and picking.
    #[must_use]
    pub fn camera(&self) -> CameraKind {
        CAMERAS[self.camera_index % CAMERAS.len()]
    }

    /// Scene rotation around the `x`, `y` and `z` axes, in radians.
    #[must_use]
    pub const fn rotation(&self) -> (f32, f32, f32) {
        (self.rotation_x, self.rotation_y, self.rotation_z)
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraKind, ViewState};
    use std::f32::consts::PI;

    #[test]
    fn cycling_wraps_through_all_cameras() {
        let mut view = ViewState::default();
        assert_eq!(view.camera(), CameraKind::Orthographic);
        view.cycle_camera();
        assert_eq!(view.camera(), CameraKind::Perspective);
        view.cycle_camera();
        assert_eq!(view.camera(), CameraKind::Orthographic);
    }

    #[test]
    fn rotation_scales_scroll_deltas() {
        let mut view = ViewState::default();
        let (x_before, y_before, _) = view.rotation();
        view.rotate(1000.0, -500.0);
        let (x_after, y_after, _) = view.rotation();
        assert!((y_after - y_before - PI).abs() < 1e-5);
        assert!((x_after - x_before + PI / 2.0).abs() < 1e-5);
    }
}
