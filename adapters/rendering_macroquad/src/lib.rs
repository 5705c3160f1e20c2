#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for the tactics board.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The backend draws every visible scene graph handle as an unlit box through
//! a [`Camera3D`] placed by the shared [`CameraRig`], so what is drawn and what
//! the ray picker hits always agree.

use anyhow::Result;
use macroquad::{
    camera::{set_camera, set_default_camera, Camera3D, Projection},
    input::{
        is_key_down, is_key_pressed, is_mouse_button_pressed, mouse_position, mouse_wheel, KeyCode,
        MouseButton,
    },
    models::{draw_cube, draw_cube_wires},
    window::{clear_background, screen_height, screen_width},
};
use std::time::Duration;
use tactics_core::{CameraKind, InputEvent, Key, Modifiers};
use tactics_rendering::{
    CameraRig, Color, FrameInput, Palette, Presentation, RenderingBackend, Scene, SceneGraph,
};

/// Scroll distance reported for one wheel notch, in the units the camera controller expects.
pub const WHEEL_NOTCH: f32 = 100.0;

const POLLED_KEYS: [KeyCode; 34] = [
    KeyCode::A,
    KeyCode::B,
    KeyCode::C,
    KeyCode::D,
    KeyCode::E,
    KeyCode::F,
    KeyCode::G,
    KeyCode::H,
    KeyCode::I,
    KeyCode::J,
    KeyCode::K,
    KeyCode::L,
    KeyCode::M,
    KeyCode::N,
    KeyCode::O,
    KeyCode::P,
    KeyCode::Q,
    KeyCode::R,
    KeyCode::S,
    KeyCode::T,
    KeyCode::U,
    KeyCode::V,
    KeyCode::W,
    KeyCode::X,
    KeyCode::Y,
    KeyCode::Z,
    KeyCode::Backspace,
    KeyCode::Delete,
    KeyCode::Enter,
    KeyCode::Escape,
    KeyCode::Up,
    KeyCode::Down,
    KeyCode::Left,
    KeyCode::Right,
];

/// Maps a macroquad key code onto a controller key.
#[must_use]
pub fn translate_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Enter | KeyCode::KpEnter => Key::Enter,
        KeyCode::Escape => Key::Escape,
        KeyCode::Up => Key::ArrowUp,
        KeyCode::Down => Key::ArrowDown,
        KeyCode::Left => Key::ArrowLeft,
        KeyCode::Right => Key::ArrowRight,
        letter => return letter_for(letter).map(Key::Character),
    };
    Some(key)
}

fn letter_for(code: KeyCode) -> Option<char> {
    let letter = match code {
        KeyCode::A => 'a',
        KeyCode::B => 'b',
        KeyCode::C => 'c',
        KeyCode::D => 'd',
        KeyCode::E => 'e',
        KeyCode::F => 'f',
        KeyCode::G => 'g',
        KeyCode::H => 'h',
        KeyCode::I => 'i',
        KeyCode::J => 'j',
        KeyCode::K => 'k',
        KeyCode::L => 'l',
        KeyCode::M => 'm',
        KeyCode::N => 'n',
        KeyCode::O => 'o',
        KeyCode::P => 'p',
        KeyCode::Q => 'q',
        KeyCode::R => 'r',
        KeyCode::S => 's',
        KeyCode::T => 't',
        KeyCode::U => 'u',
        KeyCode::V => 'v',
        KeyCode::W => 'w',
        KeyCode::X => 'x',
        KeyCode::Y => 'y',
        KeyCode::Z => 'z',
        _ => return None,
    };
    Some(letter)
}

/// Converts a cursor position in pixels into normalized device coordinates.
///
/// Returns `None` for a degenerate window or a cursor outside it.
#[must_use]
pub fn normalized_device_coordinates(
    cursor: (f32, f32),
    screen: (f32, f32),
) -> Option<(f32, f32)> {
    let (width, height) = screen;
    if width <= f32::EPSILON || height <= f32::EPSILON {
        return None;
    }
    let (x, y) = cursor;
    if !(0.0..=width).contains(&x) || !(0.0..=height).contains(&y) {
        return None;
    }
    Some((x / width * 2.0 - 1.0, 1.0 - y / height * 2.0))
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame rate once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
}

impl FpsCounter {
    /// Records a frame and returns the average rate once a second has elapsed.
    fn record_frame(&mut self, frame: Duration) -> Option<f32> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        if self.elapsed < Duration::from_secs(1) {
            return None;
        }
        let per_second = self.frames as f32 / self.elapsed.as_secs_f32();
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        Some(per_second)
    }
}

struct PolledFrame {
    input: FrameInput,
    quit_requested: bool,
}

fn poll_frame_input() -> PolledFrame {
    let screen = (screen_width(), screen_height());
    let mut events = Vec::new();

    if is_mouse_button_pressed(MouseButton::Left) {
        if let Some((x, y)) = normalized_device_coordinates(mouse_position(), screen) {
            events.push(InputEvent::PointerDown { x, y });
        }
    }

    let modifiers = Modifiers {
        shift: is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift),
        ctrl: is_key_down(KeyCode::LeftControl) || is_key_down(KeyCode::RightControl),
        alt: is_key_down(KeyCode::LeftAlt) || is_key_down(KeyCode::RightAlt),
        meta: is_key_down(KeyCode::LeftSuper) || is_key_down(KeyCode::RightSuper),
    };
    let mut quit_requested = false;
    for code in POLLED_KEYS {
        if !is_key_pressed(code) {
            continue;
        }
        if code == KeyCode::Escape {
            quit_requested = true;
            continue;
        }
        if let Some(key) = translate_key(code) {
            events.push(InputEvent::KeyDown { key, modifiers });
        }
    }

    let (wheel_x, wheel_y) = mouse_wheel();
    if wheel_x != 0.0 || wheel_y != 0.0 {
        events.push(InputEvent::Wheel {
            delta_x: wheel_x * WHEEL_NOTCH,
            delta_y: wheel_y * WHEEL_NOTCH,
        });
    }

    let aspect_ratio = if screen.1 > f32::EPSILON {
        screen.0 / screen.1
    } else {
        1.0
    };
    PolledFrame {
        input: FrameInput {
            events,
            aspect_ratio,
        },
        quit_requested,
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            palette,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 960,
            window_height: 720,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let mut fps_counter = FpsCounter::default();

            loop {
                let frame_dt =
                    Duration::try_from_secs_f32(macroquad::time::get_frame_time()).unwrap_or_default();
                let PolledFrame {
                    input,
                    quit_requested,
                } = poll_frame_input();
                if quit_requested {
                    tracing::info!("quit requested");
                    break;
                }
                let aspect_ratio = input.aspect_ratio;
                update_scene(frame_dt, input, &mut scene);

                clear_background(to_macroquad_color(clear_color));
                match scene.camera(aspect_ratio) {
                    Ok(rig) => {
                        set_camera(&camera_for(&rig, aspect_ratio));
                        draw_graph(&scene.graph, &palette);
                        set_default_camera();
                    }
                    Err(error) => tracing::warn!(%error, "skipping scene draw"),
                }

                if show_fps {
                    if let Some(per_second) = fps_counter.record_frame(frame_dt) {
                        tracing::info!(fps = format_args!("{per_second:.2}"), "frame rate");
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn camera_for(rig: &CameraRig, aspect_ratio: f32) -> Camera3D {
    let projection = match rig.kind() {
        CameraKind::Orthographic => Projection::Orthographics,
        CameraKind::Perspective => Projection::Perspective,
    };
    Camera3D {
        position: to_macroquad_vec3(rig.eye()),
        target: macroquad::math::Vec3::ZERO,
        up: to_macroquad_vec3(rig.up()),
        fovy: rig.vertical_extent(),
        aspect: Some(aspect_ratio),
        projection,
        ..Camera3D::default()
    }
}

fn draw_graph(graph: &SceneGraph, palette: &Palette) {
    for (target, handle) in graph.handles() {
        let Some(material) = palette.material(target, handle.appearance) else {
            continue;
        };
        let center = to_macroquad_vec3(handle.center);
        let size = to_macroquad_vec3(handle.size);
        if material.wireframe {
            draw_cube_wires(center, size, to_macroquad_color(material.color));
            continue;
        }
        draw_cube(center, size, None, to_macroquad_color(material.color));
        if let Some(outline) = material.outline {
            draw_cube_wires(center, size, to_macroquad_color(outline));
        }
    }
}

fn to_macroquad_vec3(vector: glam::Vec3) -> macroquad::math::Vec3 {
    macroquad::math::vec3(vector.x, vector.y, vector.z)
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
