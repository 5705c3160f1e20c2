#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for tactics board adapters.

mod camera;
mod scene;

use anyhow::Result as AnyResult;
use std::{error::Error, fmt, time::Duration};
use tactics_core::{Appearance, InputEvent, PickTarget, ViewState};

pub use self::{
    camera::{
        CameraRig, Ray, RayPicker, CAMERA_DISTANCE, FAR_PLANE, NEAR_PLANE, ORTHOGRAPHIC_HEIGHT,
        PERSPECTIVE_FOV_DEGREES,
    },
    scene::{
        cell_anchor, slab_extent, SceneGraph, VisualHandle, CELL_FOOTPRINT, CELL_SIZE,
        LEVEL_HEIGHT, MIN_SLAB_THICKNESS, SOLDIER_SIZE,
    },
};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Creates an opaque color from a `0xRRGGBB` value.
    #[must_use]
    pub const fn from_hex(rgb: u32) -> Self {
        Self::from_rgb_u8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// How a backend draws one visual handle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Fill or outline colour.
    pub color: Color,
    /// Draw only the box edges.
    pub wireframe: bool,
    /// Edge colour drawn over solid boxes.
    pub outline: Option<Color>,
}

/// Colours assigned to appearance slots.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    /// Unselected cells and surfaces.
    pub terrain: Color,
    /// Selected cells and surfaces.
    pub terrain_selected: Color,
    /// Soldiers.
    pub soldier: Color,
    /// Edges of solid boxes.
    pub outline: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            terrain: Color::from_hex(0x55_55_55),
            terrain_selected: Color::from_hex(0x99_99_99),
            soldier: Color::from_hex(0xd0_8a_3c),
            outline: Color::from_hex(0x22_22_22),
        }
    }
}

impl Palette {
    /// Material for `target` in the given appearance, `None` when it is hidden.
    ///
    /// Selected soldiers switch to an outline so the terrain below stays visible.
    #[must_use]
    pub fn material(&self, target: PickTarget, appearance: Appearance) -> Option<Material> {
        let solid = |color| Material {
            color,
            wireframe: false,
            outline: Some(self.outline),
        };
        match (target, appearance) {
            (_, Appearance::Empty) => None,
            (PickTarget::Soldier(_), Appearance::Default) => Some(solid(self.soldier)),
            (PickTarget::Soldier(_), Appearance::Selected) => Some(Material {
                color: self.soldier.lighten(0.35),
                wireframe: true,
                outline: None,
            }),
            (_, Appearance::Default) => Some(solid(self.terrain)),
            (_, Appearance::Selected) => Some(solid(self.terrain_selected)),
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameInput {
    /// Input events observed since the previous frame, in arrival order.
    pub events: Vec<InputEvent>,
    /// Viewport width divided by height.
    pub aspect_ratio: f32,
}

impl Default for FrameInput {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            aspect_ratio: 1.0,
        }
    }
}

/// Mutable state a backend presents every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Visual handles of the board and its inhabitants.
    pub graph: SceneGraph,
    /// Scene rotation and active camera.
    pub view: ViewState,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub const fn new(graph: SceneGraph, view: ViewState) -> Self {
        Self { graph, view }
    }

    /// Camera rig for a viewport with the given aspect ratio.
    pub fn camera(&self, aspect_ratio: f32) -> Result<CameraRig, RenderingError> {
        CameraRig::new(&self.view, aspect_ratio)
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Materials used for visual handles.
    pub palette: Palette,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor with the default palette.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            palette: Palette::default(),
            scene,
        }
    }
}

/// Rendering backend capable of presenting tactics scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and mutates the scene before it is drawn.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when deriving rendering state.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Viewport aspect ratios must be finite and positive.
    InvalidAspectRatio {
        /// Ratio that failed validation.
        aspect: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAspectRatio { aspect } => {
                write!(f, "aspect ratio must be finite and positive (received {aspect})")
            }
        }
    }
}

impl Error for RenderingError {}
