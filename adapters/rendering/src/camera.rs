//! Camera rig shared by backends for drawing and by the ray picker.

use glam::{EulerRot, Mat4, Quat, Vec3};
use tactics_core::{CameraKind, PickTarget, Picker, ViewState};

use crate::{scene::SceneGraph, RenderingError};

/// Distance from the scene origin to the eye.
pub const CAMERA_DISTANCE: f32 = 500.0;

/// Visible height of the orthographic camera in presentation units.
pub const ORTHOGRAPHIC_HEIGHT: f32 = 100.0;

/// Vertical field of view of the perspective camera, in degrees.
pub const PERSPECTIVE_FOV_DEGREES: f32 = 70.0;

/// Near clipping plane shared by both cameras.
pub const NEAR_PLANE: f32 = 0.01;

/// Far clipping plane shared by both cameras.
pub const FAR_PLANE: f32 = 10_000.0;

/// Half-line used for picking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Start of the ray.
    pub origin: Vec3,
    /// Unit direction of travel.
    pub direction: Vec3,
}

impl Ray {
    /// Distance along the ray to the first hit with the box `min..max`.
    ///
    /// A ray starting inside the box hits at distance zero.
    #[must_use]
    pub fn intersect_box(&self, min: Vec3, max: Vec3) -> Option<f32> {
        let inverse = self.direction.recip();
        let first = (min - self.origin) * inverse;
        let second = (max - self.origin) * inverse;
        let entry = first.min(second).max_element().max(0.0);
        let exit = first.max(second).min_element();
        (entry <= exit).then_some(entry)
    }
}

/// Eye placement and projection derived from a [`ViewState`].
///
/// Scene rotation is expressed by orbiting the eye around the origin with the
/// inverse rotation, which keeps the board itself in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    kind: CameraKind,
    eye: Vec3,
    up: Vec3,
    aspect: f32,
}

impl CameraRig {
    /// Builds the rig for a viewport with the given width to height ratio.
    pub fn new(view: &ViewState, aspect: f32) -> Result<Self, RenderingError> {
        if !aspect.is_finite() || aspect <= 0.0 {
            return Err(RenderingError::InvalidAspectRatio { aspect });
        }
        let (x, y, z) = view.rotation();
        let orbit = Quat::from_euler(EulerRot::XYZ, x, y, z).inverse();
        Ok(Self {
            kind: view.camera(),
            eye: orbit * Vec3::new(0.0, 0.0, CAMERA_DISTANCE),
            up: orbit * Vec3::Y,
            aspect,
        })
    }

    /// Projection in use.
    #[must_use]
    pub const fn kind(&self) -> CameraKind {
        self.kind
    }

    /// Eye position in world space.
    #[must_use]
    pub const fn eye(&self) -> Vec3 {
        self.eye
    }

    /// Up vector in world space.
    #[must_use]
    pub const fn up(&self) -> Vec3 {
        self.up
    }

    /// Vertical extent: world height for orthographic, radians for perspective.
    #[must_use]
    pub fn vertical_extent(&self) -> f32 {
        match self.kind {
            CameraKind::Orthographic => ORTHOGRAPHIC_HEIGHT,
            CameraKind::Perspective => PERSPECTIVE_FOV_DEGREES.to_radians(),
        }
    }

    /// World to eye transform.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, Vec3::ZERO, self.up)
    }

    /// Eye to clip transform.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        match self.kind {
            CameraKind::Orthographic => {
                let top = ORTHOGRAPHIC_HEIGHT * 0.5;
                let right = top * self.aspect;
                Mat4::orthographic_rh_gl(-right, right, -top, top, NEAR_PLANE, FAR_PLANE)
            }
            CameraKind::Perspective => Mat4::perspective_rh_gl(
                PERSPECTIVE_FOV_DEGREES.to_radians(),
                self.aspect,
                NEAR_PLANE,
                FAR_PLANE,
            ),
        }
    }

    /// Ray from the near plane through normalized device coordinates.
    #[must_use]
    pub fn ray_through(&self, x: f32, y: f32) -> Option<Ray> {
        let inverse = (self.projection_matrix() * self.view_matrix()).inverse();
        let near = inverse.project_point3(Vec3::new(x, y, -1.0));
        let far = inverse.project_point3(Vec3::new(x, y, 1.0));
        let direction = (far - near).try_normalize()?;
        Some(Ray {
            origin: near,
            direction,
        })
    }
}

/// [`Picker`] that casts a camera ray against scene graph boxes.
///
/// Hidden placeholder cells are skipped so clicks reach the surfaces that
/// replace them visually.
#[derive(Clone, Copy, Debug)]
pub struct RayPicker<'a> {
    scene: &'a SceneGraph,
    rig: CameraRig,
}

impl<'a> RayPicker<'a> {
    /// Creates a picker over `scene` as seen through `rig`.
    #[must_use]
    pub const fn new(scene: &'a SceneGraph, rig: CameraRig) -> Self {
        Self { scene, rig }
    }
}

impl Picker for RayPicker<'_> {
    fn pick(&self, x: f32, y: f32, candidates: &[PickTarget]) -> Option<PickTarget> {
        let ray = self.rig.ray_through(x, y)?;
        candidates
            .iter()
            .filter_map(|target| {
                let handle = self.scene.handle(*target).filter(|handle| handle.is_visible())?;
                ray.intersect_box(handle.min(), handle.max())
                    .map(|distance| (distance, *target))
            })
            .min_by(|left, right| left.0.total_cmp(&right.0))
            .map(|(_, target)| target)
    }
}
