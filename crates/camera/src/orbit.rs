use crate::rig::{CameraRig, Projection, right_vector};
use glam::Vec3;
use scenery_input::{InputEvent, PointerButton, Viewport};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Radians per second of auto-rotation for each unit of `auto_rotate_speed`.
const AUTO_ROTATE_RATE: f32 = TAU / 3600.0;
/// Per-notch zoom base, raised to `zoom_speed`.
const ZOOM_BASE: f32 = 0.95;

/// Numeric limits the controller enforces after every update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConstraints {
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub min_azimuth: f32,
    pub max_azimuth: f32,
}

impl Default for OrbitConstraints {
    fn default() -> Self {
        Self {
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            min_azimuth: f32::NEG_INFINITY,
            max_azimuth: f32::INFINITY,
        }
    }
}

/// Tunable response of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub damping_enabled: bool,
    /// Fraction of the pending motion removed per update, in `(0, 1)`.
    pub damping_factor: f32,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    /// Pan in the view plane; otherwise pan along the plane orthogonal to `up`.
    pub screen_space_panning: bool,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            damping_enabled: false,
            damping_factor: 0.05,
            auto_rotate: false,
            auto_rotate_speed: 2.0,
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
            screen_space_panning: true,
        }
    }
}

/// Y-up spherical coordinates of the camera relative to the orbit target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    /// Polar angle from +Y, `0..=PI`.
    pub phi: f32,
    /// Azimuth around +Y, measured from +Z towards +X.
    pub theta: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    pub fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

/// Motion accumulated from input that has not fully played out yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingMotion {
    pub theta: f32,
    pub phi: f32,
    /// Zoom multiplier; the radius is divided by it on the next update.
    pub scale: f32,
    pub pan: Vec3,
}

impl Default for PendingMotion {
    fn default() -> Self {
        Self {
            theta: 0.0,
            phi: 0.0,
            scale: 1.0,
            pan: Vec3::ZERO,
        }
    }
}

/// Orbits a [`CameraRig`] around a target point.
///
/// Input accumulates into pending motion; [`OrbitController::update`] plays
/// it out, enforces the constraints and writes position and target into the
/// rig. The controller mutates the rig and only reads it back for pan basis
/// vectors.
#[derive(Debug, Clone)]
pub struct OrbitController {
    pub constraints: OrbitConstraints,
    pub settings: OrbitSettings,
    target: Vec3,
    spherical: Spherical,
    pending: PendingMotion,
    zoom_pending: bool,
    saved: (Vec3, Spherical),
}

impl OrbitController {
    /// Start orbiting from the rig's current position around its target.
    pub fn new(rig: &CameraRig) -> Self {
        let target = rig.target();
        let spherical = Spherical::from_offset(rig.position() - target);
        Self {
            constraints: OrbitConstraints::default(),
            settings: OrbitSettings::default(),
            target,
            spherical,
            pending: PendingMotion::default(),
            zoom_pending: false,
            saved: (target, spherical),
        }
    }

    pub fn with_settings(mut self, settings: OrbitSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_constraints(mut self, constraints: OrbitConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Move the orbit pivot. Takes effect on the next update.
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn spherical(&self) -> Spherical {
        self.spherical
    }

    pub fn pending(&self) -> PendingMotion {
        self.pending
    }

    // --- Input ---

    /// Rotate by a pointer drag of `(dx, dy)` pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport: Viewport) {
        if !self.settings.enable_rotate || viewport.is_degenerate() {
            return;
        }
        let speed = self.settings.rotate_speed;
        self.pending.theta -= TAU * dx / viewport.width * speed;
        self.pending.phi -= TAU * dy / viewport.height * speed;
    }

    /// Zoom by wheel notches; positive moves towards the target.
    pub fn zoom(&mut self, notches: f32) {
        if !self.settings.enable_zoom || !notches.is_finite() || notches == 0.0 {
            return;
        }
        self.pending.scale /= ZOOM_BASE.powf(self.settings.zoom_speed).powf(notches);
        self.zoom_pending = true;
    }

    /// Zoom by a pinch ratio; above one moves towards the target.
    pub fn pinch(&mut self, ratio: f32) {
        if !self.settings.enable_zoom || !ratio.is_finite() || ratio <= 0.0 {
            return;
        }
        self.pending.scale *= ratio;
        self.zoom_pending = true;
    }

    /// Pan by a drag of `(dx, dy)` pixels. World distance per pixel scales
    /// with the orbit radius, so the target tracks the pointer at any zoom.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport: Viewport, rig: &CameraRig) {
        if !self.settings.enable_pan || viewport.is_degenerate() {
            return;
        }
        let Some(forward) = (rig.target() - rig.position()).try_normalize() else {
            return;
        };
        let right = right_vector(forward, rig.up());
        let up = if self.settings.screen_space_panning {
            right.cross(forward)
        } else {
            rig.up().cross(right).normalize_or_zero()
        };

        let half_height = match rig.projection() {
            Projection::Perspective { fov_y } => self.spherical.radius * (fov_y * 0.5).tan(),
            Projection::Orthographic { extent } => extent,
        };
        let per_pixel = 2.0 * half_height * self.settings.pan_speed / viewport.height;
        if !per_pixel.is_finite() {
            return;
        }
        self.pending.pan += right * (-dx * per_pixel) + up * (dy * per_pixel);
    }

    /// Route a normalized input event to the matching gesture.
    pub fn handle_input(&mut self, event: &InputEvent, viewport: Viewport, rig: &CameraRig) {
        match *event {
            InputEvent::Drag { button, delta } => match button {
                PointerButton::Primary => self.rotate(delta.x, delta.y, viewport),
                PointerButton::Secondary => self.pan(delta.x, delta.y, viewport, rig),
                PointerButton::Middle => {
                    if delta.y > 0.0 {
                        self.zoom(-1.0);
                    } else if delta.y < 0.0 {
                        self.zoom(1.0);
                    }
                }
            },
            InputEvent::Wheel { notches } => self.zoom(notches),
            InputEvent::Pinch { ratio } => self.pinch(ratio),
            InputEvent::TouchPan { delta } => self.pan(delta.x, delta.y, viewport, rig),
        }
    }

    // --- Tick ---

    /// Advance one tick of `dt` seconds and write the result into `rig`.
    pub fn update(&mut self, rig: &mut CameraRig, dt: f32) {
        if self.settings.auto_rotate {
            self.pending.theta -= AUTO_ROTATE_RATE * self.settings.auto_rotate_speed * dt;
        }

        let c = self.constraints;
        self.spherical.theta = clamp(
            self.spherical.theta + self.pending.theta,
            c.min_azimuth,
            c.max_azimuth,
        );
        self.spherical.phi = clamp(
            self.spherical.phi + self.pending.phi,
            c.min_polar_angle,
            c.max_polar_angle,
        );

        let keep = self.retained_fraction();
        self.pending.theta *= keep;
        self.pending.phi *= keep;

        if self.zoom_pending {
            self.spherical.radius /= self.pending.scale;
            self.pending.scale = 1.0;
            self.zoom_pending = false;
        }
        self.spherical.radius = clamp(self.spherical.radius, c.min_distance, c.max_distance);

        self.target += self.pending.pan;
        rig.set_position(self.target + self.spherical.to_offset());
        rig.look_at(self.target);

        self.pending.pan *= keep;
    }

    /// Remember the current pivot and spherical state for [`OrbitController::reset`].
    pub fn save_state(&mut self) {
        self.saved = (self.target, self.spherical);
    }

    /// Return to the saved state, drop pending motion and update the rig.
    pub fn reset(&mut self, rig: &mut CameraRig) {
        (self.target, self.spherical) = self.saved;
        self.pending = PendingMotion::default();
        self.zoom_pending = false;
        rig.set_position(self.target + self.spherical.to_offset());
        rig.look_at(self.target);
        tracing::debug!(target = ?self.target, "orbit reset");
    }

    fn retained_fraction(&self) -> f32 {
        if self.settings.damping_enabled {
            1.0 - self.settings.damping_factor
        } else {
            0.0
        }
    }
}

/// Clamp without panicking on inverted or NaN bounds.
fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}
