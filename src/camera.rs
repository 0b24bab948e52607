//! Orbit camera that follows the trajectory.
//!
//! The camera orbits a center point at a given yaw, pitch and distance. Mouse
//! drags and wheel input set targets; every frame the actual values ease
//! toward them with a critically damped spring, so rotation keeps a little
//! inertia after the button is released. With `follow_centroid` the orbit
//! center drifts toward the centroid of the visible trajectory.

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Camera tuning. Angles are in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Degrees per dragged pixel per second.
    pub rotation_speed: f32,
    pub rotation_smooth_time: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Distance change per wheel line.
    pub zoom_speed: f32,
    pub zoom_smooth_time: f32,
    pub center_smooth_time: f32,
    /// Orbit the trajectory centroid instead of the fixed anchor.
    pub follow_centroid: bool,
    pub fov: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            rotation_speed: 200.0,
            rotation_smooth_time: 0.1,
            min_pitch: -20.0,
            max_pitch: 80.0,
            distance: 10.0,
            min_distance: 1.0,
            max_distance: 50.0,
            zoom_speed: 1.0,
            zoom_smooth_time: 0.1,
            center_smooth_time: 0.1,
            follow_centroid: true,
            fov: 45.0,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-90.0..=90.0).contains(&self.min_pitch)
            || !(-90.0..=90.0).contains(&self.max_pitch)
            || self.min_pitch > self.max_pitch
        {
            return Err(ConfigError::InvalidCamera(format!(
                "pitch range [{}, {}] must lie within [-90, 90]",
                self.min_pitch, self.max_pitch
            )));
        }
        if !(self.min_distance > 0.0 && self.min_distance <= self.max_distance) {
            return Err(ConfigError::InvalidCamera(format!(
                "distance range [{}, {}] must be positive and ordered",
                self.min_distance, self.max_distance
            )));
        }
        let smooth_times = [self.rotation_smooth_time, self.zoom_smooth_time, self.center_smooth_time];
        if smooth_times.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(ConfigError::InvalidCamera("smooth times must be >= 0".into()));
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(ConfigError::InvalidCamera(format!("fov {} out of range", self.fov)));
        }
        Ok(())
    }
}

/// Orbit camera for viewing the attractor.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Horizontal rotation in degrees.
    pub yaw: f32,
    /// Vertical rotation in degrees.
    pub pitch: f32,
    /// Current distance from the center.
    pub distance: f32,
    /// Point the camera orbits around.
    pub center: Vec3,
    target_distance: f32,
    rotation_velocity: Vec2,
    distance_velocity: f32,
    center_velocity: Vec3,
    /// Mouse drag accumulated since the last update, in pixels.
    pending_drag: Vec2,
    config: CameraConfig,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig, center: Vec3) -> Self {
        let distance = config.distance.clamp(config.min_distance, config.max_distance);
        Self {
            yaw: 0.0,
            pitch: 0.0f32.clamp(config.min_pitch, config.max_pitch),
            distance,
            center,
            target_distance: distance,
            rotation_velocity: Vec2::ZERO,
            distance_velocity: 0.0,
            center_velocity: Vec3::ZERO,
            pending_drag: Vec2::ZERO,
            config,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Queue a mouse drag (pixels, winit convention: +y is down).
    pub fn drag(&mut self, delta: Vec2) {
        self.pending_drag += delta;
    }

    /// Queue wheel input in lines; positive moves closer.
    pub fn zoom(&mut self, lines: f32) {
        self.target_distance = (self.target_distance - lines * self.config.zoom_speed)
            .clamp(self.config.min_distance, self.config.max_distance);
    }

    pub fn target_distance(&self) -> f32 {
        self.target_distance
    }

    /// Advance smoothing by `dt` seconds toward `focus`.
    ///
    /// `focus` is only used when `follow_centroid` is set.
    pub fn update(&mut self, dt: f32, focus: Vec3) {
        if dt <= 0.0 {
            return;
        }

        // Rotation: drag sets a per-frame target delta that is eased in
        let drag = std::mem::take(&mut self.pending_drag);
        let target_delta = Vec2::new(-drag.x, drag.y) * self.config.rotation_speed * dt;
        let smooth = self.config.rotation_smooth_time;
        self.yaw += smooth_damp(0.0, target_delta.x, &mut self.rotation_velocity.x, smooth, dt);
        self.pitch += smooth_damp(0.0, target_delta.y, &mut self.rotation_velocity.y, smooth, dt);
        self.pitch = self.pitch.clamp(self.config.min_pitch, self.config.max_pitch);
        self.yaw %= 360.0;

        self.distance = smooth_damp(
            self.distance,
            self.target_distance,
            &mut self.distance_velocity,
            self.config.zoom_smooth_time,
            dt,
        );

        if self.config.follow_centroid && focus.is_finite() {
            self.center = smooth_damp_vec3(
                self.center,
                focus,
                &mut self.center_velocity,
                self.config.center_smooth_time,
                dt,
            );
        }
    }

    /// Camera world position.
    pub fn position(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let x = self.distance * pitch.cos() * yaw.sin();
        let y = self.distance * pitch.sin();
        let z = self.distance * pitch.cos() * yaw.cos();
        self.center + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.center, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        let far = (self.config.max_distance * 4.0).max(100.0);
        Mat4::perspective_rh(self.config.fov.to_radians(), aspect, 0.05, far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }
}

/// Ease `current` toward `target` with a critically damped spring.
///
/// `velocity` carries state between calls. Reaches the target in roughly
/// `smooth_time` seconds and never overshoots it.
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    // Overshoot: output went past the target along the original direction
    if (target - current) * (output - target) > 0.0 {
        output = target;
        *velocity = 0.0;
    }
    output
}

/// [`smooth_damp`] applied per component.
pub fn smooth_damp_vec3(current: Vec3, target: Vec3, velocity: &mut Vec3, smooth_time: f32, dt: f32) -> Vec3 {
    Vec3::new(
        smooth_damp(current.x, target.x, &mut velocity.x, smooth_time, dt),
        smooth_damp(current.y, target.y, &mut velocity.y, smooth_time, dt),
        smooth_damp(current.z, target.z, &mut velocity.z, smooth_time, dt),
    )
}
