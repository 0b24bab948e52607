//! Settings for an attractor run.
//!
//! These values are read once at startup (from JSON or [`Default`]) and
//! validated before anything is allocated. Every field has a default, so a
//! settings file only needs the values it wants to change:
//!
//! ```json
//! {
//!     "time_step": 0.005,
//!     "max_points": 20000,
//!     "color_ramp": { "palette": "Viridis" },
//!     "butterfly": { "enabled": true, "rounding_digits": 2 }
//! }
//! ```

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::camera::CameraConfig;
use crate::color::ColorRamp;
use crate::error::ConfigError;
use crate::lorenz::{rounded_initial, LorenzParams, State};

/// Seed rounding for the sensitivity-to-initial-conditions demo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButterflyConfig {
    pub enabled: bool,
    /// Decimal digits the initial position is rounded to.
    pub rounding_digits: u32,
}

impl Default for ButterflyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rounding_digits: 3,
        }
    }
}

/// Complete attractor configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractorConfig {
    /// Integration step per tick.
    pub time_step: f64,
    pub initial_position: DVec3,
    /// Factor from phase space to display space.
    pub visualization_scale: f32,
    /// Trajectory ring capacity.
    pub max_points: usize,
    /// Speed mapped to the top of the color ramp.
    pub max_velocity: f32,
    /// Ticks run per rendered frame.
    pub steps_per_frame: u32,
    pub params: LorenzParams,
    pub color_ramp: ColorRamp,
    pub butterfly: ButterflyConfig,
    pub camera: CameraConfig,
}

impl Default for AttractorConfig {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            initial_position: DVec3::new(5.0, 5.0, 15.0),
            visualization_scale: 0.1,
            max_points: 10_000,
            max_velocity: 150.0,
            steps_per_frame: 1,
            params: LorenzParams::default(),
            color_ramp: ColorRamp::default(),
            butterfly: ButterflyConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl AttractorConfig {
    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the simulation cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_points < 2 {
            return Err(ConfigError::InvalidCapacity(self.max_points));
        }
        validate_time_step(self.time_step)?;
        validate_max_velocity(self.max_velocity)?;
        if self.steps_per_frame == 0 {
            return Err(ConfigError::InvalidStepsPerFrame);
        }
        self.params.validate()?;
        self.color_ramp.to_gradient()?;
        self.camera.validate()?;
        Ok(())
    }

    /// Seed state, rounded when butterfly mode is on.
    pub fn initial_state(&self) -> State {
        if self.butterfly.enabled {
            rounded_initial(self.initial_position, self.butterfly.rounding_digits)
        } else {
            self.initial_position
        }
    }
}

pub(crate) fn validate_time_step(dt: f64) -> Result<(), ConfigError> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTimeStep(dt))
    }
}

pub(crate) fn validate_max_velocity(v: f32) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidMaxVelocity(v))
    }
}
