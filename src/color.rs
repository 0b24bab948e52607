//! Speed-to-color mapping for trajectory points.
//!
//! Each new point is colored by how fast the system is moving at that point:
//! the speed is normalized against a configured maximum and looked up in a
//! [`Gradient`].
//!
//! ```
//! use glam::DVec3;
//! use lorenz_trail::color::{speed_color, Palette};
//!
//! let gradient = Palette::Inferno.gradient();
//! let slow = speed_color(DVec3::ZERO, 150.0, &gradient);
//! let fast = speed_color(DVec3::new(500.0, 0.0, 0.0), 150.0, &gradient);
//! assert_eq!(slow, gradient.evaluate(0.0));
//! assert_eq!(fast, gradient.evaluate(1.0));
//! ```

use glam::{DVec3, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A single color stop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientKey {
    /// Position of the stop in `[0, 1]`.
    pub t: f32,
    /// RGBA color at the stop.
    pub color: Vec4,
}

/// Piecewise-linear color ramp over `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    keys: Vec<GradientKey>,
}

impl Gradient {
    /// Build a gradient from color stops. Keys are sorted by `t` and clamped
    /// into `[0, 1]`; a non-finite `t` is rejected.
    pub fn new(mut keys: Vec<GradientKey>) -> Result<Self, ConfigError> {
        if keys.is_empty() {
            return Err(ConfigError::EmptyGradient);
        }
        if let Some(bad) = keys.iter().find(|k| !k.t.is_finite()) {
            return Err(ConfigError::InvalidGradientKey(bad.t));
        }
        for key in &mut keys {
            key.t = key.t.clamp(0.0, 1.0);
        }
        keys.sort_by(|a, b| a.t.total_cmp(&b.t));
        Ok(Self { keys })
    }

    pub fn keys(&self) -> &[GradientKey] {
        &self.keys
    }

    /// Sample the gradient. `t` is clamped to `[0, 1]`; before the first key
    /// and after the last one the end colors are held.
    pub fn evaluate(&self, t: f32) -> Vec4 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let first = self.keys[0];
        if t <= first.t {
            return first.color;
        }

        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.t {
                let span = b.t - a.t;
                if t == b.t || span <= f32::EPSILON {
                    return b.color;
                }
                return a.color.lerp(b.color, (t - a.t) / span);
            }
        }

        self.keys[self.keys.len() - 1].color
    }
}

impl Default for Gradient {
    fn default() -> Self {
        Palette::default().gradient()
    }
}

/// Built-in color palettes (five stops each).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Palette {
    /// Viridis - perceptually uniform, colorblind-friendly (purple to yellow).
    Viridis,
    /// Magma - black to light yellow through purple and pink.
    Magma,
    /// Plasma - dark blue to yellow through pink.
    Plasma,
    /// Inferno - black to light yellow through red and orange.
    #[default]
    Inferno,
    /// Fire - dark red through orange to white-yellow.
    Fire,
    /// Ocean - deep blue to cyan.
    Ocean,
    /// Rainbow - red through violet.
    Rainbow,
    /// Grayscale - black to white.
    Grayscale,
}

impl Palette {
    /// Color stops for this palette, slow to fast.
    pub fn colors(&self) -> [Vec3; 5] {
        match self {
            Palette::Viridis => [
                Vec3::new(0.267, 0.004, 0.329),
                Vec3::new(0.282, 0.140, 0.458),
                Vec3::new(0.127, 0.566, 0.551),
                Vec3::new(0.369, 0.789, 0.383),
                Vec3::new(0.993, 0.906, 0.144),
            ],
            Palette::Magma => [
                Vec3::new(0.001, 0.0, 0.014),
                Vec3::new(0.329, 0.071, 0.435),
                Vec3::new(0.716, 0.215, 0.475),
                Vec3::new(0.994, 0.541, 0.380),
                Vec3::new(0.987, 0.991, 0.749),
            ],
            Palette::Plasma => [
                Vec3::new(0.050, 0.030, 0.528),
                Vec3::new(0.494, 0.012, 0.658),
                Vec3::new(0.798, 0.280, 0.470),
                Vec3::new(0.973, 0.580, 0.254),
                Vec3::new(0.940, 0.975, 0.131),
            ],
            Palette::Inferno => [
                Vec3::new(0.001, 0.0, 0.014),
                Vec3::new(0.341, 0.063, 0.429),
                Vec3::new(0.735, 0.216, 0.330),
                Vec3::new(0.988, 0.645, 0.198),
                Vec3::new(0.988, 1.0, 0.644),
            ],
            Palette::Fire => [
                Vec3::new(0.1, 0.0, 0.0),
                Vec3::new(0.5, 0.0, 0.0),
                Vec3::new(1.0, 0.3, 0.0),
                Vec3::new(1.0, 0.7, 0.0),
                Vec3::new(1.0, 1.0, 0.8),
            ],
            Palette::Ocean => [
                Vec3::new(0.0, 0.05, 0.15),
                Vec3::new(0.0, 0.2, 0.4),
                Vec3::new(0.0, 0.4, 0.6),
                Vec3::new(0.2, 0.6, 0.8),
                Vec3::new(0.6, 0.9, 1.0),
            ],
            Palette::Rainbow => [
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 1.0),
                Vec3::new(0.5, 0.0, 1.0),
            ],
            Palette::Grayscale => [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.25, 0.25, 0.25),
                Vec3::new(0.5, 0.5, 0.5),
                Vec3::new(0.75, 0.75, 0.75),
                Vec3::new(1.0, 1.0, 1.0),
            ],
        }
    }

    pub fn gradient(&self) -> Gradient {
        let colors = self.colors();
        let keys = colors
            .iter()
            .enumerate()
            .map(|(i, c)| GradientKey {
                t: i as f32 / 4.0,
                color: c.extend(1.0),
            })
            .collect();
        Gradient { keys }
    }
}

/// Color ramp as written in a settings file.
///
/// ```json
/// { "palette": "Viridis" }
/// { "keys": [ { "t": 0.0, "color": [0, 0, 1, 1] }, { "t": 1.0, "color": [1, 0, 0, 1] } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRamp {
    Palette(Palette),
    Keys(Vec<GradientKey>),
}

impl ColorRamp {
    pub fn to_gradient(&self) -> Result<Gradient, ConfigError> {
        match self {
            ColorRamp::Palette(p) => Ok(p.gradient()),
            ColorRamp::Keys(keys) => Gradient::new(keys.clone()),
        }
    }
}

impl Default for ColorRamp {
    fn default() -> Self {
        ColorRamp::Palette(Palette::default())
    }
}

/// `|velocity| / max_velocity`, clamped to `[0, 1]`.
#[inline]
pub fn normalized_speed(velocity: DVec3, max_velocity: f32) -> f32 {
    let speed = (velocity.length() / max_velocity as f64) as f32;
    speed.clamp(0.0, 1.0)
}

/// Color for a point moving with `velocity`.
pub fn speed_color(velocity: DVec3, max_velocity: f32, gradient: &Gradient) -> Vec4 {
    gradient.evaluate(normalized_speed(velocity, max_velocity))
}
