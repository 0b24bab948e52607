//! Per-tick driver tying the integrator to the trajectory buffer.

use glam::Vec3;
use tracing::{debug, warn};

use crate::color::{speed_color, Gradient};
use crate::config::{validate_max_velocity, validate_time_step, AttractorConfig};
use crate::error::ConfigError;
use crate::lorenz::{Lorenz, State};
use crate::trajectory::{ColoredPoint, Snapshot, TrajectoryBuffer};

/// A running Lorenz attractor with its visible trail.
///
/// Each [`tick`](Attractor::tick) advances the state by one RK4 step, colors
/// the new point by the speed at the *new* state, and pushes it into the
/// trail.
#[derive(Debug, Clone)]
pub struct Attractor {
    lorenz: Lorenz,
    gradient: Gradient,
    trail: TrajectoryBuffer,
    seed: State,
    state: State,
    time_step: f64,
    visualization_scale: f32,
    max_velocity: f32,
    /// World position of the attractor object, returned as the centroid of
    /// an empty trail.
    anchor: Vec3,
    ticks: u64,
    diverged: bool,
}

impl Attractor {
    /// Validate `config` and allocate the trail.
    pub fn new(config: &AttractorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let seed = config.initial_state();
        if seed != config.initial_position {
            debug!(?seed, "butterfly mode rounded the initial position");
        }

        Ok(Self {
            lorenz: Lorenz::new(config.params),
            gradient: config.color_ramp.to_gradient()?,
            trail: TrajectoryBuffer::new(config.max_points)?,
            seed,
            state: seed,
            time_step: config.time_step,
            visualization_scale: config.visualization_scale,
            max_velocity: config.max_velocity,
            anchor: Vec3::ZERO,
            ticks: 0,
            diverged: false,
        })
    }

    /// Run one integration step and record the resulting point.
    pub fn tick(&mut self) -> ColoredPoint {
        self.state = self.lorenz.step(self.state, self.time_step);

        let velocity = self.lorenz.derivative(self.state);
        let color = speed_color(velocity, self.max_velocity, &self.gradient);
        let point = ColoredPoint::new((self.state * self.visualization_scale as f64).as_vec3(), color);

        self.trail.push(point);
        self.ticks += 1;

        if !self.diverged && !self.state.is_finite() {
            self.diverged = true;
            warn!(tick = self.ticks, dt = self.time_step, "trajectory is no longer finite");
        }

        point
    }

    /// Run `n` ticks.
    pub fn advance(&mut self, n: u32) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Linear view of the trail for rendering.
    pub fn snapshot(&mut self) -> Snapshot<'_> {
        self.trail.snapshot()
    }

    /// Mean of the visible trail, or the anchor when it is empty.
    pub fn centroid(&self) -> Vec3 {
        self.trail.centroid(self.anchor)
    }

    /// Restart from the seed state with an empty trail.
    pub fn reset(&mut self) {
        self.state = self.seed;
        self.trail.clear();
        self.ticks = 0;
        self.diverged = false;
    }

    pub fn set_anchor(&mut self, anchor: Vec3) {
        self.anchor = anchor;
    }

    pub fn set_time_step(&mut self, dt: f64) -> Result<(), ConfigError> {
        validate_time_step(dt)?;
        self.time_step = dt;
        Ok(())
    }

    pub fn set_max_velocity(&mut self, max_velocity: f32) -> Result<(), ConfigError> {
        validate_max_velocity(max_velocity)?;
        self.max_velocity = max_velocity;
        Ok(())
    }

    /// Current phase-space state.
    pub fn state(&self) -> State {
        self.state
    }

    pub fn seed(&self) -> State {
        self.seed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn max_velocity(&self) -> f32 {
        self.max_velocity
    }

    pub fn trajectory(&self) -> &TrajectoryBuffer {
        &self.trail
    }

    pub fn lorenz(&self) -> &Lorenz {
        &self.lorenz
    }
}
