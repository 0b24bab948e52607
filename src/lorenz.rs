//! Lorenz system integration.
//!
//! The attractor is defined by three coupled differential equations:
//!   dx/dt = σ(y - x)
//!   dy/dt = x(ρ - z) - y
//!   dz/dt = xy - βz
//!
//! With the classic parameters σ=10, ρ=28, β=8/3 the system is chaotic:
//! nearby trajectories diverge exponentially while staying on the
//! butterfly-shaped attractor.
//!
//! # Example
//!
//! ```
//! use lorenz_trail::{Lorenz, State};
//!
//! let lorenz = Lorenz::default();
//! let mut state = State::new(1.0, 1.0, 1.0);
//! for _ in 0..100 {
//!     state = lorenz.step(state, 0.01);
//! }
//! assert!(state.is_finite());
//! ```

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Instantaneous position in phase space.
pub type State = DVec3;

/// Lorenz system parameters, fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LorenzParams {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
}

impl LorenzParams {
    /// Classic parameters from Lorenz's 1963 paper.
    pub const CLASSIC: Self = Self {
        sigma: 10.0,
        rho: 28.0,
        beta: 8.0 / 3.0,
    };

    /// Reject non-positive or non-finite parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("sigma", self.sigma), ("rho", self.rho), ("beta", self.beta)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

impl Default for LorenzParams {
    fn default() -> Self {
        Self::CLASSIC
    }
}

/// Fourth-order Runge-Kutta integrator for the Lorenz vector field.
///
/// Stateless apart from its parameters: identical `(state, dt)` inputs always
/// produce bit-identical outputs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lorenz {
    params: LorenzParams,
}

impl Lorenz {
    pub fn new(params: LorenzParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &LorenzParams {
        &self.params
    }

    /// Evaluate the vector field `F(p)` at `state`.
    #[inline]
    pub fn derivative(&self, state: State) -> DVec3 {
        let LorenzParams { sigma, rho, beta } = self.params;
        DVec3::new(
            sigma * (state.y - state.x),
            state.x * (rho - state.z) - state.y,
            state.x * state.y - beta * state.z,
        )
    }

    /// Advance `state` by one classical RK4 step of size `dt`.
    ///
    /// Output magnitude is not checked; large steps or long runs may diverge.
    pub fn step(&self, state: State, dt: f64) -> State {
        let half = 0.5 * dt;

        let k1 = self.derivative(state);
        let k2 = self.derivative(state + half * k1);
        let k3 = self.derivative(state + half * k2);
        let k4 = self.derivative(state + dt * k3);

        state + (dt / 6.0) * (k1 + 2.0 * k2 + 2.0 * k3 + k4)
    }

    /// Fixed points of the field: the origin and, for `ρ > 1`, the two lobe
    /// centers `(±√(β(ρ-1)), ±√(β(ρ-1)), ρ-1)`.
    pub fn equilibria(&self) -> Vec<State> {
        let LorenzParams { rho, beta, .. } = self.params;
        let mut points = vec![DVec3::ZERO];
        if rho > 1.0 {
            let c = (beta * (rho - 1.0)).sqrt();
            points.push(DVec3::new(c, c, rho - 1.0));
            points.push(DVec3::new(-c, -c, rho - 1.0));
        }
        points
    }
}

/// Magnitude from which every f64 is an integer.
const MAX_EXACT_FRACTION: f64 = (1u64 << 52) as f64;

/// Round each component of a seed state to `digits` decimal places.
///
/// Used once on the initial condition to demonstrate sensitivity to it.
/// Ties round to even. Components that already carry no more than `digits`
/// decimals at f64 precision are returned unchanged.
pub fn rounded_initial(state: State, digits: u32) -> State {
    let Ok(exponent) = i32::try_from(digits) else {
        return state;
    };
    let factor = 10f64.powi(exponent);
    let round = |v: f64| {
        let scaled = v * factor;
        if !scaled.is_finite() || scaled.abs() >= MAX_EXACT_FRACTION {
            v
        } else {
            scaled.round_ties_even() / factor
        }
    };
    DVec3::new(round(state.x), round(state.y), round(state.z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_derivative_at_unit_point() {
        let lorenz = Lorenz::default();
        let d = lorenz.derivative(DVec3::ONE);
        assert_eq!(d.x, 0.0);
        assert_eq!(d.y, 26.0);
        assert_abs_diff_eq!(d.z, 1.0 - 8.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_origin_is_fixed_point() {
        let lorenz = Lorenz::default();
        for dt in [1e-4, 0.01, 0.5, 10.0] {
            assert_eq!(lorenz.step(DVec3::ZERO, dt), DVec3::ZERO);
        }
    }

    #[test]
    fn test_lobe_centers_are_equilibria() {
        let lorenz = Lorenz::default();
        let points = lorenz.equilibria();
        assert_eq!(points.len(), 3);
        for p in points {
            assert_abs_diff_eq!(lorenz.derivative(p).length(), 0.0, epsilon = 1e-9);
            let next = lorenz.step(p, 0.01);
            assert_abs_diff_eq!(next.distance(p), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_no_lobes_below_critical_rho() {
        let lorenz = Lorenz::new(LorenzParams { rho: 0.5, ..LorenzParams::CLASSIC });
        assert_eq!(lorenz.equilibria(), vec![DVec3::ZERO]);
    }

    #[test]
    fn test_step_is_deterministic() {
        let lorenz = Lorenz::default();
        let state = DVec3::new(-3.2, 7.9, 21.4);
        let a = lorenz.step(state, 0.013);
        let b = lorenz.step(state, 0.013);
        assert_eq!(a.to_array().map(f64::to_bits), b.to_array().map(f64::to_bits));
    }

    #[test]
    fn test_step_does_not_touch_input() {
        let lorenz = Lorenz::default();
        let state = DVec3::new(1.0, 2.0, 3.0);
        let next = lorenz.step(state, 0.01);
        assert_eq!(state, DVec3::new(1.0, 2.0, 3.0));
        assert_ne!(next, state);
    }

    #[test]
    fn test_step_matches_hand_evaluated_rk4() {
        let (s, r, b) = (10.0_f64, 28.0_f64, 8.0_f64 / 3.0);
        let f = |x: f64, y: f64, z: f64| (s * (y - x), x * (r - z) - y, x * y - b * z);
        let dt = 0.01;

        let (x, y, z) = (1.0, 1.0, 1.0);
        let k1 = f(x, y, z);
        let k2 = f(x + dt / 2.0 * k1.0, y + dt / 2.0 * k1.1, z + dt / 2.0 * k1.2);
        let k3 = f(x + dt / 2.0 * k2.0, y + dt / 2.0 * k2.1, z + dt / 2.0 * k2.2);
        let k4 = f(x + dt * k3.0, y + dt * k3.1, z + dt * k3.2);
        let expected = (
            x + dt / 6.0 * (k1.0 + 2.0 * k2.0 + 2.0 * k3.0 + k4.0),
            y + dt / 6.0 * (k1.1 + 2.0 * k2.1 + 2.0 * k3.1 + k4.1),
            z + dt / 6.0 * (k1.2 + 2.0 * k2.2 + 2.0 * k3.2 + k4.2),
        );

        let got = Lorenz::default().step(DVec3::ONE, dt);
        assert_abs_diff_eq!(got.x, expected.0, epsilon = 1e-6);
        assert_abs_diff_eq!(got.y, expected.1, epsilon = 1e-6);
        assert_abs_diff_eq!(got.z, expected.2, epsilon = 1e-6);
    }

    #[test]
    fn test_trajectory_stays_on_attractor() {
        let lorenz = Lorenz::default();
        let mut state = DVec3::new(5.0, 5.0, 15.0);
        for _ in 0..20_000 {
            state = lorenz.step(state, 0.01);
        }
        assert!(state.is_finite());
        assert!(state.x.abs() < 30.0 && state.y.abs() < 40.0);
        assert!(state.z > 0.0 && state.z < 60.0);
    }

    #[test]
    fn test_huge_step_diverges_without_panicking() {
        let lorenz = Lorenz::default();
        let mut state = DVec3::new(5.0, 5.0, 15.0);
        for _ in 0..50 {
            state = lorenz.step(state, 1.0);
        }
        assert!(!state.is_finite() || state.length() > 1e3);
    }

    #[test]
    fn test_rounded_initial() {
        let rounded = rounded_initial(DVec3::new(1.23456, 0.0, 0.0), 2);
        assert_eq!(rounded, DVec3::new(1.23, 0.0, 0.0));

        let rounded = rounded_initial(DVec3::new(5.0004, -2.71828, 15.9999), 3);
        assert_eq!(rounded, DVec3::new(5.0, -2.718, 16.0));
    }

    #[test]
    fn test_rounded_initial_zero_digits_ties_to_even() {
        let rounded = rounded_initial(DVec3::new(2.5, 3.5, -0.4), 0);
        assert_eq!(rounded, DVec3::new(2.0, 4.0, -0.0));
    }

    #[test]
    fn test_rounded_initial_beyond_f64_precision_is_identity() {
        let seed = DVec3::new(5.0, 0.0, 15.0);
        for digits in [17, 308, 400, u32::MAX] {
            let rounded = rounded_initial(seed, digits);
            assert!(rounded.is_finite(), "digits {} gave {:?}", digits, rounded);
            assert_eq!(rounded, seed, "digits {}", digits);
        }

        let fine = DVec3::new(1e-20, -2.5e-18, 3.0);
        assert_eq!(rounded_initial(fine, 400), fine);
    }

    #[test]
    fn test_params_validate() {
        assert!(LorenzParams::CLASSIC.validate().is_ok());

        let bad = LorenzParams { beta: 0.0, ..LorenzParams::CLASSIC };
        match bad.validate() {
            Err(ConfigError::InvalidParameter { name, .. }) => assert_eq!(name, "beta"),
            other => panic!("expected beta rejection, got {:?}", other),
        }

        let bad = LorenzParams { sigma: f64::NAN, ..LorenzParams::CLASSIC };
        assert!(bad.validate().is_err());
    }
}
