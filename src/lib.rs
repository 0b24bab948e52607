//! # lorenz-trail
//!
//! Real-time visualization of the Lorenz attractor.
//!
//! Each tick integrates the Lorenz system with classical RK4, colors the new
//! point by its speed, and pushes it into a bounded ring buffer. The buffer
//! produces oldest-first snapshots plus a static segment index table, which
//! the wgpu renderer draws as a line list.
//!
//! ## Quick Start
//!
//! ```ignore
//! use lorenz_trail::{AttractorConfig, Simulation};
//!
//! fn main() -> Result<(), lorenz_trail::RunError> {
//!     Simulation::new(AttractorConfig::default()).run()
//! }
//! ```
//!
//! ## Without a window
//!
//! The core types have no GPU dependency and can be driven directly:
//!
//! ```
//! use lorenz_trail::{Attractor, AttractorConfig};
//!
//! let config = AttractorConfig { max_points: 100, ..Default::default() };
//! let mut attractor = Attractor::new(&config)?;
//! attractor.advance(250);
//!
//! let snapshot = attractor.snapshot();
//! assert_eq!(snapshot.vertices.len(), 100);
//! assert_eq!(snapshot.segment_count, 99);
//! # Ok::<(), lorenz_trail::ConfigError>(())
//! ```
//!
//! ## Controls
//!
//! | Input | Effect |
//! |-------|--------|
//! | Left drag | Orbit |
//! | Wheel | Zoom |
//! | `Space` | Pause / resume |
//! | `N` | Single tick while paused |
//! | `R` | Reset |
//! | `Escape` | Quit |
//!
//! With the `egui` feature an overlay shows live statistics and lets the
//! time step and color range be tuned while running.

pub mod attractor;
pub mod camera;
pub mod color;
pub mod config;
pub mod error;
mod gpu;
pub mod input;
pub mod lorenz;
mod simulation;
pub mod time;
pub mod trajectory;

pub use attractor::Attractor;
pub use camera::{CameraConfig, OrbitCamera};
pub use color::{ColorRamp, Gradient, GradientKey, Palette};
pub use config::{AttractorConfig, ButterflyConfig};
pub use error::{ConfigError, GpuError, RunError};
pub use glam::{DVec3, Vec3, Vec4};
pub use lorenz::{rounded_initial, Lorenz, LorenzParams, State};
pub use simulation::Simulation;
pub use time::FrameClock;
pub use trajectory::{ColoredPoint, Snapshot, TrajectoryBuffer};

#[cfg(feature = "egui")]
pub use egui;
