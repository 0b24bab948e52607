//! Error types for lorenz-trail.
//!
//! Configuration problems are rejected up front when an [`Attractor`] or
//! [`TrajectoryBuffer`] is built. Numerical blow-up of the trajectory is not
//! an error and never shows up here.
//!
//! [`Attractor`]: crate::Attractor
//! [`TrajectoryBuffer`]: crate::TrajectoryBuffer

use std::fmt;

/// Errors raised while loading or validating a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Trajectory capacity below two points (no segment can be formed).
    InvalidCapacity(usize),
    /// Integration time step is zero, negative or not finite.
    InvalidTimeStep(f64),
    /// Speed normalization bound is zero, negative or not finite.
    InvalidMaxVelocity(f32),
    /// A Lorenz parameter is zero, negative or not finite.
    InvalidParameter {
        /// Parameter name (`sigma`, `rho` or `beta`).
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// `steps_per_frame` is zero.
    InvalidStepsPerFrame,
    /// Color gradient has no keys.
    EmptyGradient,
    /// A gradient key position is NaN or infinite.
    InvalidGradientKey(f32),
    /// Camera limits are inconsistent.
    InvalidCamera(String),
    /// Failed to read or write the settings file.
    Io(std::io::Error),
    /// Settings file is not valid JSON for [`AttractorConfig`](crate::AttractorConfig).
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCapacity(c) => {
                write!(f, "Trajectory capacity must be at least 2 points, got {}", c)
            }
            ConfigError::InvalidTimeStep(dt) => {
                write!(f, "Time step must be finite and positive, got {}", dt)
            }
            ConfigError::InvalidMaxVelocity(v) => {
                write!(f, "Max velocity must be finite and positive, got {}", v)
            }
            ConfigError::InvalidParameter { name, value } => {
                write!(f, "Lorenz parameter `{}` must be finite and positive, got {}", name, value)
            }
            ConfigError::InvalidStepsPerFrame => write!(f, "steps_per_frame must be at least 1"),
            ConfigError::EmptyGradient => write!(f, "Color gradient needs at least one key"),
            ConfigError::InvalidGradientKey(t) => {
                write!(f, "Gradient key position must be finite, got {}", t)
            }
            ConfigError::InvalidCamera(msg) => write!(f, "Invalid camera settings: {}", msg),
            ConfigError::Io(e) => write!(f, "Failed to access settings file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse settings: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// A trajectory buffer would exceed the device's `max_buffer_size`.
    BufferTooLarge {
        label: &'static str,
        size: u64,
        limit: u64,
    },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::BufferTooLarge { label, size, limit } => write!(
                f,
                "{} buffer needs {} bytes but the device allows {}; lower max_points",
                label, size, limit
            ),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter | GpuError::BufferTooLarge { .. } => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur when running the visualization window.
#[derive(Debug)]
pub enum RunError {
    /// Failed to create or run the event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// Configuration was rejected.
    Config(ConfigError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::EventLoop(e) => write!(f, "Event loop error: {}", e),
            RunError::Window(e) => write!(f, "Failed to create window: {}", e),
            RunError::Gpu(e) => write!(f, "GPU error: {}", e),
            RunError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::EventLoop(e) => Some(e),
            RunError::Window(e) => Some(e),
            RunError::Gpu(e) => Some(e),
            RunError::Config(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for RunError {
    fn from(e: winit::error::EventLoopError) -> Self {
        RunError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for RunError {
    fn from(e: winit::error::OsError) -> Self {
        RunError::Window(e)
    }
}

impl From<GpuError> for RunError {
    fn from(e: GpuError) -> Self {
        RunError::Gpu(e)
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        RunError::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        let msg = ConfigError::InvalidCapacity(1).to_string();
        assert!(msg.contains("at least 2"));
        assert!(msg.contains('1'));

        let msg = ConfigError::InvalidParameter { name: "rho", value: -1.0 }.to_string();
        assert!(msg.contains("rho"));
    }

    #[test]
    fn test_parse_error_has_source() {
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = RunError::from(ConfigError::from(parse));
        let source = std::error::Error::source(&err).expect("run error wraps config error");
        assert!(std::error::Error::source(source).is_some());
    }
}
