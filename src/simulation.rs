//! Simulation builder and runner

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::attractor::Attractor;
use crate::camera::OrbitCamera;
use crate::config::AttractorConfig;
use crate::error::{ConfigError, RunError};
use crate::gpu::GpuState;
#[cfg(feature = "egui")]
use crate::gpu::EguiIntegration;
use crate::input::{Action, Input};
use crate::time::FrameClock;

/// Windowed Lorenz attractor viewer.
///
/// ```ignore
/// use lorenz_trail::{AttractorConfig, Simulation};
///
/// Simulation::new(AttractorConfig::default())
///     .with_title("Lorenz")
///     .with_window_size(1600, 900)
///     .run()?;
/// ```
pub struct Simulation {
    config: AttractorConfig,
    title: String,
    window_size: (u32, u32),
}

impl Simulation {
    pub fn new(config: AttractorConfig) -> Self {
        Self {
            config,
            title: "Lorenz Attractor".to_string(),
            window_size: (1280, 720),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Initial window size in logical pixels.
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    pub fn config(&self) -> &AttractorConfig {
        &self.config
    }

    /// Open the window and run until it is closed.
    ///
    /// The configuration is validated before any window is created.
    pub fn run(self) -> Result<(), RunError> {
        let viewer = Viewer::new(&self.config)?;
        info!(
            max_points = self.config.max_points,
            time_step = self.config.time_step,
            steps_per_frame = self.config.steps_per_frame,
            "starting attractor"
        );

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(viewer, self.title, self.window_size);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Window-independent per-frame state.
struct Viewer {
    attractor: Attractor,
    camera: OrbitCamera,
    input: Input,
    steps_per_frame: u32,
    paused: bool,
}

impl Viewer {
    fn new(config: &AttractorConfig) -> Result<Self, ConfigError> {
        let attractor = Attractor::new(config)?;
        let camera = OrbitCamera::new(config.camera, attractor.centroid());
        Ok(Self {
            attractor,
            camera,
            input: Input::new(),
            steps_per_frame: config.steps_per_frame,
            paused: false,
        })
    }

    /// Returns true when the action asks to quit.
    fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::TogglePause => {
                self.paused = !self.paused;
                info!(paused = self.paused, ticks = self.attractor.ticks(), "toggled pause");
            }
            Action::StepOnce => {
                if self.paused {
                    let point = self.attractor.tick();
                    debug!(tick = self.attractor.ticks(), position = ?point.position, "single step");
                }
            }
            Action::Reset => {
                self.attractor.reset();
                info!(seed = ?self.attractor.seed(), "reset trajectory");
            }
            Action::Quit => return true,
        }
        false
    }

    /// Consume this frame's input, tick the attractor and move the camera.
    /// Returns true when the user asked to quit.
    fn update(&mut self, dt: f32) -> bool {
        let actions: Vec<Action> = self.input.actions().collect();
        let mut quit = false;
        for action in actions {
            quit |= self.apply(action);
        }

        if !self.paused {
            self.attractor.advance(self.steps_per_frame);
        }

        self.camera.drag(self.input.drag_delta());
        self.camera.zoom(self.input.scroll_delta());
        self.camera.update(dt, self.attractor.centroid());
        self.input.end_frame();

        quit
    }
}

fn window_title(base: &str, points: usize, fps: f32) -> String {
    format!("{} | {} points | {:.0} fps", base, points, fps)
}

struct App {
    viewer: Viewer,
    title: String,
    window_size: (u32, u32),
    clock: FrameClock,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    #[cfg(feature = "egui")]
    overlay: Option<EguiIntegration>,
    /// First fatal error; returned from [`Simulation::run`].
    error: Option<RunError>,
}

impl App {
    fn new(viewer: Viewer, title: String, window_size: (u32, u32)) -> Self {
        Self {
            viewer,
            title,
            window_size,
            clock: FrameClock::new(),
            window: None,
            gpu_state: None,
            #[cfg(feature = "egui")]
            overlay: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: RunError) {
        error!(%err, "shutting down");
        if self.error.is_none() {
            self.error = Some(err);
        }
        event_loop.exit();
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), RunError> {
        let (width, height) = self.window_size;
        let window_attrs = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let trail = self.viewer.attractor.trajectory();
        let gpu_state = pollster::block_on(GpuState::new(window.clone(), trail.capacity(), trail.indices()))?;

        #[cfg(feature = "egui")]
        {
            self.overlay = Some(EguiIntegration::new(gpu_state.device(), gpu_state.config.format, &window));
        }

        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.update();
        if self.viewer.update(dt) {
            event_loop.exit();
            return;
        }

        let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) else {
            return;
        };

        if self.clock.fps_refreshed() {
            let points = self.viewer.attractor.trajectory().len();
            window.set_title(&window_title(&self.title, points, self.clock.fps()));
        }

        let snapshot = self.viewer.attractor.snapshot();
        gpu_state.upload(&snapshot);
        let segment_count = snapshot.segment_count as u32;
        let view_proj = self.viewer.camera.view_proj(gpu_state.aspect());

        #[cfg(feature = "egui")]
        let result = match self.overlay.as_mut() {
            Some(overlay) => {
                let viewer = &mut self.viewer;
                let fps = self.clock.fps();
                let frame = overlay.run(window, |ctx| overlay_panel(ctx, viewer, fps));
                gpu_state.render_with_overlay(view_proj, segment_count, overlay, &frame)
            }
            None => gpu_state.render(view_proj, segment_count),
        };
        #[cfg(not(feature = "egui"))]
        let result = gpu_state.render(view_proj, segment_count);

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost, reconfiguring");
                gpu_state.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => warn!(error = ?e, "render error"),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.init_window(event_loop) {
                self.fail(event_loop, err);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        if let (Some(overlay), Some(window)) = (self.overlay.as_mut(), self.window.as_ref()) {
            if overlay.on_window_event(window, &event) {
                return;
            }
        }

        self.viewer.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

#[cfg(feature = "egui")]
fn overlay_panel(ctx: &egui::Context, viewer: &mut Viewer, fps: f32) {
    egui::Window::new("Lorenz")
        .default_pos([12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            let attractor = &mut viewer.attractor;
            let state = attractor.state();
            let centroid = attractor.centroid();

            ui.label(format!("{:.0} fps", fps));
            ui.label(format!("ticks: {}", attractor.ticks()));
            ui.label(format!(
                "points: {} / {}",
                attractor.trajectory().len(),
                attractor.trajectory().capacity()
            ));
            ui.label(format!("state: ({:.3}, {:.3}, {:.3})", state.x, state.y, state.z));
            ui.label(format!(
                "centroid: ({:.3}, {:.3}, {:.3})",
                centroid.x, centroid.y, centroid.z
            ));

            ui.separator();
            ui.horizontal(|ui| {
                let label = if viewer.paused { "Resume" } else { "Pause" };
                if ui.button(label).clicked() {
                    viewer.apply(Action::TogglePause);
                }
                if ui.add_enabled(viewer.paused, egui::Button::new("Step")).clicked() {
                    viewer.apply(Action::StepOnce);
                }
                if ui.button("Reset").clicked() {
                    viewer.apply(Action::Reset);
                }
            });

            ui.separator();
            let attractor = &mut viewer.attractor;
            let mut time_step = attractor.time_step();
            if ui
                .add(egui::Slider::new(&mut time_step, 0.0005..=0.05).logarithmic(true).text("time step"))
                .changed()
            {
                if let Err(err) = attractor.set_time_step(time_step) {
                    warn!(%err, "rejected time step");
                }
            }

            let mut max_velocity = attractor.max_velocity();
            if ui
                .add(egui::Slider::new(&mut max_velocity, 1.0..=500.0).text("max velocity"))
                .changed()
            {
                if let Err(err) = attractor.set_max_velocity(max_velocity) {
                    warn!(%err, "rejected max velocity");
                }
            }

            ui.add(egui::Slider::new(&mut viewer.steps_per_frame, 1..=50).text("steps / frame"));
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer(max_points: usize) -> Viewer {
        let config = AttractorConfig {
            max_points,
            ..Default::default()
        };
        Viewer::new(&config).unwrap()
    }

    #[test]
    fn test_builder() {
        let sim = Simulation::new(AttractorConfig::default())
            .with_title("test")
            .with_window_size(640, 480);
        assert_eq!(sim.title, "test");
        assert_eq!(sim.window_size, (640, 480));
        assert_eq!(sim.config().max_points, 10_000);
    }

    #[test]
    fn test_invalid_config_fails_before_window() {
        let config = AttractorConfig {
            max_points: 0,
            ..Default::default()
        };
        let result = Simulation::new(config).run();
        assert!(matches!(result, Err(RunError::Config(ConfigError::InvalidCapacity(0)))));
    }

    #[test]
    fn test_update_ticks_steps_per_frame() {
        let config = AttractorConfig {
            steps_per_frame: 4,
            ..Default::default()
        };
        let mut viewer = Viewer::new(&config).unwrap();
        assert!(!viewer.update(1.0 / 60.0));
        assert!(!viewer.update(1.0 / 60.0));
        assert_eq!(viewer.attractor.ticks(), 8);
    }

    #[test]
    fn test_pause_and_single_step() {
        let mut viewer = viewer(100);
        viewer.update(0.016);
        viewer.apply(Action::TogglePause);

        viewer.update(0.016);
        assert_eq!(viewer.attractor.ticks(), 1);

        viewer.apply(Action::StepOnce);
        assert_eq!(viewer.attractor.ticks(), 2);

        viewer.apply(Action::TogglePause);
        viewer.apply(Action::StepOnce);
        assert_eq!(viewer.attractor.ticks(), 2);
    }

    #[test]
    fn test_reset_and_quit() {
        let mut viewer = viewer(100);
        for _ in 0..10 {
            viewer.update(0.016);
        }
        assert!(!viewer.apply(Action::Reset));
        assert!(viewer.attractor.trajectory().is_empty());
        assert_eq!(viewer.attractor.ticks(), 0);
        assert!(viewer.apply(Action::Quit));
    }

    #[test]
    fn test_camera_moves_toward_centroid() {
        let mut viewer = viewer(500);
        let start = viewer.camera.center;
        for _ in 0..120 {
            viewer.update(1.0 / 60.0);
        }
        assert_ne!(viewer.camera.center, start);
        assert!(viewer.camera.center.is_finite());
    }

    #[test]
    fn test_window_title() {
        assert_eq!(window_title("Lorenz", 42, 59.6), "Lorenz | 42 points | 60 fps");
    }
}
