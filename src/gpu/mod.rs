//! wgpu line renderer for the trajectory.
//!
//! The index table never changes after startup, so it is uploaded once.
//! Each frame only the `count` live vertices and colors are written, and
//! the draw call slices the first `2 * segment_count` indices.

#[cfg(feature = "egui")]
mod egui_integration;

#[cfg(feature = "egui")]
pub use egui_integration::{EguiFrameOutput, EguiIntegration};

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use tracing::info;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::GpuError;
use crate::trajectory::Snapshot;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub(crate) const LINE_SHADER: &str = include_str!("line.wgsl");

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.05,
    a: 1.0,
};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    position_buffer: wgpu::Buffer,
    color_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    depth_texture: wgpu::TextureView,
    /// Vertex slots available; matches the trajectory capacity.
    capacity: u32,
}

impl GpuState {
    /// Create the surface, pipeline and buffers for a trajectory of
    /// `capacity` points whose segment table is `indices`.
    pub async fn new(window: Arc<Window>, capacity: usize, indices: &[u32]) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        info!(adapter = %info.name, backend = ?info.backend, "selected GPU adapter");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let [positions_size, colors_size, _] =
            check_buffer_sizes(capacity, device.limits().max_buffer_size)?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);

        let position_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Trajectory Positions"),
            size: positions_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let color_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Trajectory Colors"),
            size: colors_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Trajectory Segments"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let uniforms = Uniforms {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Line Shader"),
            source: wgpu::ShaderSource::Wgsl(LINE_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Line Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vec3>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vec4>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![1 => Float32x4],
                    },
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            position_buffer,
            color_buffer,
            index_buffer,
            uniform_buffer,
            uniform_bind_group,
            depth_texture,
            capacity: capacity as u32,
        })
    }

    #[cfg(feature = "egui")]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface at its current size after it was lost.
    pub fn reconfigure(&mut self) {
        let size = winit::dpi::PhysicalSize::new(self.config.width, self.config.height);
        self.resize(size);
    }

    /// Write the live part of `snapshot` to the vertex buffers.
    pub fn upload(&self, snapshot: &Snapshot<'_>) {
        if snapshot.is_empty() {
            return;
        }
        self.queue
            .write_buffer(&self.position_buffer, 0, bytemuck::cast_slice(snapshot.vertices));
        self.queue
            .write_buffer(&self.color_buffer, 0, bytemuck::cast_slice(snapshot.colors));
    }

    /// Draw `segment_count` line segments with the given camera.
    pub fn render(&mut self, view_proj: Mat4, segment_count: u32) -> Result<(), wgpu::SurfaceError> {
        let (output, view, mut encoder) = self.begin_frame(view_proj)?;
        self.draw_lines(&mut encoder, &view, segment_count);
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Draw the trajectory, then paint the overlay on top.
    #[cfg(feature = "egui")]
    pub fn render_with_overlay(
        &mut self,
        view_proj: Mat4,
        segment_count: u32,
        overlay: &mut EguiIntegration,
        frame: &EguiFrameOutput,
    ) -> Result<(), wgpu::SurfaceError> {
        let (output, view, mut encoder) = self.begin_frame(view_proj)?;
        self.draw_lines(&mut encoder, &view, segment_count);

        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: frame.pixels_per_point,
        };
        let extra = overlay.paint(&self.device, &self.queue, &mut encoder, &view, frame, &screen);

        self.queue
            .submit(extra.into_iter().chain(std::iter::once(encoder.finish())));
        output.present();
        overlay.cleanup(frame);
        Ok(())
    }

    fn begin_frame(
        &self,
        view_proj: Mat4,
    ) -> Result<(wgpu::SurfaceTexture, wgpu::TextureView, wgpu::CommandEncoder), wgpu::SurfaceError> {
        let uniforms = Uniforms {
            view_proj: view_proj.to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        Ok((output, view, encoder))
    }

    fn draw_lines(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, segment_count: u32) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Line Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let index_count = drawn_index_count(segment_count, self.capacity);
        if index_count == 0 {
            return;
        }

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.position_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.color_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..index_count, 0, 0..1);
    }
}

/// Byte sizes of the position, color and index buffers for `capacity`
/// points, rejected when any of them exceeds `limit`.
fn check_buffer_sizes(capacity: usize, limit: u64) -> Result<[wgpu::BufferAddress; 3], GpuError> {
    let points = capacity as u64;
    let sizes = [
        ("Trajectory Positions", points * std::mem::size_of::<Vec3>() as u64),
        ("Trajectory Colors", points * std::mem::size_of::<Vec4>() as u64),
        ("Trajectory Segments", 2 * points.saturating_sub(1) * std::mem::size_of::<u32>() as u64),
    ];
    for (label, size) in sizes {
        if size > limit {
            return Err(GpuError::BufferTooLarge { label, size, limit });
        }
    }
    Ok(sizes.map(|(_, size)| size))
}

/// Number of indices to draw for `segment_count` segments, never past the
/// end of the static table.
fn drawn_index_count(segment_count: u32, capacity: u32) -> u32 {
    2 * segment_count.min(capacity.saturating_sub(1))
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::TrajectoryBuffer;

    fn validate_wgsl(code: &str) -> Result<naga::Module, String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(module)
    }

    #[test]
    fn test_line_shader_is_valid() {
        let module = validate_wgsl(LINE_SHADER).unwrap();
        let entry_points: Vec<_> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
        assert!(entry_points.contains(&"vs_main"));
        assert!(entry_points.contains(&"fs_main"));
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<Uniforms>(), 64);
    }

    #[test]
    fn test_vertex_strides_match_trajectory_types() {
        assert_eq!(std::mem::size_of::<Vec3>(), 12);
        assert_eq!(std::mem::size_of::<Vec4>(), 16);

        let mut trail = TrajectoryBuffer::new(4).unwrap();
        trail.push(crate::trajectory::ColoredPoint::new(Vec3::X, Vec4::ONE));
        trail.push(crate::trajectory::ColoredPoint::new(Vec3::Y, Vec4::ONE));
        let snapshot = trail.snapshot();
        let bytes: &[u8] = bytemuck::cast_slice(snapshot.vertices);
        assert_eq!(bytes.len(), 2 * 12);
    }

    #[test]
    fn test_buffer_sizes_within_default_limits() {
        let limit = wgpu::Limits::default().max_buffer_size;
        let sizes = check_buffer_sizes(10_000, limit).unwrap();
        assert_eq!(sizes, [120_000, 160_000, 79_992]);
    }

    #[test]
    fn test_oversized_trail_is_an_error() {
        let limit = wgpu::Limits::default().max_buffer_size;
        match check_buffer_sizes(20_000_000, limit) {
            Err(GpuError::BufferTooLarge { label, size, limit: l }) => {
                assert_eq!(label, "Trajectory Colors");
                assert_eq!(size, 320_000_000);
                assert_eq!(l, limit);
            }
            other => panic!("expected BufferTooLarge, got {:?}", other),
        }

        // Positions are the first buffer to overflow a tight limit
        assert!(matches!(
            check_buffer_sizes(100, 1_000),
            Err(GpuError::BufferTooLarge { label: "Trajectory Positions", .. })
        ));
    }

    #[test]
    fn test_drawn_index_count() {
        assert_eq!(drawn_index_count(0, 10), 0);
        assert_eq!(drawn_index_count(1, 10), 2);
        assert_eq!(drawn_index_count(9, 10), 18);
        // Clamped to the static table length
        assert_eq!(drawn_index_count(50, 10), 18);
    }
}
