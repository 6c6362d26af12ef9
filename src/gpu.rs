//! Device acquisition, GPU resources, and frame submission.
//!
//! One [`GpuState`] owns the storage buffer mirroring the CPU arena,
//! the uniform block, the canvas texture, and the kernel pipeline.
//! Headless and windowed simulations share everything up to the
//! render target; a window only adds a surface and a blit of the
//! canvas onto it.

use std::sync::mpsc;
use std::sync::Arc;

use bytemuck::Zeroable;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::config::SimulationConfig;
use crate::error::EngineError;
use crate::kernel::{self, KernelParams, KernelPipeline};
use crate::particle::Particle;

/// Fullscreen-triangle blit of the canvas onto a surface frame.
const BLIT_WGSL: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vi: u32) -> VertexOutput {
    // One triangle covering the whole surface
    let uv = vec2<f32>(f32((vi << 1u) & 2u), f32(vi & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@group(0) @binding(0) var canvas: texture_2d<f32>;
@group(0) @binding(1) var canvas_sampler: sampler;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(canvas, canvas_sampler, in.uv);
}
"#;

/// Where finished frames go.
pub(crate) enum RenderTarget {
    /// No window; frames stay in the canvas texture.
    Headless,
    /// Frames are blitted onto a window surface after the dispatch.
    Window {
        surface: wgpu::Surface<'static>,
        surface_config: wgpu::SurfaceConfiguration,
        blit_pipeline: wgpu::RenderPipeline,
        blit_bind_group: wgpu::BindGroup,
    },
}

pub(crate) struct GpuState {
    device: wgpu::Device,
    queue: wgpu::Queue,
    kernel: KernelPipeline,
    kernel_bind_group: wgpu::BindGroup,
    particle_buffer: wgpu::Buffer,
    params_buffer: wgpu::Buffer,
    canvas: wgpu::Texture,
    target: RenderTarget,
    records: usize,
}

impl GpuState {
    /// Acquires a device and builds every resource the simulation
    /// needs, uploading `seed_bytes` as the initial arena contents.
    pub(crate) fn new(
        config: &SimulationConfig,
        seed_bytes: &[u8],
        window: Option<Arc<Window>>,
    ) -> Result<Self, EngineError> {
        pollster::block_on(Self::new_async(config, seed_bytes, window))
    }

    async fn new_async(
        config: &SimulationConfig,
        seed_bytes: &[u8],
        window: Option<Arc<Window>>,
    ) -> Result<Self, EngineError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = match &window {
            Some(window) => Some(instance.create_surface(window.clone())?),
            None => None,
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface.as_ref(),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| EngineError::DeviceUnavailable("no compatible adapter".into()))?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        // The largest arenas outgrow the default storage binding ceiling.
        let arena_bytes = seed_bytes.len() as u64;
        let defaults = wgpu::Limits::default();
        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: defaults
                .max_storage_buffer_binding_size
                .max(arena_bytes as u32),
            max_buffer_size: defaults.max_buffer_size.max(arena_bytes),
            ..defaults
        };

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits,
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let particle_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Buffer"),
            contents: seed_bytes,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Params Buffer"),
            size: std::mem::size_of::<KernelParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let canvas = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Canvas Texture"),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let canvas_view = canvas.create_view(&wgpu::TextureViewDescriptor::default());

        let kernel = KernelPipeline::new(&device);
        let kernel_bind_group =
            kernel.bind_group(&device, &particle_buffer, &params_buffer, &canvas_view);

        let target = match (window, surface) {
            (Some(window), Some(surface)) => {
                let size = window.inner_size();
                let surface_caps = surface.get_capabilities(&adapter);
                // the canvas is linear; a non-srgb surface keeps the blit 1:1
                let surface_format = surface_caps
                    .formats
                    .iter()
                    .find(|f| !f.is_srgb())
                    .copied()
                    .unwrap_or(surface_caps.formats[0]);

                let surface_config = wgpu::SurfaceConfiguration {
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    format: surface_format,
                    width: size.width.max(1),
                    height: size.height.max(1),
                    present_mode: wgpu::PresentMode::AutoVsync,
                    alpha_mode: surface_caps.alpha_modes[0],
                    view_formats: vec![],
                    desired_maximum_frame_latency: 2,
                };
                surface.configure(&device, &surface_config);

                let (blit_pipeline, blit_bind_group) =
                    build_blit(&device, surface_format, &canvas_view);

                RenderTarget::Window {
                    surface,
                    surface_config,
                    blit_pipeline,
                    blit_bind_group,
                }
            }
            _ => RenderTarget::Headless,
        };

        Ok(Self {
            device,
            queue,
            kernel,
            kernel_bind_group,
            particle_buffer,
            params_buffer,
            canvas,
            target,
            records: seed_bytes.len() / std::mem::size_of::<Particle>(),
        })
    }

    /// Runs one frame: optional canvas wipe, the kernel dispatch, and
    /// for windowed targets the blit and present.
    ///
    /// A lost or outdated surface only costs the present; the dispatch
    /// is submitted regardless so simulation state keeps advancing.
    pub(crate) fn step(&mut self, params: KernelParams, clear: bool) -> Result<(), EngineError> {
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Step Encoder"),
            });

        // Canvas wipe; an empty pass whose load op does the work
        if clear {
            let canvas_view = self.canvas.create_view(&wgpu::TextureViewDescriptor::default());
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &canvas_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }

        // Compute pass
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Kernel Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(self.kernel.pipeline());
            compute_pass.set_bind_group(0, &self.kernel_bind_group, &[]);
            compute_pass.dispatch_workgroups(kernel::workgroups(self.records), 1, 1);
        }

        match &self.target {
            RenderTarget::Headless => {
                self.queue.submit(std::iter::once(encoder.finish()));
                Ok(())
            }
            RenderTarget::Window {
                surface,
                blit_pipeline,
                blit_bind_group,
                ..
            } => match surface.get_current_texture() {
                Ok(output) => {
                    let view = output
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());

                    // Blit pass
                    {
                        let mut blit_pass =
                            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                                label: Some("Blit Pass"),
                                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                    view: &view,
                                    resolve_target: None,
                                    ops: wgpu::Operations {
                                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                                        store: wgpu::StoreOp::Store,
                                    },
                                })],
                                depth_stencil_attachment: None,
                                timestamp_writes: None,
                                occlusion_query_set: None,
                            });
                        blit_pass.set_pipeline(blit_pipeline);
                        blit_pass.set_bind_group(0, blit_bind_group, &[]);
                        blit_pass.draw(0..3, 0..1);
                    }

                    self.queue.submit(std::iter::once(encoder.finish()));
                    output.present();
                    Ok(())
                }
                Err(e) => {
                    self.queue.submit(std::iter::once(encoder.finish()));
                    Err(e.into())
                }
            },
        }
    }

    /// Reconfigures the window surface. The canvas keeps its size;
    /// the blit stretches it over the new surface.
    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        if let RenderTarget::Window {
            surface,
            surface_config,
            ..
        } = &mut self.target
        {
            if width > 0 && height > 0 {
                surface_config.width = width;
                surface_config.height = height;
                surface.configure(&self.device, surface_config);
            }
        }
    }

    /// Copies the canvas back as tightly packed RGBA rows.
    pub(crate) fn read_canvas(&self) -> Result<Vec<u8>, EngineError> {
        let width = self.canvas.width();
        let height = self.canvas.height();
        let padded = padded_bytes_per_row(width);

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Canvas Staging Buffer"),
            size: padded as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.canvas,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let data = self.map_read(&staging)?;
        let row_bytes = (width * 4) as usize;
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * padded as usize;
            pixels.extend_from_slice(&data[start..start + row_bytes]);
        }
        Ok(pixels)
    }

    /// Copies the particle buffer back into an owned arena.
    pub(crate) fn read_particles(&self) -> Result<Vec<Particle>, EngineError> {
        let size = (self.records * std::mem::size_of::<Particle>()) as u64;
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Staging Buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(&self.particle_buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let data = self.map_read(&staging)?;
        if data.len() != size as usize {
            return Err(EngineError::Readback("particle copy came back short".into()));
        }

        // mapped bytes carry no alignment guarantee for Particle,
        // so copy into an owned, properly aligned vec
        let mut particles = vec![Particle::zeroed(); self.records];
        bytemuck::cast_slice_mut::<Particle, u8>(&mut particles).copy_from_slice(&data);
        Ok(particles)
    }

    /// Replaces the GPU arena contents. Ordered against in-flight
    /// dispatches by the queue, so no fence is needed.
    pub(crate) fn write_particles(&self, bytes: &[u8]) {
        self.queue.write_buffer(&self.particle_buffer, 0, bytes);
    }

    fn map_read(&self, buffer: &wgpu::Buffer) -> Result<Vec<u8>, EngineError> {
        let slice = buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| EngineError::Readback("map callback never ran".into()))?
            .map_err(|e| EngineError::Readback(format!("buffer mapping failed: {e}")))?;
        let data = slice.get_mapped_range().to_vec();
        buffer.unmap();
        Ok(data)
    }
}

impl Drop for GpuState {
    fn drop(&mut self) {
        // drain in-flight work referencing the buffers before they die
        let _ = self.device.poll(wgpu::Maintain::Wait);
    }
}

/// Rows in a texture-to-buffer copy must start on a 256-byte boundary.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (unpadded + align - 1) & !(align - 1)
}

fn build_blit(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    canvas_view: &wgpu::TextureView,
) -> (wgpu::RenderPipeline, wgpu::BindGroup) {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Blit Shader"),
        source: wgpu::ShaderSource::Wgsl(BLIT_WGSL.into()),
    });

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Blit Sampler"),
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Blit Bind Group Layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Blit Bind Group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(canvas_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Blit Pipeline Layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Blit Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    (pipeline, bind_group)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates WGSL code using naga.
    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn test_blit_wgsl_is_valid() {
        validate_wgsl(BLIT_WGSL).expect("blit WGSL should be valid");
    }

    #[test]
    fn test_padded_rows_hit_the_copy_alignment() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(100), 512);
        assert_eq!(padded_bytes_per_row(1024), 4096);
    }
}
