//! The compute kernel: WGSL source, its uniform block, and the
//! pipeline wrapper around it.
//!
//! One dispatch advances and rasterizes the whole arena. Each thread
//! owns one record and steps its four lanes in sequence, so a frame
//! costs `records / 256` workgroups and no synchronization.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

use crate::particle::ParticleColor;

/// WGSL source of the integration kernel.
pub const KERNEL_WGSL: &str = include_str!("kernel.wgsl");

/// Threads per workgroup; matches `@workgroup_size` in the kernel.
pub const WORKGROUP_SIZE: u32 = 256;

/// Distance floor for the force terms; matches `MIN_WELL_DISTANCE`
/// in the kernel.
pub const MIN_WELL_DISTANCE: f32 = 0.5;

/// Uniform block read by every kernel thread.
///
/// Field order and padding mirror the WGSL `Params` struct; the
/// trailing pad rounds the block to a 16-byte multiple as the uniform
/// address space requires.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct KernelParams {
    wells: [[f32; 4]; 4],
    color: [f32; 4],
    dims: [f32; 2],
    drag: f32,
    respawn: u32,
    frame: u32,
    record_count: u32,
    _pad: [u32; 2],
}

impl KernelParams {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        wells: [Vec4; 4],
        color: ParticleColor,
        width: u32,
        height: u32,
        drag: f32,
        respawn: bool,
        frame: u32,
        record_count: u32,
    ) -> Self {
        Self {
            wells: wells.map(|w| w.to_array()),
            color: [color.r, color.g, color.b, color.a],
            dims: [width as f32, height as f32],
            drag,
            respawn: respawn as u32,
            frame,
            record_count,
            _pad: [0; 2],
        }
    }
}

/// Compiled kernel plus the layout its bind group is built against.
pub(crate) struct KernelPipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl KernelPipeline {
    /// Compiles the kernel on `device`.
    ///
    /// The source is a compile-time constant, so a rejection here means
    /// the binary itself is bad; wgpu's validation panic is allowed to
    /// propagate.
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Kernel Shader"),
            source: wgpu::ShaderSource::Wgsl(KERNEL_WGSL.into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Kernel Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::StorageTexture {
                            access: wgpu::StorageTextureAccess::WriteOnly,
                            format: wgpu::TextureFormat::Rgba8Unorm,
                            view_dimension: wgpu::TextureViewDimension::D2,
                        },
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Kernel Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Kernel Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
        }
    }

    #[inline]
    pub(crate) fn pipeline(&self) -> &wgpu::ComputePipeline {
        &self.pipeline
    }

    pub(crate) fn bind_group(
        &self,
        device: &wgpu::Device,
        particle_buffer: &wgpu::Buffer,
        params_buffer: &wgpu::Buffer,
        canvas_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Kernel Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: particle_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(canvas_view),
                },
            ],
        })
    }
}

/// Workgroups needed to cover `records` threads.
pub(crate) fn workgroups(records: usize) -> u32 {
    (records as u32).div_ceil(WORKGROUP_SIZE)
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
    fn test_kernel_wgsl_is_valid() {
        validate_wgsl(KERNEL_WGSL).expect("kernel WGSL should be valid");
    }

    #[test]
    fn test_params_block_is_112_bytes() {
        assert_eq!(std::mem::size_of::<KernelParams>(), 112);
    }

    #[test]
    fn test_params_field_offsets_match_wgsl() {
        let params = KernelParams::new(
            [Vec4::ZERO; 4],
            ParticleColor::default(),
            640,
            480,
            0.97,
            true,
            7,
            1024,
        );
        let bytes = bytemuck::bytes_of(&params);
        let f32_at = |offset: usize| {
            f32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
        };
        let u32_at = |offset: usize| {
            u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
        };
        assert_eq!(f32_at(64), 1.0); // color.r
        assert_eq!(f32_at(80), 640.0); // dims.x
        assert_eq!(f32_at(84), 480.0); // dims.y
        assert_eq!(f32_at(88), 0.97); // drag
        assert_eq!(u32_at(92), 1); // respawn
        assert_eq!(u32_at(96), 7); // frame
        assert_eq!(u32_at(100), 1024); // record_count
    }

    #[test]
    fn test_workgroups_round_up() {
        assert_eq!(workgroups(1), 1);
        assert_eq!(workgroups(256), 1);
        assert_eq!(workgroups(257), 2);
        assert_eq!(workgroups(131_072), 512);
    }
}
