//! Instanced billboard renderer for every particle cloud.
//!
//! Each particle is drawn as a screen-aligned quad (six vertices generated
//! from `vertex_index`) sized in pixels by perspective attenuation. One
//! pipeline serves rings, streams and stars; a per-cloud uniform selects the
//! shading mode.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use orbi_render::{BufferAllocator, DepthBuffer, create_shader};

use crate::particle::Particle;
use crate::shading::PARTICLE_LIGHT_POSITION;

/// Pixel size of a unit-size particle at unit view depth (rings and streams).
pub const ATTENUATION_SCALE: f32 = 300.0;

/// Negative attenuation scale: use half the drawing-buffer height instead.
const VIEWPORT_ATTENUATION: f32 = -1.0;

/// Smallest on-screen star, in pixels.
pub const MIN_STAR_PIXELS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingMode {
    /// Lambert with core shadow, brightness boost and depth fog.
    Ring,
    /// Soft Lambert, never fully dark.
    Stream,
    /// Flat color.
    Flat,
}

impl ShadingMode {
    fn as_f32(self) -> f32 {
        match self {
            Self::Ring => 0.0,
            Self::Stream => 1.0,
            Self::Flat => 2.0,
        }
    }
}

/// Per-cloud uniform at group 1.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PointsUniform {
    pub model: [[f32; 4]; 4],
    /// Linear RGB, then a global opacity multiplier.
    pub color: [f32; 4],
    /// Light position, then the shading mode.
    pub light: [f32; 4],
    /// Attenuation scale, minimum pixel size, unused, unused.
    pub params: [f32; 4],
}

impl PointsUniform {
    pub fn new(model: Mat4, color: [f32; 3], mode: ShadingMode) -> Self {
        let (scale, min_px) = match mode {
            ShadingMode::Flat => (VIEWPORT_ATTENUATION, MIN_STAR_PIXELS),
            ShadingMode::Ring | ShadingMode::Stream => (ATTENUATION_SCALE, 0.0),
        };
        Self {
            model: model.to_cols_array_2d(),
            color: [color[0], color[1], color[2], 1.0],
            light: PARTICLE_LIGHT_POSITION.extend(mode.as_f32()).to_array(),
            params: [scale, min_px, 0.0, 0.0],
        }
    }
}

pub const POINTS_SHADER_SOURCE: &str = r#"
struct Camera {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    viewport: vec4<f32>,
};

struct Points {
    model: mat4x4<f32>,
    color: vec4<f32>,
    light: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(1) @binding(0) var<uniform> points: Points;

struct ParticleInput {
    @location(0) position: vec3<f32>,
    @location(1) opacity: f32,
    @location(2) size: f32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local: vec3<f32>,
    @location(1) opacity: f32,
    @location(2) view_depth: f32,
};

fn quad_corner(index: u32) -> vec2<f32> {
    switch index {
        case 0u: { return vec2<f32>(-1.0, -1.0); }
        case 1u: { return vec2<f32>(1.0, -1.0); }
        case 2u, 4u: { return vec2<f32>(1.0, 1.0); }
        case 3u: { return vec2<f32>(-1.0, -1.0); }
        default: { return vec2<f32>(-1.0, 1.0); }
    }
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, particle: ParticleInput) -> VertexOutput {
    let corner = quad_corner(vertex_index);
    let view_pos = camera.view * points.model * vec4<f32>(particle.position, 1.0);
    let depth = max(-view_pos.z, 0.0001);

    var scale = points.params.x;
    if scale < 0.0 {
        scale = camera.viewport.y * 0.5;
    }
    let size_px = max(particle.size * scale / depth, points.params.y);

    let clip = camera.proj * view_pos;
    let extent = corner * size_px / camera.viewport.xy * clip.w;

    var out: VertexOutput;
    out.clip_position = vec4<f32>(clip.xy + extent, clip.zw);
    out.local = particle.position;
    out.opacity = particle.opacity * points.color.a;
    out.view_depth = depth;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let light = points.light.xyz;
    let mode = points.light.w;
    var rgb = points.color.rgb;

    if mode < 0.5 {
        let light_dir = normalize(light - in.local);
        var intensity = max(0.5, dot(normalize(in.local), light_dir));
        if length(in.local) > 1.0 && dot(normalize(-in.local), normalize(light)) > 0.8 {
            intensity = intensity * 0.75;
        }
        let fog = clamp(1.0 - in.view_depth / 25.0, 0.65, 1.0);
        rgb = rgb * intensity * 1.35 * fog;
    } else if mode < 1.5 {
        let light_dir = normalize(light - in.local);
        rgb = rgb * (0.6 + 0.4 * dot(normalize(in.local), light_dir));
    }

    return vec4<f32>(rgb, in.opacity);
}
"#;

/// One particle cloud: instance buffer plus its uniform.
pub struct PointCloud {
    instances: wgpu::Buffer,
    count: u32,
    uniform: PointsUniform,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl PointCloud {
    /// Move the whole cloud.
    pub fn set_model(&mut self, queue: &wgpu::Queue, model: Mat4) {
        self.uniform.model = model.to_cols_array_2d();
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniform));
    }

    /// Rewrite particle data. Extra particles beyond the initial count are ignored.
    pub fn write_particles(&self, queue: &wgpu::Queue, particles: &[Particle]) {
        let n = particles.len().min(self.count as usize);
        queue.write_buffer(&self.instances, 0, bytemuck::cast_slice(&particles[..n]));
    }

    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn destroy(&self) {
        self.instances.destroy();
        self.uniform_buffer.destroy();
    }
}

/// Shared pipeline for all particle clouds.
pub struct PointsRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
}

impl PointsRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let shader = create_shader(device, "points-shader", POINTS_SHADER_SOURCE);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("points-uniform-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<PointsUniform>() as u64),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("points-pipeline-layout"),
            bind_group_layouts: &[camera_layout, &uniform_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("points-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Particle::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(DepthBuffer::translucent_state()),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        log::info!("Particle renderer initialized");
        Self {
            pipeline,
            uniform_layout,
        }
    }

    /// Upload a cloud. Returns `None` for an empty particle list.
    pub fn create_cloud(
        &self,
        device: &wgpu::Device,
        label: &str,
        particles: &[Particle],
        uniform: PointsUniform,
    ) -> Option<PointCloud> {
        if particles.is_empty() {
            return None;
        }
        let alloc = BufferAllocator::new(device);
        let instances =
            alloc.create_vertex_buffer(&format!("{label}-particles"), bytemuck::cast_slice(particles));
        let uniform_buffer = alloc.create_uniform_buffer(&format!("{label}-uniform"), &uniform);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-bg")),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        Some(PointCloud {
            instances,
            count: particles.len() as u32,
            uniform,
            uniform_buffer,
            bind_group,
        })
    }

    /// Draw clouds. The camera bind group must already be set.
    pub fn render<'a>(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        clouds: impl IntoIterator<Item = &'a PointCloud>,
    ) {
        pass.set_pipeline(&self.pipeline);
        for cloud in clouds {
            pass.set_bind_group(1, &cloud.bind_group, &[]);
            pass.set_vertex_buffer(0, cloud.instances.slice(..));
            pass.draw(0..6, 0..cloud.count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::create_test_device;
    use orbi_render::{Camera, CameraBinding};

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<PointsUniform>(), 112);
        assert_eq!(std::mem::size_of::<PointsUniform>() % 16, 0);
    }

    #[test]
    fn test_star_uniform_uses_viewport_attenuation() {
        let u = PointsUniform::new(Mat4::IDENTITY, [0.1; 3], ShadingMode::Flat);
        assert!(u.params[0] < 0.0);
        assert_eq!(u.params[1], MIN_STAR_PIXELS);
        assert_eq!(u.light[3], 2.0);
    }

    #[test]
    fn test_ring_uniform_carries_light() {
        let u = PointsUniform::new(Mat4::IDENTITY, [1.0, 0.3, 0.0], ShadingMode::Ring);
        assert_eq!(&u.light[..3], &PARTICLE_LIGHT_POSITION.to_array());
        assert_eq!(u.light[3], 0.0);
        assert_eq!(u.params[0], ATTENUATION_SCALE);
    }

    #[test]
    fn test_pipeline_and_cloud_creation() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let camera = CameraBinding::new(&device, &Camera::default().to_uniform(800, 600, 1.0));
        let renderer = PointsRenderer::new(&device, wgpu::TextureFormat::Bgra8UnormSrgb, &camera.layout);

        let uniform = PointsUniform::new(Mat4::IDENTITY, [1.0; 3], ShadingMode::Stream);
        assert!(renderer.create_cloud(&device, "empty", &[], uniform).is_none());

        let particles = [Particle::default(); 4];
        let cloud = renderer.create_cloud(&device, "four", &particles, uniform).unwrap();
        assert_eq!(cloud.len(), 4);
        cloud.destroy();
    }
}
