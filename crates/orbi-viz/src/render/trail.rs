//! Shooting-star trail: an additive line strip rewritten every frame.

use glam::Vec3;
use orbi_render::{ADDITIVE_BLEND, BufferAllocator, DepthBuffer, VertexPositionColor, create_shader};

use crate::shooting_star::{TRAIL_POINTS, trail_intensities};

pub const TRAIL_SHADER_SOURCE: &str = r#"
struct Camera {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    viewport: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_proj * vec4<f32>(in.position, 1.0);
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// Trail vertices, head first. Alpha is the point intensity times the envelope opacity.
pub fn trail_vertices(points: &[Vec3; TRAIL_POINTS], opacity: f32) -> [VertexPositionColor; TRAIL_POINTS] {
    let intensities = trail_intensities();
    std::array::from_fn(|i| VertexPositionColor {
        position: points[i].to_array(),
        color: [1.0, 1.0, 1.0, intensities[i] * opacity],
    })
}

pub struct TrailRenderer {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    visible: bool,
}

impl TrailRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let shader = create_shader(device, "trail-shader", TRAIL_SHADER_SOURCE);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("trail-pipeline-layout"),
            bind_group_layouts: &[camera_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("trail-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[VertexPositionColor::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineStrip,
                ..Default::default()
            },
            depth_stencil: Some(DepthBuffer::translucent_state()),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(ADDITIVE_BLEND),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let vertices = [VertexPositionColor::default(); TRAIL_POINTS];
        let vertex_buffer =
            BufferAllocator::new(device).create_vertex_buffer("trail-vertices", bytemuck::cast_slice(&vertices));

        log::info!("Shooting star trail renderer initialized");
        Self {
            pipeline,
            vertex_buffer,
            visible: false,
        }
    }

    /// Rewrite the strip. Invisible trails are skipped at draw time.
    pub fn update(&mut self, queue: &wgpu::Queue, points: &[Vec3; TRAIL_POINTS], opacity: f32) {
        self.visible = opacity > 0.0;
        if self.visible {
            let vertices = trail_vertices(points, opacity);
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        if !self.visible {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..TRAIL_POINTS as u32, 0..1);
    }

    pub fn destroy(&self) {
        self.vertex_buffer.destroy();
    }
}
