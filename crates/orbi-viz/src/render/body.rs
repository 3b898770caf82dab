//! Lit, textured sphere for the core body.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use orbi_render::{
    BufferAllocator, DepthBuffer, GpuTexture, IndexData, MeshBuffer, TextureBinder, TextureError,
    VertexPositionNormalUv, create_shader,
};

use crate::core_body::{CoreBody, SPHERE_SEGMENTS, sphere_mesh};
use crate::scene::LightRig;
use crate::texture_loader::DecodedImage;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CoreUniform {
    pub model: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    /// Emissive RGB, then intensity.
    pub emissive: [f32; 4],
    /// Roughness, metalness, unused, unused.
    pub surface: [f32; 4],
    pub ambient: [f32; 4],
    /// Sun RGB, then intensity.
    pub sun_color: [f32; 4],
    pub sun_position: [f32; 4],
    /// Sky RGB, then hemisphere intensity.
    pub hemisphere_sky: [f32; 4],
    pub hemisphere_ground: [f32; 4],
}

impl CoreUniform {
    pub fn new(core: &CoreBody, lights: &LightRig) -> Self {
        let m = &core.material;
        let rgb = |c: [f32; 3], w: f32| [c[0], c[1], c[2], w];
        Self {
            model: Mat4::from_translation(core.position).to_cols_array_2d(),
            base_color: rgb(m.base_color, 1.0),
            emissive: rgb(m.emissive, m.emissive_intensity),
            surface: [m.roughness, m.metalness, 0.0, 0.0],
            ambient: rgb(lights.ambient, 1.0),
            sun_color: rgb(lights.sun_color, lights.sun_intensity),
            sun_position: lights.sun_position.extend(0.0).to_array(),
            hemisphere_sky: rgb(lights.hemisphere_sky, lights.hemisphere_intensity),
            hemisphere_ground: rgb(lights.hemisphere_ground, 0.0),
        }
    }
}

pub const CORE_SHADER_SOURCE: &str = r#"
struct Camera {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    viewport: vec4<f32>,
};

struct Core {
    model: mat4x4<f32>,
    base_color: vec4<f32>,
    emissive: vec4<f32>,
    surface: vec4<f32>,
    ambient: vec4<f32>,
    sun_color: vec4<f32>,
    sun_position: vec4<f32>,
    hemisphere_sky: vec4<f32>,
    hemisphere_ground: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(1) @binding(0) var color_map: texture_2d<f32>;
@group(1) @binding(1) var color_sampler: sampler;
@group(2) @binding(0) var<uniform> core: Core;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = core.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = in.normal;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let albedo = textureSample(color_map, color_sampler, in.uv).rgb * core.base_color.rgb;
    let roughness = core.surface.x;
    let metalness = core.surface.y;

    let sun_dir = normalize(core.sun_position.xyz);
    let sun = core.sun_color.rgb * core.sun_color.w;
    let diffuse = sun * max(dot(n, sun_dir), 0.0);

    let hemi_t = n.y * 0.5 + 0.5;
    let hemi = mix(core.hemisphere_ground.rgb, core.hemisphere_sky.rgb, hemi_t) * core.hemisphere_sky.w;

    let view_dir = normalize(camera.camera_pos.xyz - in.world_pos);
    let half_dir = normalize(sun_dir + view_dir);
    let shininess = max(2.0 / max(roughness * roughness * roughness * roughness, 0.0001) - 2.0, 1.0);
    let f0 = mix(vec3<f32>(0.04), albedo, metalness);
    let specular = f0 * pow(max(dot(n, half_dir), 0.0), shininess) * sun;

    let lit = albedo * (1.0 - metalness) * (diffuse + hemi + core.ambient.rgb);
    let emitted = core.emissive.rgb * core.emissive.w;
    return vec4<f32>(lit + specular + emitted, 1.0);
}
"#;

pub struct CoreRenderer {
    pipeline: wgpu::RenderPipeline,
    mesh: MeshBuffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    binder: TextureBinder,
    placeholder: GpuTexture,
    color_map: Option<GpuTexture>,
}

impl CoreRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        core: &CoreBody,
        lights: &LightRig,
    ) -> Result<Self, TextureError> {
        let shader = create_shader(device, "core-shader", CORE_SHADER_SOURCE);
        let binder = TextureBinder::new(device);
        let placeholder = binder.create_placeholder(device, queue)?;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("core-uniform-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<CoreUniform>() as u64),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("core-pipeline-layout"),
            bind_group_layouts: &[camera_layout, binder.layout(), &uniform_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("core-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[VertexPositionNormalUv::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(DepthBuffer::opaque_state()),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let (vertices, indices) = sphere_mesh(core.radius, SPHERE_SEGMENTS);
        let alloc = BufferAllocator::new(device);
        let mesh = alloc.create_mesh("core-sphere", bytemuck::cast_slice(&vertices), IndexData::U16(&indices));
        let uniform_buffer = alloc.create_uniform_buffer("core-uniform", &CoreUniform::new(core, lights));
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("core-uniform-bg"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        log::info!("Core renderer initialized ({} triangles)", indices.len() / 3);
        Ok(Self {
            pipeline,
            mesh,
            uniform_buffer,
            uniform_bind_group,
            binder,
            placeholder,
            color_map: None,
        })
    }

    /// Refresh material and lighting.
    pub fn update(&self, queue: &wgpu::Queue, core: &CoreBody, lights: &LightRig) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&CoreUniform::new(core, lights)),
        );
    }

    /// Upload a decoded image and bind it in place of the placeholder.
    pub fn set_color_map(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &DecodedImage,
    ) -> Result<(), TextureError> {
        let texture =
            self.binder
                .create_rgba8(device, queue, "core-color-map", &image.rgba, image.width, image.height)?;
        if let Some(old) = self.color_map.replace(texture) {
            old.destroy();
        }
        Ok(())
    }

    pub fn has_color_map(&self) -> bool {
        self.color_map.is_some()
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        let texture = self.color_map.as_ref().unwrap_or(&self.placeholder);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(1, &texture.bind_group, &[]);
        pass.set_bind_group(2, &self.uniform_bind_group, &[]);
        self.mesh.bind(pass);
        self.mesh.draw(pass);
    }

    pub fn destroy(&self) {
        self.mesh.destroy();
        self.uniform_buffer.destroy();
        self.placeholder.destroy();
        if let Some(map) = &self.color_map {
            map.destroy();
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
        assert_eq!(std::mem::size_of::<CoreUniform>(), 64 + 8 * 16);
    }

    #[test]
    fn test_uniform_places_core_at_offset() {
        let core = CoreBody::new(1.3, 3.5, false);
        let u = CoreUniform::new(&core, &LightRig::default());
        assert_eq!(u.model[3][0], 3.5);
        assert_eq!(u.emissive[3], 0.2);
        assert_eq!(u.surface[..2], [0.7, 0.3]);
    }

    #[test]
    fn test_color_map_replaces_placeholder() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let camera = CameraBinding::new(&device, &Camera::default().to_uniform(800, 600, 1.0));
        let core = CoreBody::new(1.3, 3.5, true);
        let mut renderer = CoreRenderer::new(
            &device,
            &queue,
            wgpu::TextureFormat::Bgra8UnormSrgb,
            &camera.layout,
            &core,
            &LightRig::default(),
        )
        .unwrap();
        assert!(!renderer.has_color_map());

        let image = DecodedImage {
            width: 2,
            height: 2,
            rgba: vec![128; 16],
        };
        renderer.set_color_map(&device, &queue, &image).unwrap();
        assert!(renderer.has_color_map());

        let bad = DecodedImage {
            width: 2,
            height: 2,
            rgba: vec![0; 3],
        };
        assert!(renderer.set_color_map(&device, &queue, &bad).is_err());
        assert!(renderer.has_color_map());
        renderer.destroy();
    }
}
