//! GPU side of the visualization: uploads scene state each frame and records
//! draw calls.

use glam::Mat4;
use orbi_render::{CameraBinding, TextureError};

use crate::color::hex_to_linear;
use crate::driver::FrameUpdate;
use crate::render::{
    CoreRenderer, PointCloud, PointsRenderer, PointsUniform, ShadingMode, TrailRenderer,
};
use crate::scene::Scene;
use crate::starfield::STAR_COLOR;
use crate::stream::STREAM_COLOR;

pub struct Visualization {
    camera: CameraBinding,
    points: PointsRenderer,
    /// Parallel to `Scene::rings`; `None` for rings without particles.
    rings: Vec<Option<PointCloud>>,
    starfield: Option<PointCloud>,
    /// Parallel to `Scene::streams`.
    streams: Vec<Option<PointCloud>>,
    core: CoreRenderer,
    trail: TrailRenderer,
    disposed: bool,
}

impl Visualization {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        scene: &Scene,
    ) -> Result<Self, TextureError> {
        let camera = CameraBinding::new(device, &camera_uniform(scene));
        let points = PointsRenderer::new(device, surface_format, &camera.layout);

        let rings = scene
            .rings
            .iter()
            .enumerate()
            .map(|(i, ring)| {
                points.create_cloud(
                    device,
                    &format!("ring-{}", i + 1),
                    ring.particles(),
                    PointsUniform::new(ring.model_matrix(), ring.color(), ShadingMode::Ring),
                )
            })
            .collect();

        let starfield = points.create_cloud(
            device,
            "starfield",
            scene.starfield.particles(),
            PointsUniform::new(Mat4::IDENTITY, hex_to_linear(STAR_COLOR), ShadingMode::Flat),
        );

        let stream_uniform = PointsUniform::new(Mat4::IDENTITY, hex_to_linear(STREAM_COLOR), ShadingMode::Stream);
        let streams = scene
            .streams
            .iter()
            .enumerate()
            .map(|(i, lane)| {
                points.create_cloud(device, &format!("stream-{i}"), lane.particles(), stream_uniform)
            })
            .collect();

        let core = CoreRenderer::new(
            device,
            queue,
            surface_format,
            &camera.layout,
            &scene.core,
            &scene.setup.lights,
        )?;
        let trail = TrailRenderer::new(device, surface_format, &camera.layout);

        log::info!("Visualization GPU resources created");
        Ok(Self {
            camera,
            points,
            rings,
            starfield,
            streams,
            core,
            trail,
            disposed: false,
        })
    }

    /// Upload this frame's state. A texture that fails to upload is reported
    /// after everything else has been written.
    pub fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        frame: &FrameUpdate,
    ) -> Result<(), TextureError> {
        if self.disposed {
            return Ok(());
        }

        let upload = match &frame.texture {
            Some(image) => self.core.set_color_map(device, queue, image),
            None => Ok(()),
        };

        self.camera.update(queue, &camera_uniform(scene));
        self.core.update(queue, &scene.core, &scene.setup.lights);

        for (ring, cloud) in scene.rings.iter().zip(&mut self.rings) {
            if let Some(cloud) = cloud {
                cloud.set_model(queue, ring.model_matrix());
            }
        }
        for (lane, cloud) in scene.streams.iter().zip(&self.streams) {
            if let Some(cloud) = cloud {
                cloud.write_particles(queue, lane.particles());
            }
        }

        let star = &scene.shooting_star;
        self.trail.update(queue, star.trail(), star.opacity());

        upload
    }

    /// Record draws: the opaque core first, then blended particles and the trail.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.disposed {
            return;
        }
        self.camera.bind(pass);
        self.core.render(pass);

        let clouds = self
            .starfield
            .iter()
            .chain(self.rings.iter().flatten())
            .chain(self.streams.iter().flatten());
        self.points.render(pass, clouds);

        self.trail.render(pass);
    }

    /// Release every buffer and texture. Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for cloud in self
            .rings
            .iter()
            .chain(std::iter::once(&self.starfield))
            .chain(self.streams.iter())
            .flatten()
        {
            cloud.destroy();
        }
        self.core.destroy();
        self.trail.destroy();
        self.camera.destroy();
        log::info!("Visualization GPU resources released");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

fn camera_uniform(scene: &Scene) -> orbi_render::CameraUniform {
    let viewport = &scene.setup.viewport;
    let buffer = viewport.drawing_buffer_size();
    scene
        .setup
        .camera
        .to_uniform(buffer.width, buffer.height, viewport.pixel_ratio() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::create_test_device;
    use crate::scene::{SceneSetup, scene_rng};
    use orbi_config::{RenderConfig, VisualizationConfig};

    fn small_scene() -> Scene {
        let mut config = VisualizationConfig::default();
        for ring in &mut config.rings {
            ring.count = 64;
        }
        config.starfield.count = 32;
        config.streams.enabled = true;
        let setup = SceneSetup::new(&config, &RenderConfig::default(), 800, 600, 1.0).unwrap();
        Scene::build(&config, setup, &mut scene_rng(Some(4)))
    }

    #[test]
    fn test_camera_uniform_tracks_drawing_buffer() {
        let scene = small_scene();
        let u = camera_uniform(&scene);
        assert_eq!(u.viewport[..3], [800.0, 600.0, 1.0]);
    }

    #[test]
    fn test_build_update_dispose() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let scene = small_scene();
        let mut viz = Visualization::new(&device, &queue, wgpu::TextureFormat::Bgra8UnormSrgb, &scene).unwrap();
        assert_eq!(viz.rings.len(), 3);
        assert_eq!(viz.streams.len(), 5);

        viz.update(&device, &queue, &scene, &FrameUpdate::default()).unwrap();
        viz.dispose();
        assert!(viz.is_disposed());
        viz.dispose();
        viz.update(&device, &queue, &scene, &FrameUpdate::default()).unwrap();
    }
}
