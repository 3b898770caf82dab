//! Scene setup: device class, camera rig, lighting, and the assembled
//! entities.

use glam::Vec3;
use orbi_config::{DeviceClassSetting, RenderConfig, VisualizationConfig};
use orbi_render::{Camera, Viewport, ViewportResizeEvent};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::color::hex_to_linear;
use crate::core_body::CoreBody;
use crate::ring::Ring;
use crate::shooting_star::ShootingStar;
use crate::starfield::Starfield;
use crate::stream::{StreamLane, generate_lanes};

pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;

/// Layout class, resolved at mount and again whenever the host width changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

impl DeviceClass {
    /// `Auto` compares the logical width against the breakpoint; narrower is mobile.
    pub fn resolve(setting: DeviceClassSetting, logical_width: u32, breakpoint: u32) -> Self {
        match setting {
            DeviceClassSetting::Desktop => Self::Desktop,
            DeviceClassSetting::Mobile => Self::Mobile,
            DeviceClassSetting::Auto if logical_width < breakpoint => Self::Mobile,
            DeviceClassSetting::Auto => Self::Desktop,
        }
    }

    /// Whether touch drags must be classified before they orbit.
    pub fn disambiguates_touch(self) -> bool {
        self == Self::Mobile
    }

    /// Initial camera placement as `(position, target, fov_degrees)`.
    pub fn camera_rig(self, offset: f32) -> (Vec3, Vec3, f32) {
        match self {
            Self::Desktop => (Vec3::new(0.0, 2.0, 10.0), Vec3::ZERO, 50.0),
            Self::Mobile => (
                Vec3::new(offset, 1.5, 8.0),
                Vec3::new(offset, 0.0, 0.0),
                60.0,
            ),
        }
    }
}

/// Scene lighting. Colors are linear RGB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRig {
    pub ambient: [f32; 3],
    pub sun_color: [f32; 3],
    pub sun_intensity: f32,
    pub sun_position: Vec3,
    pub hemisphere_sky: [f32; 3],
    pub hemisphere_ground: [f32; 3],
    pub hemisphere_intensity: f32,
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            ambient: hex_to_linear(0x333333),
            sun_color: [1.0; 3],
            sun_intensity: 1.0,
            sun_position: Vec3::new(5.0, 3.0, 5.0),
            hemisphere_sky: hex_to_linear(0x87a0ff),
            hemisphere_ground: hex_to_linear(0x201008),
            hemisphere_intensity: 0.35,
        }
    }
}

/// Camera, viewport and lights for one mount.
#[derive(Debug, Clone)]
pub struct SceneSetup {
    pub camera: Camera,
    pub viewport: Viewport,
    pub lights: LightRig,
    pub device_class: DeviceClass,
    pub offset: f32,
    device_setting: DeviceClassSetting,
    mobile_breakpoint: u32,
}

impl SceneSetup {
    /// Returns `None` for a zero-sized host.
    pub fn new(
        config: &VisualizationConfig,
        render: &RenderConfig,
        logical_width: u32,
        logical_height: u32,
        scale_factor: f64,
    ) -> Option<Self> {
        let viewport = Viewport::new(
            logical_width,
            logical_height,
            scale_factor,
            render.max_pixel_ratio,
        )?;
        let device_class =
            DeviceClass::resolve(config.device_class, logical_width, config.mobile_breakpoint);
        let camera = rig_camera(device_class, config.offset, viewport.aspect_ratio());

        Some(Self {
            camera,
            viewport,
            lights: LightRig::default(),
            device_class,
            offset: config.offset,
            device_setting: config.device_class,
            mobile_breakpoint: config.mobile_breakpoint,
        })
    }

    /// Track a host resize. Identical dimensions change nothing.
    ///
    /// Crossing the mobile breakpoint switches the device class and puts the
    /// camera back on that class's rig.
    pub fn resize(&mut self, logical_width: u32, logical_height: u32) -> Option<ViewportResizeEvent> {
        let event = self.viewport.handle_resize(logical_width, logical_height)?;
        let class = DeviceClass::resolve(
            self.device_setting,
            event.logical.width,
            self.mobile_breakpoint,
        );
        if class != self.device_class {
            tracing::info!(from = ?self.device_class, to = ?class, "device class changed");
            self.device_class = class;
            self.camera = rig_camera(class, self.offset, self.viewport.aspect_ratio());
        }
        self.apply(event);
        Some(event)
    }

    pub fn scale_factor_changed(&mut self, scale_factor: f64) -> Option<ViewportResizeEvent> {
        let event = self.viewport.handle_scale_factor_changed(scale_factor)?;
        self.apply(event);
        Some(event)
    }

    fn apply(&mut self, event: ViewportResizeEvent) {
        self.camera
            .set_aspect_ratio(event.logical.width as f32, event.logical.height as f32);
        tracing::debug!(
            width = event.logical.width,
            height = event.logical.height,
            buffer_width = event.drawing_buffer.width,
            buffer_height = event.drawing_buffer.height,
            aspect = self.camera.aspect_ratio,
            "viewport resized"
        );
    }
}

fn rig_camera(class: DeviceClass, offset: f32, aspect_ratio: f32) -> Camera {
    let (position, target, fov) = class.camera_rig(offset);
    let mut camera = Camera::looking_at(position, target, fov, aspect_ratio);
    camera.near = CAMERA_NEAR;
    camera.far = CAMERA_FAR;
    camera
}

/// Every CPU-side entity of the visualization.
#[derive(Debug, Clone)]
pub struct Scene {
    pub setup: SceneSetup,
    pub core: CoreBody,
    /// Outer/main first.
    pub rings: Vec<Ring>,
    pub starfield: Starfield,
    pub streams: Vec<StreamLane>,
    pub shooting_star: ShootingStar,
}

impl Scene {
    pub fn build<R: Rng>(
        config: &VisualizationConfig,
        setup: SceneSetup,
        rng: &mut R,
    ) -> Self {
        let offset = config.offset;
        let core = CoreBody::new(config.core_radius, offset, config.texture.is_some());
        let rings: Vec<Ring> = config
            .rings
            .iter()
            .map(|ring| Ring::generate(ring, offset, rng))
            .collect();
        let starfield = Starfield::generate(&config.starfield, offset, config.core_radius, rng);
        let streams = generate_lanes(&config.streams, offset, rng);
        let shooting_star =
            ShootingStar::new(&config.shooting_star, core.position, config.core_radius, rng);

        tracing::info!(
            device_class = ?setup.device_class,
            rings = rings.len(),
            ring_particles = rings.iter().map(|r| r.particles().len()).sum::<usize>(),
            stars = starfield.particles().len(),
            stream_lanes = streams.len(),
            "scene built"
        );

        Self {
            setup,
            core,
            rings,
            starfield,
            streams,
            shooting_star,
        }
    }
}

/// Seeded generator for reproducible scenes, otherwise seeded from the clock.
pub fn scene_rng(seed: Option<u64>) -> ChaCha8Rng {
    let seed = seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });
    tracing::debug!(seed, "scene rng seeded");
    ChaCha8Rng::seed_from_u64(seed)
}
