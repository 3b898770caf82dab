//! Per-frame animation driver.
//!
//! Owns every piece of mutable scene state and advances it once per display
//! refresh. Input callbacks and the frame tick run on the same event loop,
//! so nothing here is shared across threads.

use glam::Vec2;
use orbi_config::{Config, InputConfig};
use orbi_input::{OrbitController, PointerState, TouchGestures, TouchOutcome};
use orbi_render::ViewportResizeEvent;
use rand_chacha::ChaCha8Rng;
use winit::event::{ElementState, MouseButton, TouchPhase};

use crate::scene::{Scene, SceneSetup, scene_rng};
use crate::shooting_star::StarEvent;
use crate::texture_loader::{DecodedImage, TextureLoader, TextureSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    Cancelled,
}

/// What changed during one tick.
#[derive(Debug, Default)]
pub struct FrameUpdate {
    pub dt: f32,
    pub elapsed: f32,
    pub star_event: Option<StarEvent>,
    /// Freshly loaded core texture waiting for upload.
    pub texture: Option<DecodedImage>,
    pub camera_moved: bool,
}

pub struct AnimationDriver {
    scene: Scene,
    orbit: OrbitController,
    pointer: PointerState,
    touch: TouchGestures,
    texture_loader: Option<TextureLoader>,
    input: InputConfig,
    rng: ChaCha8Rng,
    elapsed: f32,
    state: DriverState,
}

impl AnimationDriver {
    /// Build the scene and start the texture load, if one is configured.
    pub fn new(config: &Config, setup: SceneSetup) -> Self {
        let viz = &config.visualization;
        let mut rng = scene_rng(viz.seed);
        let scene = Scene::build(viz, setup, &mut rng);
        let texture_loader = viz
            .texture
            .as_deref()
            .map(|source| TextureLoader::spawn(TextureSource::parse(source)));
        Self::from_parts(scene, &config.input, texture_loader, rng)
    }

    /// Assemble from prebuilt state.
    pub fn from_parts(
        scene: Scene,
        input: &InputConfig,
        texture_loader: Option<TextureLoader>,
        rng: ChaCha8Rng,
    ) -> Self {
        let (orbit, touch) = controls_for(&scene.setup, input);
        Self {
            scene,
            orbit,
            pointer: PointerState::new(),
            touch,
            texture_loader,
            input: input.clone(),
            rng,
            elapsed: 0.0,
            state: DriverState::Running,
        }
    }

    /// Advance everything by `dt` seconds. `None` once cancelled.
    pub fn tick(&mut self, dt: f32) -> Option<FrameUpdate> {
        if self.state == DriverState::Cancelled {
            return None;
        }
        let dt = dt.max(0.0);
        self.elapsed += dt;

        let texture = self.poll_texture();

        for ring in &mut self.scene.rings {
            ring.advance(dt, self.elapsed);
        }

        for lane in &mut self.scene.streams {
            lane.step(dt);
        }

        let star_event = self.scene.shooting_star.update(dt, &mut self.rng);
        match star_event {
            Some(StarEvent::Activated) => tracing::debug!(
                start = ?self.scene.shooting_star.start(),
                lifetime = self.scene.shooting_star.lifetime(),
                "shooting star launched"
            ),
            Some(StarEvent::Deactivated) => tracing::trace!("shooting star finished"),
            None => {}
        }

        let drag = self.pointer.drag_delta();
        if drag != Vec2::ZERO {
            self.rotate(drag);
        }
        self.pointer.clear_transients();
        // An idle orbit leaves the camera exactly where it is.
        let camera_moved = self.orbit.is_moving();
        if camera_moved {
            let position = self.orbit.update(dt);
            let camera = &mut self.scene.setup.camera;
            camera.position = position;
            camera.target = self.orbit.target();
        }

        Some(FrameUpdate {
            dt,
            elapsed: self.elapsed,
            star_event,
            texture,
            camera_moved,
        })
    }

    fn poll_texture(&mut self) -> Option<DecodedImage> {
        let result = self.texture_loader.as_mut()?.poll()?;
        self.texture_loader = None;
        self.scene.core.resolve_texture(result)
    }

    /// The loaded texture could not be uploaded; fall back to the placeholder.
    pub fn reject_texture(&mut self, reason: &dyn std::fmt::Display) {
        self.scene.core.fail_texture(reason);
    }

    fn rotate(&mut self, delta: Vec2) {
        let height = self.scene.setup.viewport.logical_size().height as f32;
        self.orbit.rotate_by_pixels(delta, height);
    }

    /// Stop immediately. Every later tick returns `None` and input is ignored.
    pub fn cancel(&mut self) {
        if self.state == DriverState::Running {
            tracing::info!(elapsed = self.elapsed, "animation driver cancelled");
        }
        self.state = DriverState::Cancelled;
        self.texture_loader = None;
        self.touch.reset();
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    // ── Host events ─────────────────────────────────────────────────

    pub fn resize(&mut self, logical_width: u32, logical_height: u32) -> Option<ViewportResizeEvent> {
        if !self.is_running() {
            return None;
        }
        let class = self.scene.setup.device_class;
        let event = self.scene.setup.resize(logical_width, logical_height)?;
        if self.scene.setup.device_class != class {
            let (orbit, touch) = controls_for(&self.scene.setup, &self.input);
            self.orbit = orbit;
            self.touch = touch;
        }
        Some(event)
    }

    pub fn scale_factor_changed(&mut self, scale_factor: f64) -> Option<ViewportResizeEvent> {
        if !self.is_running() {
            return None;
        }
        self.scene.setup.scale_factor_changed(scale_factor)
    }

    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        if self.is_running() {
            self.pointer.on_cursor_moved(x, y);
        }
    }

    pub fn on_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if self.is_running() {
            self.pointer.on_button(button, state);
        }
    }

    pub fn on_cursor_left(&mut self) {
        self.pointer.on_cursor_left();
    }

    pub fn on_focus_lost(&mut self) {
        self.pointer.on_focus_lost();
        self.touch.reset();
    }

    /// Feed a touch event in logical pixels. Horizontal drags orbit; on mobile,
    /// vertical drags are released to the host.
    pub fn on_touch(&mut self, phase: TouchPhase, id: u64, x: f64, y: f64) -> TouchOutcome {
        if !self.is_running() {
            return TouchOutcome::Released;
        }
        let outcome = self.touch.on_touch(phase, id, x, y);
        if let TouchOutcome::Orbit(delta) = outcome {
            self.rotate(delta);
        }
        outcome
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_capturing_touch(&self) -> bool {
        self.touch.is_capturing()
    }
}

/// Orbit and touch handling matching the setup's camera rig and device class.
fn controls_for(setup: &SceneSetup, input: &InputConfig) -> (OrbitController, TouchGestures) {
    let camera = &setup.camera;
    let orbit = OrbitController::new(
        camera.position,
        camera.target,
        input.rotate_speed,
        input.damping_factor,
    );
    let touch = TouchGestures::new(
        input.touch_direction_threshold,
        setup.device_class.disambiguates_touch(),
    );
    (orbit, touch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_body::TextureState;
    use crate::scene::DeviceClass;
    use glam::Vec3;
    use crate::texture_loader::TextureLoadError;
    use crate::texture_loader::tests::png_bytes;
    use orbi_config::DeviceClassSetting;
    use rand::SeedableRng;

    fn config() -> Config {
        let mut config = Config::default();
        config.visualization.seed = Some(42);
        config
    }

    fn driver_at(config: &Config, width: u32, height: u32) -> AnimationDriver {
        let setup = SceneSetup::new(&config.visualization, &config.render, width, height, 1.0)
            .expect("non-zero host");
        AnimationDriver::new(config, setup)
    }

    fn driver_with_loader(loader: TextureLoader) -> AnimationDriver {
        let config = config();
        let setup =
            SceneSetup::new(&config.visualization, &config.render, 800, 600, 1.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut viz = config.visualization.clone();
        viz.texture = Some("planet.png".into());
        let scene = Scene::build(&viz, setup, &mut rng);
        AnimationDriver::from_parts(scene, &config.input, Some(loader), rng)
    }

    #[test]
    fn test_end_to_end_mount_tick_resize() {
        let config = config();
        let mut driver = driver_at(&config, 800, 600);

        let scene = driver.scene();
        assert_eq!(scene.core.position.x, 3.5);
        assert_eq!(scene.core.radius, 1.3);
        assert!((scene.setup.camera.aspect_ratio - 800.0 / 600.0).abs() < 1e-4);

        let before = scene.rings[0].spin();
        let update = driver.tick(0.016).expect("running driver ticks");
        assert_eq!(update.dt, 0.016);
        let delta = driver.scene().rings[0].spin() - before;
        assert!(delta > 0.0 && delta < 0.01, "ring 1 spin delta {delta}");

        let event = driver.resize(400, 600).expect("dimensions changed");
        assert!((driver.scene().setup.camera.aspect_ratio - 400.0 / 600.0).abs() < 1e-4);
        assert_eq!((event.drawing_buffer.width, event.drawing_buffer.height), (400, 600));
        assert_eq!(event.pixel_ratio, 1.0);
    }

    #[test]
    fn test_repeated_resize_is_noop() {
        let mut driver = driver_at(&config(), 800, 600);
        assert!(driver.resize(1024, 600).is_some());
        let aspect = driver.scene().setup.camera.aspect_ratio;
        assert!(driver.resize(1024, 600).is_none());
        assert_eq!(driver.scene().setup.camera.aspect_ratio, aspect);
    }

    #[test]
    fn test_cancel_stops_ticks_and_input() {
        let mut driver = driver_at(&config(), 800, 600);
        driver.tick(0.016);
        driver.cancel();
        assert_eq!(driver.state(), DriverState::Cancelled);
        let spin = driver.scene().rings[0].spin();
        for _ in 0..10 {
            assert!(driver.tick(0.016).is_none());
        }
        assert_eq!(driver.scene().rings[0].spin(), spin);
        assert!(driver.resize(100, 100).is_none());
    }

    #[test]
    fn test_mouse_drag_orbits_camera() {
        let mut driver = driver_at(&config(), 800, 600);
        let start = driver.scene().setup.camera.position;
        driver.on_cursor_moved(100.0, 100.0);
        driver.on_mouse_button(MouseButton::Left, ElementState::Pressed);
        driver.on_cursor_moved(160.0, 100.0);
        let update = driver.tick(0.016).unwrap();
        assert!(update.camera_moved);
        let moved = driver.scene().setup.camera.position;
        assert!(moved.distance(start) > 1e-4);
        let r0 = start.distance(driver.orbit().target());
        let r1 = moved.distance(driver.orbit().target());
        assert!((r0 - r1).abs() < 1e-4, "orbit changed distance {r0} -> {r1}");
    }

    #[test]
    fn test_mobile_vertical_swipe_does_not_orbit() {
        let mut config = config();
        config.visualization.device_class = DeviceClassSetting::Mobile;
        let mut driver = driver_at(&config, 390, 844);
        let start = driver.scene().setup.camera.position;

        driver.on_touch(TouchPhase::Started, 1, 200.0, 400.0);
        assert_eq!(driver.on_touch(TouchPhase::Moved, 1, 202.0, 430.0), TouchOutcome::Released);
        assert_eq!(driver.on_touch(TouchPhase::Moved, 1, 260.0, 430.0), TouchOutcome::Released);
        driver.tick(0.016);
        assert_eq!(driver.scene().setup.camera.position, start);
        assert!(!driver.is_capturing_touch());
    }

    #[test]
    fn test_idle_ticks_keep_exact_camera() {
        let mut driver = driver_at(&config(), 800, 600);
        let start = driver.scene().setup.camera.position;
        for _ in 0..120 {
            let update = driver.tick(0.016).unwrap();
            assert!(!update.camera_moved);
        }
        assert_eq!(driver.scene().setup.camera.position, start);
    }

    #[test]
    fn test_shrinking_below_breakpoint_switches_to_mobile() {
        let mut driver = driver_at(&config(), 1280, 720);
        assert_eq!(driver.scene().setup.device_class, DeviceClass::Desktop);

        driver.resize(390, 844).unwrap();
        let setup = &driver.scene().setup;
        assert_eq!(setup.device_class, DeviceClass::Mobile);
        assert_eq!(setup.camera.position, Vec3::new(3.5, 1.5, 8.0));
        assert_eq!(driver.orbit().target(), Vec3::new(3.5, 0.0, 0.0));

        driver.on_touch(TouchPhase::Started, 7, 200.0, 400.0);
        assert_eq!(
            driver.on_touch(TouchPhase::Moved, 7, 202.0, 440.0),
            TouchOutcome::Released
        );
        driver.tick(0.016);
        assert_eq!(driver.scene().setup.camera.position, Vec3::new(3.5, 1.5, 8.0));
    }

    #[test]
    fn test_widening_past_breakpoint_restores_desktop_rig() {
        let mut driver = driver_at(&config(), 390, 844);
        assert_eq!(driver.scene().setup.device_class, DeviceClass::Mobile);
        driver.resize(1280, 720).unwrap();
        assert_eq!(driver.scene().setup.device_class, DeviceClass::Desktop);
        assert_eq!(driver.scene().setup.camera.position, Vec3::new(0.0, 2.0, 10.0));
        assert_eq!(driver.orbit().target(), Vec3::ZERO);
    }

    #[test]
    fn test_mobile_horizontal_swipe_orbits() {
        let mut config = config();
        config.visualization.device_class = DeviceClassSetting::Mobile;
        let mut driver = driver_at(&config, 390, 844);
        let start = driver.scene().setup.camera.position;

        driver.on_touch(TouchPhase::Started, 1, 200.0, 400.0);
        let outcome = driver.on_touch(TouchPhase::Moved, 1, 240.0, 402.0);
        assert!(matches!(outcome, TouchOutcome::Orbit(_)));
        assert!(driver.is_capturing_touch());
        driver.tick(0.016);
        assert_ne!(driver.scene().setup.camera.position, start);
    }

    #[test]
    fn test_texture_success_delivered_once() {
        let image = DecodedImage::from_bytes(&png_bytes(4, 4)).unwrap();
        let mut driver = driver_with_loader(TextureLoader::resolved(Ok(image)));
        assert_eq!(driver.scene().core.texture_state(), Some(&TextureState::Pending));

        let first = driver.tick(0.016).unwrap();
        assert!(first.texture.is_some());
        assert!(driver.scene().core.material.has_texture());
        assert!(driver.tick(0.016).unwrap().texture.is_none());
    }

    #[test]
    fn test_texture_failure_is_not_fatal() {
        let mut driver = driver_with_loader(TextureLoader::resolved(Err(TextureLoadError::WorkerLost)));
        let update = driver.tick(0.016).unwrap();
        assert!(update.texture.is_none());
        assert!(matches!(
            driver.scene().core.texture_state(),
            Some(TextureState::Failed(_))
        ));
        let spin = driver.scene().rings[0].spin();
        driver.tick(0.016).unwrap();
        assert!(driver.scene().rings[0].spin() > spin);
    }

    #[test]
    fn test_shooting_star_fires_through_driver() {
        let mut driver = driver_at(&config(), 800, 600);
        let mut activated = 0;
        let mut deactivated = 0;
        // 200 simulated seconds guarantees at least two launches.
        for _ in 0..(200 * 20) {
            match driver.tick(0.05).unwrap().star_event {
                Some(StarEvent::Activated) => activated += 1,
                Some(StarEvent::Deactivated) => deactivated += 1,
                None => {}
            }
        }
        assert!(activated >= 2, "only {activated} launches");
        assert!(activated - deactivated <= 1);
    }

    #[test]
    fn test_stream_particles_move_when_enabled() {
        let mut config = config();
        config.visualization.streams.enabled = true;
        let mut driver = driver_at(&config, 800, 600);
        let before = driver.scene().streams[0].particles()[0];
        driver.tick(0.016);
        assert_ne!(driver.scene().streams[0].particles()[0], before);
    }

    #[test]
    fn test_negative_dt_is_clamped() {
        let mut driver = driver_at(&config(), 800, 600);
        let spin = driver.scene().rings[0].spin();
        driver.tick(-1.0);
        assert_eq!(driver.scene().rings[0].spin(), spin);
        assert_eq!(driver.elapsed(), 0.0);
    }
}
