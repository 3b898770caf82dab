//! Window creation and event handling via winit.
//!
//! [`AppState`] implements winit's [`ApplicationHandler`]. The visualization is
//! mounted once the window exists with a non-zero size, animated on every
//! redraw, and torn down when the window closes.

use std::path::PathBuf;
use std::sync::Arc;

use orbi_config::{CliArgs, Config};
use orbi_render::{
    DepthBuffer, FrameEncoder, RenderContext, RenderContextError, RenderPassBuilder,
    SurfaceError, TextureError, Viewport, ViewportResizeEvent, init_render_context_blocking,
};
use orbi_viz::{AnimationDriver, SceneSetup, Visualization};
use tracing::{debug, error, info, instrument, trace, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::frame_clock::FrameClock;

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error("GPU initialization failed: {0}")]
    RenderContext(#[from] RenderContextError),
    #[error("failed to create visualization resources: {0}")]
    Texture(#[from] TextureError),
}

/// Everything that lives between mount and teardown.
struct Mounted {
    gpu: RenderContext,
    depth_buffer: DepthBuffer,
    driver: AnimationDriver,
    visualization: Visualization,
}

impl Mounted {
    /// `Ok(None)` while the window has no area to draw into.
    fn new(window: Arc<Window>, config: &Config) -> Result<Option<Self>, MountError> {
        let scale_factor = window.scale_factor();
        let inner = window.inner_size();
        let logical = Viewport::logical_from_physical(inner.width, inner.height, scale_factor);
        let Some(setup) = SceneSetup::new(
            &config.visualization,
            &config.render,
            logical.width,
            logical.height,
            scale_factor,
        ) else {
            return Ok(None);
        };

        let buffer = setup.viewport.drawing_buffer_size();
        info!(
            "Mounting {}x{} (drawing buffer {}x{}, pixel ratio {:.2}, {:?})",
            logical.width,
            logical.height,
            buffer.width,
            buffer.height,
            setup.viewport.pixel_ratio(),
            setup.device_class
        );

        let gpu = init_render_context_blocking(
            window,
            (buffer.width, buffer.height),
            config.window.vsync,
        )?;
        let depth_buffer = DepthBuffer::new(&gpu.device, buffer.width, buffer.height);
        let driver = AnimationDriver::new(config, setup);
        let visualization =
            Visualization::new(&gpu.device, &gpu.queue, gpu.surface_format, driver.scene())?;

        Ok(Some(Self {
            gpu,
            depth_buffer,
            driver,
            visualization,
        }))
    }

    fn apply_resize(&mut self, event: ViewportResizeEvent) {
        let buffer = event.drawing_buffer;
        self.gpu.resize(buffer.width, buffer.height);
        self.depth_buffer
            .resize(&self.gpu.device, buffer.width, buffer.height);
        info!(
            "Window resized to {}x{} (drawing buffer {}x{}, pixel ratio {:.2})",
            event.logical.width,
            event.logical.height,
            buffer.width,
            buffer.height,
            event.pixel_ratio
        );
    }

    /// Advance and draw one frame. `Ok(false)` once the driver has stopped.
    fn frame(&mut self, dt: f32, clear_color: [f32; 4]) -> Result<bool, SurfaceError> {
        let Some(update) = self.driver.tick(dt) else {
            return Ok(false);
        };
        if let Some(event) = update.star_event {
            trace!(?event, elapsed = update.elapsed, "shooting star transition");
        }

        if let Err(e) = self.visualization.update(
            &self.gpu.device,
            &self.gpu.queue,
            self.driver.scene(),
            &update,
        ) {
            self.driver.reject_texture(&e);
        }

        let surface_texture = self.gpu.get_current_texture()?;
        let mut frame = FrameEncoder::new(&self.gpu.device, self.gpu.queue.clone(), surface_texture);
        let builder = RenderPassBuilder::new()
            .clear_rgba(clear_color)
            .depth(self.depth_buffer.view.clone(), DepthBuffer::CLEAR_VALUE)
            .label("orbi-frame");
        if let Some(mut pass) = frame.begin_render_pass(&builder) {
            self.visualization.render(&mut pass);
        }
        frame.submit();
        Ok(true)
    }

    /// Stop the animation and release GPU resources. The surface goes with `self`.
    fn teardown(mut self) {
        self.driver.cancel();
        self.visualization.dispose();
        self.depth_buffer.destroy();
        info!(
            "Visualization unmounted after {:.1}s",
            self.driver.elapsed()
        );
    }
}

/// The `config.ron` an [`AppState`] was started from, checked again whenever
/// the window regains focus.
#[derive(Debug)]
pub struct ConfigWatch {
    pub config_dir: PathBuf,
    /// Config as read from disk, before CLI overrides.
    pub file_config: Config,
    pub args: CliArgs,
}

/// Application state: the window, the frame clock and the mounted visualization.
pub struct AppState {
    pub config: Config,
    pub window: Option<Arc<Window>>,
    pub clock: FrameClock,
    config_watch: Option<ConfigWatch>,
    mounted: Option<Mounted>,
    closed: bool,
}

impl AppState {
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            window: None,
            clock: FrameClock::new(),
            config_watch: None,
            mounted: None,
            closed: false,
        }
    }

    /// Hot-reload the config file when the window regains focus.
    pub fn watching(mut self, watch: ConfigWatch) -> Self {
        self.config_watch = Some(watch);
        self
    }

    /// Re-read `config.ron` and apply it with the CLI overrides on top.
    ///
    /// Returns whether the effective config changed. Unreadable or invalid
    /// files are logged and leave the running config untouched.
    pub fn reload_config(&mut self) -> bool {
        let Some(watch) = &mut self.config_watch else {
            return false;
        };
        let file_config = match watch.file_config.reload(&watch.config_dir) {
            Ok(Some(file_config)) => file_config,
            Ok(None) => return false,
            Err(e) => {
                warn!("Config reload failed: {e}");
                return false;
            }
        };

        let mut config = file_config.clone();
        config.apply_cli_overrides(&watch.args);
        if let Err(e) = config.validate() {
            warn!("Reloaded config is invalid, keeping the current one: {e}");
            return false;
        }
        watch.file_config = file_config;
        if config == self.config {
            return false;
        }
        info!("Config changed on disk, applying");
        self.config = config;
        true
    }

    /// Rebuild the visualization from the current config on the same window.
    fn remount(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mounted) = self.mounted.take() {
            mounted.teardown();
        }
        if let Some(window) = &self.window {
            window.set_title(&self.config.window.title);
        }
        self.try_mount(event_loop);
    }

    /// Whether the visualization is currently mounted and animating.
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    fn try_mount(&mut self, event_loop: &ActiveEventLoop) {
        if self.mounted.is_some() || self.closed {
            return;
        }
        let Some(window) = self.window.clone() else {
            return;
        };
        match Mounted::new(window.clone(), &self.config) {
            Ok(Some(mounted)) => {
                self.mounted = Some(mounted);
                self.clock.restart();
                window.request_redraw();
            }
            Ok(None) => debug!("Window has no area yet, deferring mount"),
            Err(e) => {
                error!("{e}");
                event_loop.exit();
            }
        }
    }

    fn teardown(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            mounted.teardown();
        }
        self.closed = true;
        self.window = None;
    }

    fn scale_factor(&self) -> f64 {
        self.window.as_ref().map_or(1.0, |w| w.scale_factor())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick();
        let clear_color = self.config.render.clear_color;
        let Some(mounted) = &mut self.mounted else {
            return;
        };
        let keep_running = match mounted.frame(dt, clear_color) {
            Ok(running) => running,
            Err(SurfaceError::Timeout) => {
                warn!("Surface timeout, skipping frame");
                true
            }
            Err(SurfaceError::Lost) => {
                warn!("Surface lost, skipping frame");
                true
            }
            Err(e @ SurfaceError::OutOfMemory) => {
                error!("Rendering stopped: {e}");
                self.teardown();
                event_loop.exit();
                return;
            }
        };
        if keep_running && let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() && !self.closed {
            let attrs = window_attributes_from_config(&self.config);
            match event_loop.create_window(attrs) {
                Ok(window) => self.window = Some(Arc::new(window)),
                Err(e) => {
                    error!("Failed to create window: {e}");
                    event_loop.exit();
                    return;
                }
            }
        }
        self.try_mount(event_loop);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                let scale_factor = self.scale_factor();
                let Some(mounted) = &mut self.mounted else {
                    self.try_mount(event_loop);
                    return;
                };
                let logical =
                    Viewport::logical_from_physical(new_size.width, new_size.height, scale_factor);
                if let Some(resize) = mounted.driver.resize(logical.width, logical.height) {
                    mounted.apply_resize(resize);
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(mounted) = &mut self.mounted
                    && let Some(resize) = mounted.driver.scale_factor_changed(scale_factor)
                {
                    mounted.apply_resize(resize);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f64>(self.scale_factor());
                if let Some(mounted) = &mut self.mounted {
                    mounted.driver.on_cursor_moved(logical.x, logical.y);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(mounted) = &mut self.mounted {
                    mounted.driver.on_mouse_button(button, state);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                if let Some(mounted) = &mut self.mounted {
                    mounted.driver.on_cursor_left();
                }
            }
            WindowEvent::Focused(false) => {
                if let Some(mounted) = &mut self.mounted {
                    mounted.driver.on_focus_lost();
                }
            }
            WindowEvent::Focused(true) => {
                if self.reload_config() && self.is_mounted() {
                    self.remount(event_loop);
                }
            }
            WindowEvent::Touch(touch) => {
                let logical = touch.location.to_logical::<f64>(self.scale_factor());
                if let Some(mounted) = &mut self.mounted {
                    let outcome =
                        mounted
                            .driver
                            .on_touch(touch.phase, touch.id, logical.x, logical.y);
                    trace!(id = touch.id, phase = ?touch.phase, ?outcome, "touch");
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

/// Creates an event loop and runs the visualization.
///
/// Blocks until the window is closed.
#[instrument(skip_all)]
pub fn run(mut app: AppState) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)
}
