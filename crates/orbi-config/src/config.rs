//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Rendering settings.
    pub render: RenderConfig,
    /// Scene content: core body, rings, starfield, streams, shooting star.
    pub visualization: VisualizationConfig,
    /// Orbit and touch input settings.
    pub input: InputConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Clear color as linear RGBA.
    pub clear_color: [f32; 4],
    /// Upper bound applied to the window scale factor when sizing the drawing buffer.
    pub max_pixel_ratio: f64,
}

/// How the device class is chosen at mount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DeviceClassSetting {
    /// Compare the initial logical window width against the mobile breakpoint.
    #[default]
    Auto,
    Desktop,
    Mobile,
}

/// Everything that shapes the scene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Horizontal displacement applied to every piece of geometry.
    pub offset: f32,
    /// Radius of the core sphere.
    pub core_radius: f32,
    /// Optional surface texture: a file path or an `http(s)` URL.
    pub texture: Option<String>,
    /// Fixed RNG seed. `None` seeds from the clock.
    pub seed: Option<u64>,
    pub device_class: DeviceClassSetting,
    /// Logical widths strictly below this are treated as mobile.
    pub mobile_breakpoint: u32,
    /// Rings, listed outer/main first.
    pub rings: Vec<RingConfig>,
    pub starfield: StarfieldConfig,
    pub streams: StreamConfig,
    pub shooting_star: ShootingStarConfig,
}

/// One particle ring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RingConfig {
    pub radius: f32,
    pub thickness: f32,
    pub count: u32,
    /// Packed `0xRRGGBB`.
    pub color: u32,
    /// Y rotation added per 60 Hz reference frame (radians).
    pub spin_per_frame: f32,
    /// Initial Y rotation (radians).
    pub initial_spin: f32,
    /// X tilt amplitude (radians). Zero keeps the tilt fixed at `base_tilt`.
    pub tilt_amplitude: f32,
    /// X tilt angular frequency against elapsed seconds.
    pub tilt_frequency: f32,
    /// X tilt when the oscillation is disabled.
    pub base_tilt: f32,
}

/// Background starfield.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StarfieldConfig {
    pub count: u32,
    /// Nominal radius; the field occupies `radius * 0.26`.
    pub radius: f32,
    /// Stars must lie beyond `exclusion_multiple * core_radius` from the core.
    pub exclusion_multiple: f32,
}

/// Radial data streams.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamConfig {
    pub enabled: bool,
    pub lanes: u32,
    pub particles_per_lane: u32,
}

/// Shooting star scheduling and geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShootingStarConfig {
    pub enabled: bool,
    /// Idle interval lower bound in seconds.
    pub min_interval_secs: f32,
    /// Idle interval upper bound in seconds.
    pub max_interval_secs: f32,
    /// Upper bound on the start-point distance from the core center.
    pub max_distance: f32,
}

/// Input configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Orbit rotation speed multiplier.
    pub rotate_speed: f32,
    /// Fraction of the pending rotation applied each frame.
    pub damping_factor: f32,
    /// Pixels a touch must travel before its direction is decided.
    pub touch_direction_threshold: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            vsync: true,
            title: "Orbi".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.039, 0.039, 0.039, 1.0],
            max_pixel_ratio: 2.0,
        }
    }
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            offset: 3.5,
            core_radius: 1.3,
            texture: None,
            seed: None,
            device_class: DeviceClassSetting::Auto,
            mobile_breakpoint: 768,
            rings: RingConfig::default_set(),
            starfield: StarfieldConfig::default(),
            streams: StreamConfig::default(),
            shooting_star: ShootingStarConfig::default(),
        }
    }
}

impl RingConfig {
    /// The three stock rings: outer/main, mid, inner.
    pub fn default_set() -> Vec<RingConfig> {
        vec![
            RingConfig {
                radius: 1.8,
                thickness: 0.6,
                count: 15_000,
                color: 0xff4500,
                spin_per_frame: 0.001,
                initial_spin: 0.105,
                tilt_amplitude: 0.1,
                tilt_frequency: 0.1,
                base_tilt: 0.0,
            },
            RingConfig {
                radius: 2.4,
                thickness: 0.3,
                count: 10_000,
                color: 0xff6347,
                spin_per_frame: -0.0008,
                initial_spin: -0.084,
                tilt_amplitude: 0.05,
                tilt_frequency: 0.12,
                base_tilt: 0.0,
            },
            RingConfig {
                radius: 1.5,
                thickness: 0.2,
                count: 7_500,
                color: 0xd03e15,
                spin_per_frame: 0.0012 * 0.3,
                initial_spin: 0.0378,
                tilt_amplitude: 0.0,
                tilt_frequency: 0.0,
                base_tilt: 0.02,
            },
        ]
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            radius: 1.8,
            thickness: 0.6,
            count: 15_000,
            color: 0xff4500,
            spin_per_frame: 0.001,
            initial_spin: 0.0,
            tilt_amplitude: 0.0,
            tilt_frequency: 0.0,
            base_tilt: 0.0,
        }
    }
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            count: 2_000,
            radius: 50.0,
            exclusion_multiple: 3.0,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            lanes: 5,
            particles_per_lane: 100,
        }
    }
}

impl Default for ShootingStarConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval_secs: 30.0,
            max_interval_secs: 90.0,
            max_distance: 5.0,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            rotate_speed: 0.5,
            damping_factor: 0.05,
            touch_direction_threshold: 10.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Validation ---

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

impl Config {
    /// Reject values the scene builders cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let viz = &self.visualization;
        if !(viz.core_radius > 0.0) {
            return Err(invalid("visualization.core_radius", "must be positive"));
        }
        for ring in &viz.rings {
            if ring.thickness < 0.0 || ring.radius - ring.thickness * 0.5 < 0.0 {
                return Err(invalid(
                    "visualization.rings",
                    format!(
                        "radius {} with thickness {} reaches below zero",
                        ring.radius, ring.thickness
                    ),
                ));
            }
        }
        let star = &viz.shooting_star;
        if star.min_interval_secs < 0.0 || star.max_interval_secs < star.min_interval_secs {
            return Err(invalid(
                "visualization.shooting_star",
                format!(
                    "interval [{}, {}] is not a valid range",
                    star.min_interval_secs, star.max_interval_secs
                ),
            ));
        }
        if star.max_distance < viz.core_radius * 2.0 {
            return Err(invalid(
                "visualization.shooting_star.max_distance",
                format!("must be at least twice the core radius ({})", viz.core_radius * 2.0),
            ));
        }
        if !(self.render.max_pixel_ratio > 0.0) {
            return Err(invalid("render.max_pixel_ratio", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.input.damping_factor) {
            return Err(invalid("input.damping_factor", "must lie in [0, 1]"));
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Platform config directory for Orbi (e.g. `~/.config/orbi` on Linux).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("orbi"))
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
