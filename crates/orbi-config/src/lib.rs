//! Configuration for the Orbi visualization.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line. Unknown or missing fields fall back to defaults so older
//! config files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, DeviceClassSetting, InputConfig, RenderConfig, RingConfig,
    ShootingStarConfig, StarfieldConfig, StreamConfig, VisualizationConfig, WindowConfig,
};
pub use error::ConfigError;
