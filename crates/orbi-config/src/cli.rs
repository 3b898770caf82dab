//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, DeviceClassSetting};

/// Orbi command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "orbi", about = "Animated planet, particle rings and starfield")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Horizontal offset of the whole visualization.
    #[arg(long)]
    pub offset: Option<f32>,

    /// Core texture: file path or http(s) URL.
    #[arg(long)]
    pub texture: Option<String>,

    /// Enable or disable the radial data streams.
    #[arg(long)]
    pub streams: Option<bool>,

    /// Force the mobile device class (closer camera, touch capture).
    #[arg(long)]
    pub mobile: bool,

    /// Fixed RNG seed for reproducible particle layouts.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(offset) = args.offset {
            self.visualization.offset = offset;
        }
        if let Some(ref texture) = args.texture {
            self.visualization.texture = Some(texture.clone());
        }
        if let Some(streams) = args.streams {
            self.visualization.streams.enabled = streams;
        }
        if args.mobile {
            self.visualization.device_class = DeviceClassSetting::Mobile;
        }
        if let Some(seed) = args.seed {
            self.visualization.seed = Some(seed);
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(800),
            offset: Some(0.0),
            texture: Some("https://example.com/planet.jpg".to_string()),
            mobile: true,
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.window.width, 800);
        assert_eq!(config.visualization.offset, 0.0);
        assert_eq!(
            config.visualization.texture.as_deref(),
            Some("https://example.com/planet.jpg")
        );
        assert_eq!(config.visualization.device_class, DeviceClassSetting::Mobile);
        // Non-overridden fields retain defaults
        assert_eq!(config.window.height, 720);
        assert!(!config.visualization.streams.enabled);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from(["orbi", "--streams", "true", "--seed", "7", "--mobile"]);
        assert_eq!(args.streams, Some(true));
        assert_eq!(args.seed, Some(7));
        assert!(args.mobile);
        assert!(args.width.is_none());
    }
}
