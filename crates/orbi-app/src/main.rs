//! The `orbi` binary: resolve directories, load config, start logging, open the window.

use clap::Parser;
use orbi_app::platform::PlatformDirs;
use orbi_app::window::{AppState, ConfigWatch};
use orbi_config::{CliArgs, Config};

fn main() {
    let args = CliArgs::parse();

    let dirs = match PlatformDirs::resolve() {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("Failed to resolve platform directories: {e}");
            std::process::exit(1);
        }
    };
    let dirs = match args.config.clone() {
        Some(config_dir) => dirs.with_config_dir(config_dir),
        None => dirs,
    };
    if let Err(e) = dirs.create_dirs() {
        eprintln!("Failed to create platform directories: {e}");
    }

    let file_config = Config::load_or_create(&dirs.config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    let mut config = file_config.clone();
    config.apply_cli_overrides(&args);

    orbi_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    tracing::info!(
        config_dir = %dirs.config_dir.display(),
        log_dir = %dirs.log_dir.display(),
        "Orbi starting"
    );

    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {e}");
        std::process::exit(2);
    }

    let app = AppState::with_config(config).watching(ConfigWatch {
        config_dir: dirs.config_dir.clone(),
        file_config,
        args,
    });
    if let Err(e) = orbi_app::window::run(app) {
        tracing::error!("Event loop failed: {e}");
        std::process::exit(1);
    }
}
