//! Layered pipeline configuration.
//!
//! Sources, later ones overriding earlier ones:
//! 1. built-in defaults
//! 2. a TOML file (`--config`, or `fractal/config.toml` under the user's
//!    config directory when present)
//! 3. `FRACTAL__<SECTION>__<KEY>` environment variables, e.g.
//!    `FRACTAL__SMOOTHING__WINDOW_SIZE=3`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use tracing::debug;

use fractal_addendum::PipelineConfig;

/// `<config dir>/fractal/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("fractal").join("config.toml"))
}

pub fn load(path: Option<&Path>) -> Result<PipelineConfig> {
    let defaults =
        Config::try_from(&PipelineConfig::default()).context("Failed to encode default configuration")?;
    let mut builder = Config::builder().add_source(defaults);

    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        None => {
            if let Some(path) = default_config_path() {
                builder =
                    builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
            }
        }
    }

    let settings = builder
        .add_source(
            Environment::with_prefix("FRACTAL")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to read configuration")?;
    let config: PipelineConfig = settings
        .try_deserialize()
        .context("Invalid configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
