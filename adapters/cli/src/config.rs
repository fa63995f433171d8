use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use gridsly_core::MapSlot;
use gridsly_rendering::CELL_SIZE;
use gridsly_rendering_image::DEFAULT_EXPORT_FILE;
use gridsly_session::{DEFAULT_ZOOM, MAX_ZOOM};
use serde::Deserialize;

/// Configuration file looked up in the working directory.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "gridsly.toml";
const DEFAULT_STORE_DIR: &str = ".gridsly";

/// Settings shared by every subcommand.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    /// Directory holding the slot files.
    pub(crate) store_dir: PathBuf,
    /// Slot opened by default.
    pub(crate) slot: MapSlot,
    /// Zoom used for pixel coordinates and export.
    pub(crate) zoom: f32,
    /// Cell size in pixels at zoom 1.
    pub(crate) cell_size: f32,
    /// Destination of `export` when `--out` is absent.
    pub(crate) export_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            slot: MapSlot::default(),
            zoom: DEFAULT_ZOOM,
            cell_size: CELL_SIZE,
            export_file: PathBuf::from(DEFAULT_EXPORT_FILE),
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// An explicit path must exist. Without one, `gridsly.toml` in the working
    /// directory is used when present and defaults otherwise.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents)
                .with_context(|| format!("invalid configuration in {}", path.display())),
            Err(error) if error.kind() == io::ErrorKind::NotFound && explicit.is_none() => {
                Ok(Self::default())
            }
            Err(error) => Err(error)
                .with_context(|| format!("failed to read configuration {}", path.display())),
        }
    }

    /// Parses configuration file contents.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("failed to parse configuration toml")?;
        if !(config.zoom > 0.0 && config.zoom < MAX_ZOOM) {
            bail!("zoom {} must lie between 0 and {MAX_ZOOM}", config.zoom);
        }
        if !(config.cell_size.is_finite() && config.cell_size > 0.0) {
            bail!("cell size {} must be positive", config.cell_size);
        }
        Ok(config)
    }
}
