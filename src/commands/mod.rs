//! Command implementations for the ocpack CLI

pub mod completions;
pub mod list;
pub mod package;
pub mod package_all;
pub mod version;

use std::path::Path;

use ocpack::config::PackagerSettings;
use ocpack::error::{OcpackError, Result};
use ocpack::packager::Packager;
use ocpack::template::EngineRegistry;

use crate::cli::BuildOptions;

/// Load settings and apply command line overrides
pub(crate) fn load_settings(config: Option<&Path>, build: &BuildOptions) -> Result<PackagerSettings> {
    let cwd = current_dir()?;
    let mut settings = PackagerSettings::load(config, &cwd)?;
    if build.no_minify {
        settings.minify = false;
    }
    if let Some(output_dir) = &build.output_dir {
        settings.output_dir.clone_from(output_dir);
    }
    settings.validate()?;
    Ok(settings)
}

/// Build a packager with the built-in engines
pub(crate) fn packager(settings: PackagerSettings) -> Result<Packager> {
    let cwd = current_dir()?;
    Ok(Packager::from_settings(
        EngineRegistry::with_defaults(),
        settings,
        &cwd,
    ))
}

fn current_dir() -> Result<std::path::PathBuf> {
    std::env::current_dir().map_err(|e| OcpackError::IoError {
        message: format!("Failed to get current directory: {e}"),
    })
}
