//! Platform configuration loading.
//!
//! Configuration is a TOML document with optional `[loading]` and `[consent]`
//! tables; see [`PlatformConfig`] for the keys and defaults.

use std::fs;
use std::path::Path;

use nightfall_types::PlatformConfig;

use crate::error::ConfigError;

/// Parse configuration from a TOML string. `origin` names the source in errors.
pub fn parse_config(contents: &str, origin: &str) -> Result<PlatformConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<PlatformConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents, &path.display().to_string())
}

/// Parse configuration, falling back to defaults (logged) on error.
pub fn parse_config_or_default(contents: &str, origin: &str) -> PlatformConfig {
    parse_config(contents, origin).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Invalid configuration, using defaults");
        PlatformConfig::default()
    })
}
