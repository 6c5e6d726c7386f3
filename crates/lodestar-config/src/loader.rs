//! Configuration loading: optional JSON file, then `LODESTAR_*` environment overrides, then
//! validation.
//!
//! # Design
//! - The environment overlay takes a lookup function so it can be exercised without mutating the
//!   process environment.
//! - Every loaded document is validated before it is returned.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::model::{LodestarConfig, LogFormatSetting};
use crate::validate::{parse_flag, validate};

/// Environment variable overriding `fetch.timeout_secs`.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "LODESTAR_HTTP_TIMEOUT_SECS";
/// Environment variable overriding `fetch.max_redirects`.
pub const ENV_MAX_REDIRECTS: &str = "LODESTAR_MAX_REDIRECTS";
/// Environment variable overriding `fetch.user_agent`.
pub const ENV_USER_AGENT: &str = "LODESTAR_USER_AGENT";
/// Environment variable overriding `resolver.prefer_torrent_file`.
pub const ENV_PREFER_TORRENT_FILE: &str = "LODESTAR_PREFER_TORRENT_FILE";
/// Environment variable overriding `blackhole.torrent_folder`.
pub const ENV_TORRENT_FOLDER: &str = "LODESTAR_TORRENT_FOLDER";
/// Environment variable overriding `blackhole.magnet_extension`.
pub const ENV_MAGNET_EXTENSION: &str = "LODESTAR_MAGNET_EXTENSION";
/// Environment variable overriding `blackhole.save_magnet_files`.
pub const ENV_SAVE_MAGNET_FILES: &str = "LODESTAR_SAVE_MAGNET_FILES";
/// Environment variable overriding `logging.level`.
pub const ENV_LOG_LEVEL: &str = "LODESTAR_LOG_LEVEL";
/// Environment variable overriding `logging.format`.
pub const ENV_LOG_FORMAT: &str = "LODESTAR_LOG_FORMAT";

/// Load configuration from `path` (when given) and the process environment.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file cannot be read, [`ConfigError::Parse`] when it is not
/// a valid document, and [`ConfigError::InvalidField`] for bad overrides or failed validation.
pub fn load(path: Option<&Path>) -> ConfigResult<LodestarConfig> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => LodestarConfig::default(),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate(&config)?;
    info!(
        source = path.map_or_else(|| "defaults".to_string(), |p| p.display().to_string()),
        max_redirects = config.fetch.max_redirects,
        timeout_secs = config.fetch.timeout_secs,
        prefer_torrent_file = config.resolver.prefer_torrent_file,
        "configuration loaded"
    );
    Ok(config)
}

/// Parse and validate a JSON document without consulting the environment.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] or [`ConfigError::InvalidField`].
pub fn from_json_str(document: &str) -> ConfigResult<LodestarConfig> {
    let config = parse_document(document, None)?;
    validate(&config)?;
    Ok(config)
}

fn read_file(path: &Path) -> ConfigResult<LodestarConfig> {
    let document = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "config.read",
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "configuration file read");
    parse_document(&document, Some(path))
}

fn parse_document(document: &str, path: Option<&Path>) -> ConfigResult<LodestarConfig> {
    if document.trim().is_empty() {
        return Ok(LodestarConfig::default());
    }
    serde_json::from_str(document).map_err(|source| ConfigError::Parse {
        path: path.map(Path::to_path_buf),
        source,
    })
}

/// Overlay `LODESTAR_*` variables resolved through `lookup` onto `config`.
///
/// Blank values are ignored.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when a value cannot be parsed.
pub fn apply_env_overrides<F>(config: &mut LodestarConfig, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(value) = get(ENV_HTTP_TIMEOUT_SECS) {
        config.fetch.timeout_secs = value.trim().parse().map_err(|_| {
            ConfigError::invalid("fetch", "timeout_secs", Some(value.clone()), "must be an integer")
        })?;
    }
    if let Some(value) = get(ENV_MAX_REDIRECTS) {
        config.fetch.max_redirects = value.trim().parse().map_err(|_| {
            ConfigError::invalid(
                "fetch",
                "max_redirects",
                Some(value.clone()),
                "must be an integer between 1 and 20",
            )
        })?;
    }
    if let Some(value) = get(ENV_USER_AGENT) {
        config.fetch.user_agent = value.trim().to_string();
    }
    if let Some(value) = get(ENV_PREFER_TORRENT_FILE) {
        config.resolver.prefer_torrent_file = parse_flag("resolver", "prefer_torrent_file", &value)?;
    }
    if let Some(value) = get(ENV_TORRENT_FOLDER) {
        config.blackhole.torrent_folder = Some(PathBuf::from(value.trim()));
    }
    if let Some(value) = get(ENV_MAGNET_EXTENSION) {
        config.blackhole.magnet_extension = value.trim().to_string();
    }
    if let Some(value) = get(ENV_SAVE_MAGNET_FILES) {
        config.blackhole.save_magnet_files = parse_flag("blackhole", "save_magnet_files", &value)?;
    }
    if let Some(value) = get(ENV_LOG_LEVEL) {
        config.logging.level = value.trim().to_string();
    }
    if let Some(value) = get(ENV_LOG_FORMAT) {
        config.logging.format = Some(match value.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormatSetting::Json,
            "pretty" => LogFormatSetting::Pretty,
            _ => {
                return Err(ConfigError::invalid(
                    "logging",
                    "format",
                    Some(value),
                    "must be 'json' or 'pretty'",
                ));
            }
        });
    }
    Ok(())
}
