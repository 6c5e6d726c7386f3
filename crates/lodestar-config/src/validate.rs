//! Validation helpers for configuration documents.

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::model::LodestarConfig;

/// Check ranges and shapes across every section.
///
/// # Errors
///
/// Returns the first [`ConfigError::InvalidField`] encountered.
pub fn validate(config: &LodestarConfig) -> ConfigResult<()> {
    let (min_timeout, max_timeout) = defaults::HTTP_TIMEOUT_RANGE;
    if !(min_timeout..=max_timeout).contains(&config.fetch.timeout_secs) {
        return Err(ConfigError::invalid(
            "fetch",
            "timeout_secs",
            Some(config.fetch.timeout_secs.to_string()),
            "must be between 1 and 600",
        ));
    }

    let (min_hops, max_hops) = defaults::MAX_REDIRECTS_RANGE;
    if !(min_hops..=max_hops).contains(&config.fetch.max_redirects) {
        return Err(ConfigError::invalid(
            "fetch",
            "max_redirects",
            Some(config.fetch.max_redirects.to_string()),
            "must be between 1 and 20",
        ));
    }

    let user_agent = config.fetch.user_agent.trim();
    if user_agent.is_empty() {
        return Err(ConfigError::invalid("fetch", "user_agent", None, "must not be empty"));
    }
    if user_agent.chars().any(char::is_control) {
        return Err(ConfigError::invalid(
            "fetch",
            "user_agent",
            Some(user_agent.to_string()),
            "must not contain control characters",
        ));
    }

    validate_magnet_extension(&config.blackhole.magnet_extension)?;

    if let Some(folder) = &config.blackhole.torrent_folder
        && folder.as_os_str().is_empty()
    {
        return Err(ConfigError::invalid(
            "blackhole",
            "torrent_folder",
            None,
            "must not be empty when set",
        ));
    }

    if config.logging.level.trim().is_empty() {
        return Err(ConfigError::invalid("logging", "level", None, "must not be empty"));
    }

    Ok(())
}

fn validate_magnet_extension(extension: &str) -> ConfigResult<()> {
    let trimmed = extension.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(
            "blackhole",
            "magnet_extension",
            Some(extension.to_string()),
            "must not be empty",
        ));
    }
    if !trimmed
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(ConfigError::invalid(
            "blackhole",
            "magnet_extension",
            Some(extension.to_string()),
            "must be alphanumeric",
        ));
    }
    Ok(())
}

/// Parse a boolean flag the way the environment overlay accepts it.
pub(crate) fn parse_flag(
    section: &'static str,
    field: &'static str,
    value: &str,
) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(
            section,
            field,
            Some(value.to_string()),
            "must be a boolean",
        )),
    }
}
