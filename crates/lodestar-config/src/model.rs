//! Typed configuration sections.
//!
//! # Design
//! - Every section defaults independently, so a partial document only overrides what it names.
//! - Unknown keys are rejected to surface typos early.

use std::path::PathBuf;
use std::time::Duration;

use lodestar_acquire::{FetchOptions, ResolverOptions};
use serde::{Deserialize, Serialize};

use crate::defaults;

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LodestarConfig {
    /// HTTP transport settings.
    pub fetch: FetchConfig,
    /// Locator selection policy.
    pub resolver: ResolverConfig,
    /// Watch-folder backend settings.
    pub blackhole: BlackholeConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// HTTP transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Redirect hops followed before giving up.
    pub max_redirects: u8,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::HTTP_TIMEOUT_SECS,
            max_redirects: defaults::MAX_REDIRECTS,
            user_agent: defaults::user_agent(),
        }
    }
}

impl FetchConfig {
    /// Transport options for the torrent fetcher.
    #[must_use]
    pub fn to_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            max_redirects: self.max_redirects,
            user_agent: self.user_agent.trim().to_string(),
            ..FetchOptions::default()
        }
    }
}

/// Locator selection policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Try the `.torrent` URL before the magnet locator.
    pub prefer_torrent_file: bool,
}

impl ResolverConfig {
    /// Resolver policy options.
    #[must_use]
    pub const fn to_options(self) -> ResolverOptions {
        ResolverOptions {
            prefer_torrent_file: self.prefer_torrent_file,
        }
    }
}

/// Watch-folder backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlackholeConfig {
    /// Directory watched by the external client; required only when the backend is used.
    pub torrent_folder: Option<PathBuf>,
    /// Extension for magnet files, without the leading dot.
    pub magnet_extension: String,
    /// Write magnets as files instead of reporting them unsupported.
    pub save_magnet_files: bool,
}

impl Default for BlackholeConfig {
    fn default() -> Self {
        Self {
            torrent_folder: None,
            magnet_extension: defaults::MAGNET_EXTENSION.to_string(),
            save_magnet_files: false,
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// `EnvFilter` directive; `RUST_LOG` still wins at runtime.
    pub level: String,
    /// Output format; inferred from the build profile when unset.
    pub format: Option<LogFormatSetting>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            format: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = LodestarConfig::default();
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.fetch.max_redirects, 5);
        assert!(config.fetch.user_agent.starts_with("lodestar/"));
        assert!(!config.resolver.prefer_torrent_file);
        assert_eq!(config.blackhole.magnet_extension, "magnet");
        assert!(!config.blackhole.save_magnet_files);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, None);
    }

    #[test]
    fn sections_convert_to_runtime_options() {
        let fetch = FetchConfig {
            timeout_secs: 12,
            max_redirects: 3,
            user_agent: " custom/1.0 ".into(),
        };
        let options = fetch.to_options();
        assert_eq!(options.timeout, Duration::from_secs(12));
        assert_eq!(options.max_redirects, 3);
        assert_eq!(options.user_agent, "custom/1.0");

        let resolver = ResolverConfig {
            prefer_torrent_file: true,
        };
        assert!(resolver.to_options().prefer_torrent_file);
    }
}
