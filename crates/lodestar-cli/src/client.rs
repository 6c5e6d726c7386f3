//! Error types and resolver construction for the CLI.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use anyhow::anyhow;
use lodestar_acquire::{AcquireError, AcquisitionResolver, TorrentFetcher};
use lodestar_blackhole::{BlackholeBackend, BlackholeOptions};
use lodestar_config::LodestarConfig;

use crate::cli::ResolveArgs;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Map a resolution failure onto the CLI exit-code classes.
///
/// Locator problems are caller input and count as validation errors; everything else is an
/// operational failure.
pub(crate) fn classify_acquire_error(err: AcquireError) -> CliError {
    let message = match &err {
        AcquireError::MalformedLocator { locator, reason } => {
            Some(format!("malformed locator '{locator}': {reason}"))
        }
        AcquireError::NoUsableLocator { title } => {
            Some(format!("release '{title}' has no usable locator"))
        }
        _ => None,
    };
    message.map_or_else(|| CliError::failure(err), CliError::Validation)
}

/// Build a resolver writing into the watch folder, applying per-invocation overrides on top of
/// the loaded configuration.
pub(crate) fn build_resolver(
    config: &LodestarConfig,
    args: &ResolveArgs,
) -> CliResult<AcquisitionResolver> {
    let torrent_folder = args
        .torrent_folder
        .clone()
        .or_else(|| config.blackhole.torrent_folder.clone())
        .ok_or_else(|| {
            CliError::validation(
                "torrent folder is required (pass --torrent-folder or set LODESTAR_TORRENT_FOLDER)",
            )
        })?;
    if !torrent_folder.is_dir() {
        return Err(CliError::validation(format!(
            "torrent folder '{}' is not a directory",
            torrent_folder.display()
        )));
    }

    let backend = BlackholeBackend::new(BlackholeOptions {
        torrent_folder,
        magnet_extension: config.blackhole.magnet_extension.clone(),
        save_magnet_files: args.save_magnet_files || config.blackhole.save_magnet_files,
    });

    let mut fetch = config.fetch.to_options();
    if let Some(max_redirects) = args.max_redirects {
        fetch.max_redirects = max_redirects;
    }
    let fetcher = TorrentFetcher::new(&fetch)
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;

    let mut options = config.resolver.to_options();
    options.prefer_torrent_file |= args.prefer_torrent_file;

    Ok(AcquisitionResolver::new(Arc::new(backend), fetcher).with_options(options))
}
