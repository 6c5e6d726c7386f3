use lodestar_acquire::{ReleaseRecord, Resolved, cancel_pair};
use lodestar_config::LodestarConfig;
use tracing::{info, warn};

use crate::cli::{OutputFormat, ResolveArgs};
use crate::client::{CliError, CliResult, build_resolver, classify_acquire_error};
use crate::output::render_resolved;

pub(crate) async fn handle_resolve(
    config: &LodestarConfig,
    args: ResolveArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let resolved = resolve_release(config, args).await?;
    print!("{}", render_resolved(&resolved, format)?);
    Ok(())
}

pub(crate) async fn resolve_release(
    config: &LodestarConfig,
    args: ResolveArgs,
) -> CliResult<Resolved> {
    let release = release_from_args(&args)?;
    let resolver = build_resolver(config, &args)?;

    let (handle, signal) = cancel_pair();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling resolution");
            handle.cancel();
        }
    });
    let outcome = resolver.resolve_with_cancel(&release, &signal).await;
    watcher.abort();

    let resolved = outcome.map_err(classify_acquire_error)?;
    info!(
        info_hash = %resolved.info_hash,
        protocol = %resolved.protocol,
        consistent = resolved.warning.is_none(),
        "release resolved"
    );
    Ok(resolved)
}

fn release_from_args(args: &ResolveArgs) -> CliResult<ReleaseRecord> {
    let title = args.title.trim();
    if title.is_empty() {
        return Err(CliError::validation("--title must not be empty"));
    }
    let url = args.url.as_deref().map(str::trim).unwrap_or_default();
    let magnet = args
        .magnet
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if url.is_empty() && magnet.is_none() {
        return Err(CliError::validation("pass --url, --magnet or both"));
    }

    let mut release = ReleaseRecord::new(title, url);
    if let Some(magnet) = magnet {
        release = release.with_magnet(magnet);
    }
    if let Some(indexer) = args.indexer.as_deref() {
        release = release.with_indexer(indexer);
    }
    Ok(release)
}
