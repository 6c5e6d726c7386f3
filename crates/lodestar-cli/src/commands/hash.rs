use std::path::Path;

use anyhow::anyhow;
use lodestar_acquire::magnet::is_magnet;
use lodestar_acquire::{AcquireError, MagnetLink, info_hash_from_torrent};

use crate::cli::{HashArgs, OutputFormat};
use crate::client::{CliError, CliResult};
use crate::output::{HashReport, render_hash};

pub(crate) fn handle_hash(args: &HashArgs, format: OutputFormat) -> CliResult<()> {
    let report = hash_source(&args.source)?;
    print!("{}", render_hash(&report, format)?);
    Ok(())
}

pub(crate) fn hash_source(source: &str) -> CliResult<HashReport> {
    let source = source.trim();
    if source.is_empty() {
        return Err(CliError::validation("source must not be empty"));
    }

    if is_magnet(source) {
        let link = MagnetLink::parse(source).map_err(|err| match err {
            AcquireError::MalformedLocator { reason, .. } => {
                CliError::validation(format!("malformed magnet locator: {reason}"))
            }
            other => CliError::failure(other),
        })?;
        return Ok(HashReport {
            source: source.to_string(),
            kind: "magnet",
            info_hash: link.info_hash.to_string(),
            display_name: link.display_name,
        });
    }

    let path = Path::new(source);
    let bytes = std::fs::read(path).map_err(|err| {
        CliError::failure(anyhow!(
            "failed to read torrent file '{}': {err}",
            path.display()
        ))
    })?;
    let info_hash = info_hash_from_torrent(&bytes).map_err(|err| {
        CliError::validation(format!("'{}' is not a valid torrent: {err}", path.display()))
    })?;
    Ok(HashReport {
        source: source.to_string(),
        kind: "torrent_file",
        info_hash: info_hash.to_string(),
        display_name: None,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use lodestar_test_support::fixtures::SAMPLE;

    use super::*;

    #[test]
    fn hashes_magnet_locators() {
        let report =
            hash_source("magnet:?xt=urn:btih:ABCDEF&dn=Show.S01E01").expect("valid magnet");
        assert_eq!(report.kind, "magnet");
        assert_eq!(report.info_hash, "abcdef");
        assert_eq!(report.display_name.as_deref(), Some("Show.S01E01"));
    }

    #[test]
    fn hashes_torrent_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sample.torrent");
        fs::write(&path, SAMPLE.bytes).expect("write fixture");

        let report = hash_source(path.to_str().expect("utf-8 path")).expect("valid torrent");
        assert_eq!(report.kind, "torrent_file");
        assert_eq!(report.info_hash, SAMPLE.info_hash);
    }

    #[test]
    fn classifies_bad_input() {
        assert_eq!(hash_source("  ").expect_err("empty").exit_code(), 2);
        assert_eq!(
            hash_source("magnet:?dn=nothing").expect_err("no topic").exit_code(),
            2
        );
        assert_eq!(
            hash_source("/definitely/missing.torrent")
                .expect_err("missing file")
                .exit_code(),
            3
        );

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bogus.torrent");
        fs::write(&path, b"<html></html>").expect("write");
        assert_eq!(
            hash_source(path.to_str().expect("utf-8 path"))
                .expect_err("not bencode")
                .exit_code(),
            2
        );
    }
}
