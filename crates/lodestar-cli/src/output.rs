//! Output renderers and formatting helpers for CLI commands.

use std::fmt::Write as _;

use anyhow::anyhow;
use lodestar_acquire::Resolved;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

/// Locally computed identifier reported by `lodestar hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct HashReport {
    pub(crate) source: String,
    pub(crate) kind: &'static str,
    pub(crate) info_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) display_name: Option<String>,
}

pub(crate) fn render_resolved(resolved: &Resolved, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(resolved),
        OutputFormat::Table => {
            let mut text = String::new();
            let _ = writeln!(text, "info hash: {}", resolved.info_hash);
            let _ = writeln!(text, "protocol: {}", resolved.protocol);
            let _ = writeln!(text, "locator: {}", resolved.locator);
            if let Some(warning) = &resolved.warning {
                let _ = writeln!(
                    text,
                    "warning: download client reported {} (expected {})",
                    warning.reported, warning.expected
                );
            }
            Ok(text)
        }
    }
}

pub(crate) fn render_hash(report: &HashReport, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Table => {
            let mut text = String::new();
            let _ = writeln!(text, "{:<12} {:<40} SOURCE", "KIND", "INFO HASH");
            let _ = writeln!(
                text,
                "{:<12} {:<40} {}",
                report.kind,
                report.info_hash,
                report.display_name.as_deref().unwrap_or(&report.source)
            );
            Ok(text)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> CliResult<String> {
    let mut text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    text.push('\n');
    Ok(text)
}
