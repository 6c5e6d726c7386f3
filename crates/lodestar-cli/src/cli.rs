//! Argument parsing and command dispatch.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use lodestar_config::{ConfigError, LodestarConfig, LogFormatSetting, LoggingSettings};
use lodestar_telemetry::{LogFormat, LoggingConfig, build_version, command_span, init_logging};
use tracing::Instrument;

use crate::client::{CliError, CliResult};
use crate::commands::hash::handle_hash;
use crate::commands::resolve::handle_resolve;

/// Parses CLI arguments, executes the requested command and returns the process exit code.
pub async fn run() -> i32 {
    execute(Cli::parse()).await
}

pub(crate) async fn execute(cli: Cli) -> i32 {
    match load_and_dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn load_and_dispatch(cli: Cli) -> CliResult<()> {
    let config = load_config(cli.config.as_deref())?;
    install_logging(&config.logging);
    let span = command_span(command_label(&cli.command));
    dispatch(cli, &config).instrument(span).await
}

async fn dispatch(cli: Cli, config: &LodestarConfig) -> CliResult<()> {
    match cli.command {
        Command::Resolve(args) => handle_resolve(config, args, cli.output).await,
        Command::Hash(args) => handle_hash(&args, cli.output),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<LodestarConfig> {
    lodestar_config::load(path).map_err(|err| {
        if matches!(err, ConfigError::Io { .. }) {
            CliError::failure(err)
        } else {
            CliError::validation(config_message(&err))
        }
    })
}

fn config_message(err: &ConfigError) -> String {
    match err {
        ConfigError::InvalidField {
            section,
            field,
            value,
            reason,
        } => value.as_ref().map_or_else(
            || format!("invalid configuration: {section}.{field} {reason}"),
            |value| format!("invalid configuration: {section}.{field}={value} {reason}"),
        ),
        ConfigError::Parse { source, .. } => format!("{err}: {source}"),
        ConfigError::Io { source, .. } => format!("{err}: {source}"),
    }
}

fn install_logging(settings: &LoggingSettings) {
    let config = LoggingConfig {
        level: &settings.level,
        format: log_format(settings),
        build_version: build_version(),
    };
    if let Err(err) = init_logging(&config) {
        eprintln!("warning: {err:#}");
    }
}

fn log_format(settings: &LoggingSettings) -> LogFormat {
    settings.format.map_or_else(LogFormat::infer, |format| match format {
        LogFormatSetting::Json => LogFormat::Json,
        LogFormatSetting::Pretty => LogFormat::Pretty,
    })
}

#[derive(Parser)]
#[command(
    name = "lodestar",
    version,
    about = "Resolve releases into info-hashes registered with a download client"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "LODESTAR_CONFIG",
        help = "Path to a JSON configuration file"
    )]
    pub(crate) config: Option<PathBuf>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Resolve one release and hand it to the watch-folder backend.
    Resolve(ResolveArgs),
    /// Print the info-hash of a magnet locator or a `.torrent` file.
    Hash(HashArgs),
}

#[derive(Args, Default)]
pub(crate) struct ResolveArgs {
    #[arg(long, help = "Release title, used for logging and file naming")]
    pub(crate) title: String,
    #[arg(long, help = "HTTP(S) URL of the .torrent file")]
    pub(crate) url: Option<String>,
    #[arg(long, help = "Magnet locator; wins over a magnet passed as --url")]
    pub(crate) magnet: Option<String>,
    #[arg(long, help = "Indexer name recorded in logs")]
    pub(crate) indexer: Option<String>,
    #[arg(long, help = "Watch folder; overrides blackhole.torrent_folder")]
    pub(crate) torrent_folder: Option<PathBuf>,
    #[arg(long, help = "Write magnets as files instead of falling back to the URL")]
    pub(crate) save_magnet_files: bool,
    #[arg(long, help = "Try the .torrent URL before the magnet locator")]
    pub(crate) prefer_torrent_file: bool,
    #[arg(
        long,
        value_parser = clap::value_parser!(u8).range(1..=20),
        help = "Redirect hops followed before giving up"
    )]
    pub(crate) max_redirects: Option<u8>,
}

#[derive(Args)]
pub(crate) struct HashArgs {
    #[arg(help = "Magnet locator or path to a .torrent file")]
    pub(crate) source: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Resolve(_) => "resolve",
        Command::Hash(_) => "hash",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_resolve_with_all_flags() {
        let cli = Cli::try_parse_from([
            "lodestar",
            "resolve",
            "--title",
            "Show.S01E01",
            "--url",
            "http://indexer.example/t/1",
            "--magnet",
            "magnet:?xt=urn:btih:abcd",
            "--torrent-folder",
            "/watch",
            "--prefer-torrent-file",
            "--max-redirects",
            "3",
            "--output",
            "json",
        ])
        .expect("parses");

        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Command::Resolve(args) => {
                assert_eq!(args.title, "Show.S01E01");
                assert_eq!(args.url.as_deref(), Some("http://indexer.example/t/1"));
                assert_eq!(args.magnet.as_deref(), Some("magnet:?xt=urn:btih:abcd"));
                assert_eq!(args.torrent_folder, Some(PathBuf::from("/watch")));
                assert!(args.prefer_torrent_file);
                assert!(!args.save_magnet_files);
                assert_eq!(args.max_redirects, Some(3));
            }
            Command::Hash(_) => panic!("expected resolve"),
        }
    }

    #[test]
    fn rejects_out_of_range_redirect_budget() {
        let result = Cli::try_parse_from([
            "lodestar",
            "resolve",
            "--title",
            "Show",
            "--max-redirects",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn command_label_matches_variants() {
        assert_eq!(
            command_label(&Command::Hash(HashArgs {
                source: "magnet:?xt=urn:btih:abcd".into(),
            })),
            "hash"
        );
        assert_eq!(
            command_label(&Command::Resolve(ResolveArgs::default())),
            "resolve"
        );
    }

    #[test]
    fn invalid_field_messages_name_the_field() {
        let message = config_message(&ConfigError::InvalidField {
            section: "fetch",
            field: "max_redirects",
            value: Some("50".into()),
            reason: "must be between 1 and 20",
        });
        assert_eq!(
            message,
            "invalid configuration: fetch.max_redirects=50 must be between 1 and 20"
        );
    }

    #[test]
    fn configured_log_format_wins_over_build_default() {
        let mut settings = LoggingSettings::default();
        assert_eq!(log_format(&settings), LogFormat::infer());

        settings.format = Some(LogFormatSetting::Json);
        assert_eq!(log_format(&settings), LogFormat::Json);
        settings.format = Some(LogFormatSetting::Pretty);
        assert_eq!(log_format(&settings), LogFormat::Pretty);
    }

    #[tokio::test]
    async fn hash_command_exits_zero_for_valid_magnet() {
        let cli = Cli::try_parse_from(["lodestar", "hash", "magnet:?xt=urn:btih:abcdef"])
            .expect("parses");
        assert_eq!(execute(cli).await, 0);
    }

    #[tokio::test]
    async fn missing_config_file_is_a_failure() {
        let cli = Cli::try_parse_from([
            "lodestar",
            "--config",
            "/definitely/missing/lodestar.json",
            "hash",
            "magnet:?xt=urn:btih:abcdef",
        ])
        .expect("parses");
        assert_eq!(execute(cli).await, 3);
    }
}
