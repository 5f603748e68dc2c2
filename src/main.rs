mod config;
mod error;
mod export;
mod normalize;
mod payload;
mod qr;
mod report;
mod transport;
mod uri;
mod wire;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::export::{collect_batch, preview};
use crate::payload::EnumPolicy;
use crate::report::{render_html, write_report};

#[derive(Parser, Debug)]
#[command(
    name = "otpmigrate",
    version,
    about = "Decode Google Authenticator export QR codes into otpauth:// URIs"
)]
struct Cli {
    /// Migration URIs like otpauth-migration://offline?data=...
    uris: Vec<String>,

    /// Read more URIs from a file, one per line (# starts a comment)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Report filename (default: otp_accounts.html)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print accounts as JSON instead of writing the HTML report
    #[arg(long)]
    json: bool,

    /// Treat unknown algorithm/digits/type values as unspecified
    #[arg(long)]
    lenient: bool,

    /// Config file (default: <config dir>/otpmigrate/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(output) = cli.output.clone() {
        config.output = output;
    }
    config.lenient_enums |= cli.lenient;

    let mut uris = cli.uris.clone();
    if let Some(ref path) = cli.file {
        uris.extend(read_uri_file(path)?);
    }

    if uris.is_empty() {
        Cli::command().print_help()?;
        return Ok(ExitCode::from(1));
    }

    cmd_export(&uris, &config, cli.json)?;
    Ok(ExitCode::SUCCESS)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// What an export run produced.
#[derive(Debug, PartialEq, Eq)]
enum Exported {
    NoAccounts,
    Json(String),
    Report { path: PathBuf, accounts: usize },
}

fn cmd_export(uris: &[String], config: &Config, json: bool) -> anyhow::Result<()> {
    match run_export(uris, config, json)? {
        Exported::NoAccounts => println!("no accounts found"),
        Exported::Json(s) => println!("{s}"),
        Exported::Report { path, accounts } => {
            println!("Wrote {accounts} account(s) to {}", path.display())
        }
    }
    Ok(())
}

/// Decode the batch, log the URIs that failed, then either serialize the
/// accounts as JSON or write the HTML report to `config.output`. Nothing is
/// written when no account survives.
fn run_export(uris: &[String], config: &Config, json: bool) -> anyhow::Result<Exported> {
    let policy = if config.lenient_enums {
        EnumPolicy::Lenient
    } else {
        EnumPolicy::Strict
    };

    let outcome = collect_batch(uris, policy);
    for failure in &outcome.failures {
        warn!(
            kind = failure.error.kind(),
            "URI #{} ({}) skipped: {}",
            failure.position,
            preview(&failure.uri),
            failure.error
        );
    }
    if !outcome.failures.is_empty() {
        info!(
            "{} of {} URI(s) could not be decoded",
            outcome.failures.len(),
            uris.len()
        );
    }

    if outcome.records.is_empty() {
        return Ok(Exported::NoAccounts);
    }

    if json {
        let s = serde_json::to_string_pretty(&outcome.records)?;
        return Ok(Exported::Json(s));
    }

    let now = OffsetDateTime::now_utc().format(&Rfc3339)?;
    let html = render_html(&outcome.records, &now, config.qr_module_px)?;
    write_report(&config.output, &html)?;

    Ok(Exported::Report {
        path: config.output.clone(),
        accounts: outcome.records.len(),
    })
}

fn read_uri_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read URI file {}", path.display()))?;
    Ok(parse_uri_lines(&data))
}

fn parse_uri_lines(data: &str) -> Vec<String> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
