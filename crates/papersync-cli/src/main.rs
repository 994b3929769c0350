use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use papersync_core::{AppConfig, FieldReconciler, SyncError, SyncReport, SyncRunner};
use papersync_sources::{NotionClient, SemanticScholarSource};

mod settings;

use settings::{RunSettings, overlay_flags, write_config};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "papersync",
    about = "Fill missing paper metadata in a Notion database from Semantic Scholar",
    version,
    long_about = None
)]
struct Cli {
    /// Notion database to walk.
    #[arg(long, env = "NOTION_DATABASE_ID")]
    database_id: Option<String>,

    /// Notion integration token.
    #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
    notion_token: Option<String>,

    /// Decide every update and log it, but write nothing.
    #[arg(long)]
    dry_run: bool,

    /// Log verbosity; RUST_LOG takes precedence when set.
    #[arg(long, value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Config file (default: ~/.config/papersync/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the resolved configuration to the config path and exit.
    #[arg(long)]
    write_config: bool,

    /// Output the run report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let mut config = AppConfig::load_from(&config_path)?;

    if cli.write_config {
        write_config(&config, cli.database_id.clone(), &config_path)?;
        println!("Wrote {}", config_path.display());
        return Ok(());
    }

    overlay_flags(&mut config, cli.database_id.clone(), cli.notion_token.clone());

    let settings = match RunSettings::resolve(config, cli.dry_run) {
        Ok(settings) => settings,
        Err(SyncError::ValidationError(msg)) => {
            Cli::command().error(ErrorKind::MissingRequiredArgument, msg).exit()
        }
        Err(err) => Cli::command().error(ErrorKind::InvalidValue, err.to_string()).exit(),
    };

    match run(&settings).await {
        Ok(report) => {
            let dur = start.elapsed().as_millis() as u64;
            if cli.json {
                print_json(&ok_envelope(&report, dur))?;
            } else {
                print_summary(&report);
            }
            Ok(())
        }
        Err(err) => {
            let dur = start.elapsed().as_millis() as u64;
            if cli.json {
                print_json(&error_envelope(&err, dur))?;
            } else {
                eprintln!("error: {err}");
            }
            std::process::exit(err.exit_code() as i32);
        }
    }
}

async fn run(settings: &RunSettings) -> papersync_core::Result<SyncReport> {
    let notion = NotionClient::new(&settings.credentials, &settings.config.notion)?;
    let scholar = SemanticScholarSource::new(&settings.config.semantic_scholar)?;
    let reconciler = FieldReconciler::new(settings.config.properties.clone());

    info!(
        database = %settings.credentials.database_id,
        dry_run = settings.dry_run,
        "scanning Notion database"
    );

    SyncRunner::new(reconciler, &notion, &notion, &scholar)
        .dry_run(settings.dry_run)
        .run()
        .await
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},hyper=warn,reqwest=warn", level.as_str()))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn ok_envelope(report: &SyncReport, duration_ms: u64) -> serde_json::Value {
    serde_json::json!({"status":"ok","data":report,"meta":{"duration_ms":duration_ms}})
}

fn error_envelope(err: &SyncError, duration_ms: u64) -> serde_json::Value {
    serde_json::json!({
        "status":"error",
        "error":error_kind(err),
        "message":err.to_string(),
        "meta":{"duration_ms":duration_ms}
    })
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn print_summary(report: &SyncReport) {
    if report.dry_run {
        println!("Dry run: {} pages would be updated", report.changed());
        for planned in &report.planned {
            println!("  {}: {}", planned.title, planned.fields.join(", "));
        }
    } else {
        println!("Updated {} pages", report.updated);
    }
    println!(
        "  scanned {} records on {} pages ({} complete, {} not found, {} untitled, {} with nothing usable)",
        report.records_seen,
        report.pages_scanned,
        report.complete,
        report.not_found,
        report.untitled,
        report.nothing_usable
    );
}

fn error_kind(err: &SyncError) -> &'static str {
    match err {
        SyncError::ConfigError(_) | SyncError::TomlParse(_) | SyncError::TomlSerialize(_) => "config",
        SyncError::ValidationError(_) => "invalid_args",
        SyncError::Http { .. } | SyncError::Transport(..) => "network",
        SyncError::Parse(_) | SyncError::Json(_) => "parse",
        SyncError::Io(_) => "io",
    }
}
