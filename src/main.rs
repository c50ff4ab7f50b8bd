use clap::{Parser, builder::styling};
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use rowpipe::cli::{exit_code, load_transfer_config, run_transfer};
use rowpipe::rows::TableName;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// rowpipe: stream a MySQL table into PostgreSQL, one row at a time
#[derive(Parser)]
#[command(name = "rowpipe", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source connection settings from
    #[arg(short, long, default_value = ".env")]
    env: String,

    /// YAML transfer config; when given, connection variables in the environment are ignored
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source table to read (overrides config)
    #[arg(long)]
    source_table: Option<String>,

    /// Target table to insert into (overrides config)
    #[arg(long)]
    target_table: Option<String>,

    /// Deadline in seconds for each row fetch and each insert
    #[arg(long)]
    timeout: Option<u64>,

    /// More verbose logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = dotenvy::from_filename(&cli.env) {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    let mut config = load_transfer_config(cli.config.as_deref())?;
    if let Some(table) = cli.source_table {
        config.source_table = TableName::parse(table).context("Invalid --source-table")?;
    }
    if let Some(table) = cli.target_table {
        config.target_table = TableName::parse(table).context("Invalid --target-table")?;
    }
    if let Some(secs) = cli.timeout {
        config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    log::info!("Source: {}", config.source.bright_black());
    log::info!("Target: {}", config.target.bright_black());

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, finishing current row and closing connections");
            interrupt.cancel();
        }
    });

    let outcome = run_transfer(&config, cancel).await;
    if let Ok(result) = &outcome {
        println!("{}", result);
    }

    std::process::exit(exit_code(&outcome));
}
