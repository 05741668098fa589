//! printhook - relay webhook.site messages to a thermal printer
//!
//! Polls the request log of a webhook.site token and prints the `message`
//! field of every new JSON POST exactly once across restarts.

mod commands;

use clap::{Parser, Subcommand};
use commands::{RunCommand, WatermarkCommand};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "PRINTHOOK_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log format: compact, full
    #[arg(
        long,
        default_value = "compact",
        env = "PRINTHOOK_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    /// Verbose per-event logging; same as --log-level debug
    #[arg(long, env = "PRINTHOOK_DEBUG", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the request log and print new messages
    Run(RunCommand),
    /// Inspect or edit the persisted watermark
    Watermark(WatermarkCommand),
}

fn build_filter(log_level: &str) -> anyhow::Result<tracing_subscriber::EnvFilter> {
    // RUST_LOG gives full control when set
    if std::env::var("RUST_LOG").is_ok() {
        return tracing_subscriber::EnvFilter::try_from_default_env()
            .map_err(|e| anyhow::anyhow!("Invalid RUST_LOG environment variable: {}", e));
    }

    tracing_subscriber::EnvFilter::try_new(format!(
        "printhook={level},\
         printhook_cli={level},\
         printhook_core={level},\
         printhook_relay={level},\
         h2=warn,\
         hyper=warn,\
         hyper_util=warn,\
         reqwest=warn,\
         rustls=warn",
        level = log_level
    ))
    .map_err(|e| anyhow::anyhow!("Invalid log level {:?}: {}", log_level, e))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug".to_string()
    } else {
        cli.log_level.clone()
    };
    let filter = build_filter(&log_level)?;

    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer() // "compact" or any other value
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global default subscriber: {}", e))?;

    match cli.command {
        Commands::Run(run_cmd) => run_cmd.execute(),
        Commands::Watermark(watermark_cmd) => watermark_cmd.execute(),
    }
}
