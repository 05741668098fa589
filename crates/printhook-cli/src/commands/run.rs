use chrono::Utc;
use clap::Args;
use printhook_core::{
    format_watermark, resolve_start, RelayConfig, WatermarkStore, DEFAULT_API_BASE,
    DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_MAX_LENGTH, DEFAULT_PRINT_TIMEOUT_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TIMESTAMP_FILE,
};
use printhook_relay::{
    Binarization, CommandPrintSink, EngineSettings, LogPrintSink, PollEngine, PrintSink,
    RenderOptions, WebhookSiteClient,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Args)]
pub struct RunCommand {
    /// Capture URL, e.g. https://webhook.site/<token>
    #[arg(long, env = "PRINTHOOK_WEBHOOK_URL")]
    pub webhook_url: String,

    /// Base URL of the request-log API
    #[arg(long, default_value = DEFAULT_API_BASE, env = "PRINTHOOK_API_BASE")]
    pub api_base: String,

    /// API key for private tokens
    #[arg(long, env = "PRINTHOOK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Seconds between polls
    #[arg(long, default_value_t = DEFAULT_CHECK_INTERVAL_SECS, env = "PRINTHOOK_CHECK_INTERVAL")]
    pub check_interval: u64,

    /// File holding the last processed timestamp
    #[arg(long, default_value = DEFAULT_TIMESTAMP_FILE, env = "PRINTHOOK_TIMESTAMP_FILE")]
    pub timestamp_file: PathBuf,

    /// Ignore the stored timestamp and start after this instant
    #[arg(long, env = "PRINTHOOK_START_FROM")]
    pub start_from: Option<String>,

    /// Maximum printed message length in characters
    #[arg(long, default_value_t = DEFAULT_MAX_LENGTH, env = "PRINTHOOK_MAX_LENGTH")]
    pub max_length: usize,

    /// Print messages in full
    #[arg(long, env = "PRINTHOOK_NO_TRUNCATE")]
    pub no_truncate: bool,

    /// Render-and-print program
    #[arg(long, default_value = "print-text.py", env = "PRINTHOOK_PRINT_COMMAND")]
    pub print_command: PathBuf,

    /// Extra arguments for the print program, whitespace separated
    #[arg(long, env = "PRINTHOOK_PRINT_ARGS", allow_hyphen_values = true)]
    pub print_args: Option<String>,

    /// Font size in points
    #[arg(long, env = "PRINTHOOK_FONT_SIZE")]
    pub font_size: Option<u32>,

    /// Rendered image width in pixels
    #[arg(long, env = "PRINTHOOK_IMAGE_WIDTH")]
    pub image_width: Option<u32>,

    /// Padding around the text in pixels
    #[arg(long, env = "PRINTHOOK_PADDING")]
    pub padding: Option<u32>,

    /// Binarization algorithm: mean-threshold, floyd-steinberg, atkinson, halftone, none
    #[arg(long, env = "PRINTHOOK_BINARIZATION", value_parser = parse_binarization)]
    pub binarization: Option<Binarization>,

    /// Thermal energy, e.g. 0xffff
    #[arg(long, env = "PRINTHOOK_ENERGY")]
    pub energy: Option<String>,

    /// Printer BLE address or name
    #[arg(long, env = "PRINTHOOK_DEVICE")]
    pub device: Option<String>,

    /// Seconds before a print call is abandoned
    #[arg(long, default_value_t = DEFAULT_PRINT_TIMEOUT_SECS, env = "PRINTHOOK_PRINT_TIMEOUT")]
    pub print_timeout: u64,

    /// Seconds before an upstream fetch is abandoned
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, env = "PRINTHOOK_REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    /// Log messages instead of printing them
    #[arg(long, env = "PRINTHOOK_DRY_RUN")]
    pub dry_run: bool,
}

fn parse_binarization(s: &str) -> Result<Binarization, String> {
    Binarization::from_str(s).ok_or_else(|| {
        format!(
            "unknown binarization '{}', expected one of: mean-threshold, floyd-steinberg, atkinson, halftone, none",
            s
        )
    })
}

impl RunCommand {
    fn relay_config(&self) -> anyhow::Result<RelayConfig> {
        let config = RelayConfig::with_api_base(&self.webhook_url, &self.api_base)?
            .with_api_key(self.api_key.clone())
            .with_check_interval(Duration::from_secs(self.check_interval))?
            .with_print_timeout(Duration::from_secs(self.print_timeout))?
            .with_request_timeout(Duration::from_secs(self.request_timeout))?
            .with_timestamp_file(&self.timestamp_file)
            .with_truncation(self.max_length, self.no_truncate)
            .with_start_from(self.start_from.as_deref())?;
        Ok(config)
    }

    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            font_size: self.font_size,
            width: self.image_width,
            padding: self.padding,
            binarization: self.binarization,
            energy: self.energy.clone(),
            device: self.device.clone(),
            extra_args: Vec::new(),
        }
        .with_extra_args(self.print_args.as_deref().unwrap_or_default())
    }

    fn sink(&self) -> Arc<dyn PrintSink> {
        if self.dry_run {
            Arc::new(LogPrintSink::new())
        } else {
            Arc::new(CommandPrintSink::new(&self.print_command))
        }
    }

    pub fn execute(self) -> anyhow::Result<()> {
        let config = self.relay_config()?;
        let render_options = self.render_options();
        let sink = self.sink();
        let source = Arc::new(WebhookSiteClient::new(&config)?);
        let store = WatermarkStore::new(&config.timestamp_file);

        info!("Starting webhook printer relay");
        info!("Webhook URL: {}", config.webhook_url);
        info!("Token: {}", config.token);
        info!("Check interval: {}s", config.check_interval.as_secs());
        info!("Timestamp file: {}", store.path().display());
        if config.max_length == 0 {
            info!("Message truncation disabled");
        } else {
            info!("Max message length: {} characters", config.max_length);
        }
        if self.dry_run {
            warn!("Dry run: messages will be logged, not printed");
        } else {
            info!("Print command: {}", self.print_command.display());
        }
        debug!("Render options: {:?}", render_options.to_args());

        let (start, origin) = resolve_start(config.start_from, store.load(), Utc::now());
        info!("Starting from {} ({})", format_watermark(start), origin);

        let settings = EngineSettings::from_config(&config, render_options);
        let engine = PollEngine::new(source, sink, store, settings);

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async move {
            let shutdown = CancellationToken::new();
            tokio::spawn(wait_for_shutdown(shutdown.clone()));

            let last = engine.run(start, shutdown).await;
            info!("Stopped; last processed {}", format_watermark(last));
        });

        Ok(())
    }
}

/// Cancel `shutdown` on Ctrl+C, or SIGTERM on unix.
async fn wait_for_shutdown(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
    shutdown.cancel();
}
