use clap::{Args, Subcommand};
use colored::Colorize;
use printhook_core::{format_watermark, parse_start_time, WatermarkStore, DEFAULT_TIMESTAMP_FILE};
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct WatermarkCommand {
    /// File holding the last processed timestamp
    #[arg(
        long,
        default_value = DEFAULT_TIMESTAMP_FILE,
        env = "PRINTHOOK_TIMESTAMP_FILE",
        global = true
    )]
    timestamp_file: PathBuf,

    #[command(subcommand)]
    command: WatermarkCommands,
}

#[derive(Subcommand)]
enum WatermarkCommands {
    /// Show the stored watermark
    Show,
    /// Overwrite the stored watermark
    Set(SetWatermarkArgs),
    /// Delete the stored watermark so the next run starts from the lookback window
    Clear,
}

#[derive(Args)]
struct SetWatermarkArgs {
    /// New watermark, e.g. 2024-06-01T12:00:00Z or "2024-06-01 12:00:00"
    time: String,
}

impl WatermarkCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let store = WatermarkStore::new(&self.timestamp_file);
        match self.command {
            WatermarkCommands::Show => Self::execute_show(&store),
            WatermarkCommands::Set(args) => Self::execute_set(&store, args),
            WatermarkCommands::Clear => Self::execute_clear(&store),
        }
    }

    fn execute_show(store: &WatermarkStore) -> anyhow::Result<()> {
        match store.load() {
            Some(watermark) => println!(
                "{} {}",
                "Last processed:".bright_white().bold(),
                format_watermark(watermark).bright_cyan()
            ),
            None => println!(
                "{} {}",
                "No watermark stored at".bright_yellow(),
                store.path().display()
            ),
        }
        Ok(())
    }

    fn execute_set(store: &WatermarkStore, args: SetWatermarkArgs) -> anyhow::Result<()> {
        let watermark = parse_start_time(&args.time)?;
        store.save(watermark)?;
        info!(
            "Watermark at {} set to {}",
            store.path().display(),
            format_watermark(watermark)
        );
        println!(
            "{} {}",
            "✅ Watermark set to".bright_green(),
            format_watermark(watermark).bright_cyan()
        );
        Ok(())
    }

    fn execute_clear(store: &WatermarkStore) -> anyhow::Result<()> {
        if store.clear()? {
            info!("Removed watermark record {}", store.path().display());
            println!("{}", "✅ Watermark cleared".bright_green());
        } else {
            println!(
                "{} {}",
                "No watermark stored at".bright_yellow(),
                store.path().display()
            );
        }
        Ok(())
    }
}
