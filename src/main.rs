use anyhow::{Context, Result};
use clap::Parser;
use serial_expect::{Config, Mode, execute, logging};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "serial-expect",
    about = "Run expect-style scripts against a device on a serial line",
    version
)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Disable timestamps in log output
    #[arg(long)]
    no_timestamp: bool,

    /// Replay against a captured transcript instead of opening the device
    #[arg(long, value_name = "TRANSCRIPT")]
    dry_run: Option<PathBuf>,

    /// Scripts and try-blocks to run, in order (default: the first script)
    names: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(!args.no_timestamp);

    let config = Config::from_path(&args.config)
        .with_context(|| format!("Failed to load config file: {}", args.config.display()))?;

    let mode = match args.dry_run {
        Some(path) => Mode::DryRun(path),
        None => Mode::Live,
    };

    execute(&config, &args.names, mode)
        .await
        .context("Failed to execute script")?;

    Ok(())
}
