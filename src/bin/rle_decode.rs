//! rle_decode binary - replays a raw RLE capture dump into a JSON trace
//!
//! Usage:
//!   cargo run --bin rle_decode -- --config config.toml --input capture.bin
//!   cargo run --bin rle_decode -- -f config.toml -i capture.bin -o trace.json

use std::io::BufReader;
use std::path::PathBuf;

use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sump_rs::capture::CaptureSession;
use sump_rs::config::Config;

/// Decode a raw RLE capture dump into a JSON trace
#[derive(Parser, Debug)]
#[command(name = "rle_decode")]
struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long = "config", default_value = "config.toml")]
    config_file: String,

    /// Raw capture dump to decode
    #[arg(short, long)]
    input: PathBuf,

    /// Output path for the JSON trace (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sump_rs=info".parse()?))
        .init();

    let args = Args::parse();

    let config = Config::load(&args.config_file)?;
    let session = CaptureSession::new(&config.capture)?;
    let metrics = session.metrics();

    // Ctrl+C cancels the capture cooperatively between words
    let cancel = session.cancel_handle();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, cancelling capture");
            cancel.cancel();
        }
    });

    let file = std::fs::File::open(&args.input)?;
    let trace = session.run(BufReader::new(file)).await?;

    info!(
        transitions = trace.len(),
        bytes = metrics.bytes_read.load(std::sync::atomic::Ordering::Relaxed),
        "decode finished"
    );

    let json = serde_json::to_string_pretty(&trace)?;
    match args.output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
