mod commands;

use anyhow::Result;
use clap::Parser;

/// Stream microphone volume frames as JSON lines.
#[derive(Parser, Debug)]
#[command(name = "mic-monitor")]
#[command(
    about = "Capture the microphone and print host-bridge messages, one JSON object per line"
)]
pub struct Args {
    /// Requested sample rate in Hz; 0 or negative uses 16000
    #[arg(long, default_value = "16000", allow_negative_numbers = true)]
    pub sample_rate: i64,

    /// Label echoed back as "type" on every frame
    #[arg(long, default_value = "")]
    pub label: String,

    /// Input device name (see --list-devices); defaults to the system default
    #[arg(long)]
    pub device: Option<String>,

    /// Seconds to record before stopping
    #[arg(long, default_value = "10")]
    pub seconds: u64,

    /// Print the available input devices and exit
    #[arg(long)]
    pub list_devices: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_devices {
        commands::list_devices()
    } else {
        commands::record(&args)
    }
}
