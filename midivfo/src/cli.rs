//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "midivfo",
    version,
    about = "Play MIDI on amateur radio transceivers by retuning their VFOs"
)]
pub struct Cli {
    /// Settings file (defaults to the per-user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Carrier frequency in Hz for every voice
    #[arg(long, value_name = "HZ")]
    pub cw: Option<u64>,

    /// MIDI input port index
    #[arg(long, value_name = "INDEX")]
    pub midi: Option<usize>,

    /// Pick the first MIDI input port whose name contains this text
    #[arg(long, value_name = "TEXT")]
    pub midi_name: Option<String>,

    /// Offset above the carrier used to silence a voice, in Hz
    #[arg(long, value_name = "HZ")]
    pub off_delta: Option<u64>,

    /// List MIDI input ports and exit
    #[arg(long)]
    pub list_midi: bool,

    /// List serial ports and exit
    #[arg(long)]
    pub list_ports: bool,

    /// Save the effective settings and exit
    #[arg(long)]
    pub write_config: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}
