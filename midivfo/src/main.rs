//! midivfo
//!
//! Plays a MIDI keyboard on one or more amateur radio transceivers. Each
//! voice is a VFO tuned just below a carrier, so a receiver in USB hears the
//! difference as an audio tone.

mod cli;
mod midi_input;
mod rigs;
mod settings;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vfo_synth::{spawn_allocator, AllocatorHandle, ToneSlotAllocator};

use cli::Cli;
use rigs::Rigs;
use settings::Settings;

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    // Include all our crates in the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "midivfo={level},vfo_protocol={level},vfo_link={level},vfo_synth={level},vfo_sim={level}"
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn print_midi_ports() -> anyhow::Result<()> {
    let ports = midi_input::list_ports()?;
    if ports.is_empty() {
        println!("No MIDI input ports found");
    }
    for (index, name) in ports.iter().enumerate() {
        println!("{}: {}", index, name);
    }
    Ok(())
}

fn print_serial_ports() -> anyhow::Result<()> {
    let ports = serialport::available_ports().context("Failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        match port.port_type {
            serialport::SerialPortType::UsbPort(usb) => println!(
                "{} - {} ({:04x}:{:04x})",
                port.port_name,
                usb.product.as_deref().unwrap_or("Unknown"),
                usb.vid,
                usb.pid
            ),
            _ => println!("{}", port.port_name),
        }
    }
    Ok(())
}

/// Play until Ctrl-C, then stop the allocator and report
async fn play(settings: &Settings, handle: AllocatorHandle) -> anyhow::Result<()> {
    let adapter = Arc::new(handle.adapter().with_channel_filter(settings.synth.midi_channel)?);

    let connection = match midi_input::connect(&settings.midi, adapter) {
        Ok(connection) => connection,
        Err(e) => {
            if let Err(join) = handle.shutdown().await {
                warn!("Allocator task failed: {}", join);
            }
            return Err(e);
        }
    };

    info!(
        "Playing {} voice(s), press Ctrl-C to stop",
        settings.voices.len()
    );
    let signal = tokio::signal::ctrl_c().await;

    info!("Shutting down");
    connection.close();

    let dropped = handle.dropped();
    let allocator = handle.shutdown().await.context("Allocator task failed")?;
    info!(
        "Stopped {} voice(s), {} event(s) dropped on a full queue",
        allocator.voice_count(),
        dropped
    );

    signal.context("Failed to wait for Ctrl-C")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.list_midi {
        return print_midi_ports();
    }
    if cli.list_ports {
        return print_serial_ports();
    }

    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.apply_cli(&cli);
    settings.validate().context("Invalid settings")?;

    if cli.write_config {
        let path = cli
            .config
            .clone()
            .or_else(Settings::default_path)
            .context("Could not determine settings path")?;
        settings.save_to(&path)?;
        info!("Wrote settings to {}", path.display());
        return Ok(());
    }

    info!("Starting midivfo");

    let rigs = Rigs::connect_all(&settings.rigs).await?;
    let bindings = rigs.bind_voices(&settings.voices)?;
    let allocator = ToneSlotAllocator::new(bindings, settings.synth.off_tone_delta_hz)?;
    let handle = spawn_allocator(allocator, settings.synth.queue_capacity);

    let result = play(&settings, handle).await;
    rigs.close().await;
    result
}
