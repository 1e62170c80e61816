//! MIDI input via midir

use std::sync::Arc;

use anyhow::{anyhow, bail};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort};
use tracing::info;
use vfo_synth::MidiAdapter;

use crate::settings::MidiSettings;

const CLIENT_NAME: &str = "midivfo";

/// Names of all MIDI input ports, in index order
pub fn list_ports() -> anyhow::Result<Vec<String>> {
    let midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| anyhow!("MIDI init failed: {}", e))?;
    midi_in
        .ports()
        .iter()
        .map(|p| {
            midi_in
                .port_name(p)
                .map_err(|e| anyhow!("Failed to read MIDI port name: {}", e))
        })
        .collect()
}

/// Choose a port by name substring, else by index
fn select_port(names: &[String], settings: &MidiSettings) -> anyhow::Result<usize> {
    if names.is_empty() {
        bail!("No MIDI input ports found");
    }

    if let Some(wanted) = &settings.port_name {
        return names
            .iter()
            .position(|n| n.contains(wanted.as_str()))
            .ok_or_else(|| anyhow!("No MIDI input port matching '{}'", wanted));
    }

    if settings.port_index >= names.len() {
        bail!(
            "MIDI port index {} out of range ({} ports)",
            settings.port_index,
            names.len()
        );
    }
    Ok(settings.port_index)
}

/// Open the configured MIDI input and feed every message to `adapter`
///
/// The connection stays open until the returned handle is dropped.
pub fn connect(
    settings: &MidiSettings,
    adapter: Arc<MidiAdapter>,
) -> anyhow::Result<MidiInputConnection<()>> {
    let mut midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| anyhow!("MIDI init failed: {}", e))?;
    midi_in.ignore(Ignore::All);

    let ports: Vec<MidiInputPort> = midi_in.ports();
    let names = ports
        .iter()
        .map(|p| midi_in.port_name(p).unwrap_or_else(|_| "<unknown>".to_string()))
        .collect::<Vec<_>>();
    let index = select_port(&names, settings)?;

    info!("Opening MIDI input {}: {}", index, names[index]);
    midi_in
        .connect(
            &ports[index],
            "midivfo-in",
            move |_stamp, message, _| {
                adapter.handle_message(message);
            },
            (),
        )
        .map_err(|e| anyhow!("Failed to open MIDI input '{}': {}", names[index], e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec![
            "Midi Through:Midi Through Port-0 14:0".to_string(),
            "Keystation 49 MK3:Keystation 49 MK3 MIDI 1 20:0".to_string(),
        ]
    }

    #[test]
    fn test_select_by_index() {
        let settings = MidiSettings {
            port_index: 1,
            port_name: None,
        };
        assert_eq!(select_port(&names(), &settings).unwrap(), 1);
    }

    #[test]
    fn test_select_by_name_wins() {
        let settings = MidiSettings {
            port_index: 0,
            port_name: Some("Keystation".to_string()),
        };
        assert_eq!(select_port(&names(), &settings).unwrap(), 1);
    }

    #[test]
    fn test_select_errors() {
        let settings = MidiSettings {
            port_index: 5,
            port_name: None,
        };
        assert!(select_port(&names(), &settings).is_err());
        assert!(select_port(&[], &MidiSettings::default()).is_err());

        let settings = MidiSettings {
            port_index: 0,
            port_name: Some("Launchpad".to_string()),
        };
        assert!(select_port(&names(), &settings).is_err());
    }
}
