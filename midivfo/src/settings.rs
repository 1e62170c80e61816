//! Application settings

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use vfo_link::{RigctlConfig, DEFAULT_BAUD_RATE};
use vfo_protocol::civ::DEFAULT_RADIO_ADDR;
use vfo_protocol::{Vfo, MAX_FREQUENCY_HZ};
use vfo_synth::SynthConfig;

use crate::cli::Cli;

/// Carrier the default voice beats against
pub const DEFAULT_CARRIER_HZ: u64 = 14_067_000;

/// A radio reached directly over CI-V
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CivRigSettings {
    /// Name voices refer to
    pub name: String,
    /// Serial port path
    pub port: String,
    /// Baud rate
    #[serde(default = "default_baud")]
    pub baud_rate: u32,
    /// CI-V address of the radio
    #[serde(default = "default_civ_address")]
    pub address: u8,
    /// Delay after each frame in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

/// A radio reached through a rigctld daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RigctlRigSettings {
    /// Name voices refer to
    pub name: String,
    /// Daemon host
    #[serde(default = "default_rigctl_host")]
    pub host: String,
    /// Daemon TCP port
    #[serde(default = "default_rigctl_port")]
    pub port: u16,
    /// How long to keep trying to connect in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// How long to wait for a reply in milliseconds
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    /// Query the rig after connecting and fail if it does not answer
    #[serde(default = "default_true")]
    pub validate_on_connect: bool,
}

impl RigctlRigSettings {
    pub fn client_config(&self) -> RigctlConfig {
        RigctlConfig {
            host: self.host.clone(),
            port: self.port,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            response_timeout: Duration::from_millis(self.response_timeout_ms),
            validate_on_connect: self.validate_on_connect,
        }
    }
}

/// One configured rig
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RigSettings {
    Civ(CivRigSettings),
    Rigctl(RigctlRigSettings),
}

impl RigSettings {
    pub fn name(&self) -> &str {
        match self {
            RigSettings::Civ(civ) => &civ.name,
            RigSettings::Rigctl(rigctl) => &rigctl.name,
        }
    }
}

/// One voice: a VFO on a rig and the carrier it beats against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceSettings {
    /// Name of the rig
    pub rig: String,
    /// VFO to drive (ignored for rigctld rigs)
    #[serde(default)]
    pub vfo: Vfo,
    /// Carrier frequency in Hz
    #[serde(default = "default_carrier_hz")]
    pub carrier_hz: u64,
}

/// MIDI input selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MidiSettings {
    /// Input port index
    pub port_index: usize,
    /// Name substring; takes precedence over the index when set
    pub port_name: Option<String>,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub rigs: Vec<RigSettings>,
    pub voices: Vec<VoiceSettings>,
    pub synth: SynthConfig,
    pub midi: MidiSettings,
}

fn default_baud() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_civ_address() -> u8 {
    DEFAULT_RADIO_ADDR
}

fn default_settle_ms() -> u64 {
    10
}

fn default_rigctl_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rigctl_port() -> u16 {
    vfo_link::rigctl::DEFAULT_PORT
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_response_timeout_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_carrier_hz() -> u64 {
    DEFAULT_CARRIER_HZ
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rigs: vec![RigSettings::Rigctl(RigctlRigSettings {
                name: "rigctld".to_string(),
                host: default_rigctl_host(),
                port: default_rigctl_port(),
                connect_timeout_ms: default_connect_timeout_ms(),
                response_timeout_ms: default_response_timeout_ms(),
                validate_on_connect: true,
            })],
            voices: vec![VoiceSettings {
                rig: "rigctld".to_string(),
                vfo: Vfo::A,
                carrier_hz: DEFAULT_CARRIER_HZ,
            }],
            synth: SynthConfig::default(),
            midi: MidiSettings::default(),
        }
    }
}

impl Settings {
    /// Get the XDG config directory for midivfo
    /// Uses $XDG_CONFIG_HOME/midivfo, falls back to ~/.config/midivfo
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("midivfo"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("midivfo"))
    }

    /// Default settings file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings
    ///
    /// An explicit `path` must exist. Without one the default path is tried
    /// and built-in defaults are used if there is no file there.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    /// Save settings to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        Ok(())
    }

    /// Apply command-line overrides
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(carrier_hz) = cli.cw {
            for voice in &mut self.voices {
                voice.carrier_hz = carrier_hz;
            }
        }
        if let Some(index) = cli.midi {
            self.midi.port_index = index;
            self.midi.port_name = None;
        }
        if let Some(name) = &cli.midi_name {
            self.midi.port_name = Some(name.clone());
        }
        if let Some(delta) = cli.off_delta {
            self.synth.off_tone_delta_hz = delta;
        }
    }

    /// Check that the settings describe something playable
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.voices.is_empty() {
            bail!("No voices configured");
        }

        let mut rigs = HashMap::new();
        for rig in &self.rigs {
            if rigs.insert(rig.name(), rig).is_some() {
                bail!("Duplicate rig name '{}'", rig.name());
            }
        }

        // One oscillator can only sound one pitch
        let mut civ_vfos: HashMap<(&str, Vfo), usize> = HashMap::new();
        for (index, voice) in self.voices.iter().enumerate() {
            let Some(rig) = rigs.get(voice.rig.as_str()) else {
                bail!("Voice {} refers to unknown rig '{}'", index, voice.rig);
            };

            if matches!(rig, RigSettings::Civ(_)) {
                if let Some(other) = civ_vfos.insert((voice.rig.as_str(), voice.vfo), index) {
                    bail!(
                        "Voices {} and {} both drive VFO {} of rig '{}'",
                        other,
                        index,
                        voice.vfo.name(),
                        voice.rig
                    );
                }
            }

            match voice.carrier_hz.checked_add(self.synth.off_tone_delta_hz) {
                Some(off_hz) if off_hz <= MAX_FREQUENCY_HZ => {}
                _ => bail!(
                    "Voice {} parks above {} Hz (carrier {} Hz + off-tone delta {} Hz)",
                    index,
                    MAX_FREQUENCY_HZ,
                    voice.carrier_hz,
                    self.synth.off_tone_delta_hz
                ),
            }
        }

        self.synth.validate()?;
        Ok(())
    }
}
