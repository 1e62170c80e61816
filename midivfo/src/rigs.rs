//! Rig connections
//!
//! Opens every configured rig once at startup and hands out one frequency
//! setter per configured voice. Voices on the two VFOs of a CI-V radio share
//! that radio's link.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::net::TcpStream;
use tokio_serial::SerialStream;
use tracing::{info, warn};
use vfo_link::{CivLink, FrequencySetter, RigctlClient};
use vfo_protocol::Vfo;
use vfo_synth::VoiceBinding;

use crate::settings::{RigSettings, VoiceSettings};

/// An open connection to one rig
pub enum RigConnection {
    Civ(Arc<CivLink<SerialStream>>),
    Rigctl(Arc<RigctlClient<TcpStream>>),
}

impl RigConnection {
    /// Open the connection described by `settings`
    pub async fn open(settings: &RigSettings) -> anyhow::Result<Self> {
        match settings {
            RigSettings::Civ(civ) => {
                let link = CivLink::open_serial(&civ.port, civ.baud_rate, civ.address)
                    .with_context(|| {
                        format!("Failed to open CI-V rig '{}' on {}", civ.name, civ.port)
                    })?
                    .with_settle(Duration::from_millis(civ.settle_ms));
                Ok(RigConnection::Civ(Arc::new(link)))
            }
            RigSettings::Rigctl(rigctl) => {
                let config = rigctl.client_config();
                let client = RigctlClient::connect(&config).await.with_context(|| {
                    format!(
                        "Failed to connect to rigctld rig '{}' at {}",
                        rigctl.name,
                        config.endpoint()
                    )
                })?;
                Ok(RigConnection::Rigctl(Arc::new(client)))
            }
        }
    }

    /// Setter for one VFO of this rig
    pub fn setter(&self, vfo: Vfo) -> Arc<dyn FrequencySetter> {
        match self {
            RigConnection::Civ(link) => Arc::new(link.vfo(vfo)),
            RigConnection::Rigctl(client) => Arc::clone(client) as Arc<dyn FrequencySetter>,
        }
    }
}

/// Every rig the settings name, keyed by rig name
pub struct Rigs {
    connections: HashMap<String, RigConnection>,
}

impl Rigs {
    /// Connect to all rigs; any failure aborts startup
    pub async fn connect_all(settings: &[RigSettings]) -> anyhow::Result<Self> {
        let mut connections = HashMap::new();
        for rig in settings {
            let connection = RigConnection::open(rig).await?;
            info!("Rig '{}' ready", rig.name());
            connections.insert(rig.name().to_string(), connection);
        }
        Ok(Self { connections })
    }

    /// Build one voice binding per configured voice, in order
    pub fn bind_voices(&self, voices: &[VoiceSettings]) -> anyhow::Result<Vec<VoiceBinding>> {
        let mut rigctl_users: HashMap<&str, usize> = HashMap::new();

        let mut bindings = Vec::with_capacity(voices.len());

        for (index, voice) in voices.iter().enumerate() {
            let rig = self
                .connections
                .get(&voice.rig)
                .ok_or_else(|| anyhow!("Voice {} refers to unknown rig '{}'", index, voice.rig))?;

            if let RigConnection::Rigctl(_) = rig {
                *rigctl_users.entry(voice.rig.as_str()).or_default() += 1;
            }

            let setter = rig.setter(voice.vfo);
            info!(
                "Voice {}: {} beating against {} Hz",
                index,
                setter.describe(),
                voice.carrier_hz
            );
            bindings.push(VoiceBinding::shared(voice.carrier_hz, setter));
        }

        for (rig, users) in rigctl_users {
            if users > 1 {
                warn!(
                    "rigctld rig '{}' drives {} voices but only tunes its current VFO",
                    rig, users
                );
            }
        }

        Ok(bindings)
    }

    /// Close CI-V links
    pub async fn close(&self) {
        for (name, connection) in &self.connections {
            if let RigConnection::Civ(link) = connection {
                if let Err(e) = link.close().await {
                    warn!("Failed to close rig '{}': {}", name, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use vfo_sim::{MockBehavior, MockRigctld};

    use super::*;
    use crate::settings::RigctlRigSettings;

    fn rigctl_settings(name: &str, mock: &MockRigctld) -> RigSettings {
        RigSettings::Rigctl(RigctlRigSettings {
            name: name.to_string(),
            host: "127.0.0.1".to_string(),
            port: mock.port(),
            connect_timeout_ms: 500,
            response_timeout_ms: 100,
            validate_on_connect: true,
        })
    }

    #[tokio::test]
    async fn test_binds_voices_to_rigctl_rig() {
        let mock = MockRigctld::start(MockBehavior::Responsive).await.unwrap();
        let rigs = Rigs::connect_all(&[rigctl_settings("remote", &mock)])
            .await
            .unwrap();

        let voices = vec![VoiceSettings {
            rig: "remote".to_string(),
            vfo: Vfo::A,
            carrier_hz: 7_030_000,
        }];
        let bindings = rigs.bind_voices(&voices).unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].carrier_hz, 7_030_000);

        bindings[0].setter.set_frequency(7_029_560).await.unwrap();
        assert_eq!(mock.frequency(), Some(7_029_560));
    }

    #[tokio::test]
    async fn test_unknown_rig_is_rejected() {
        let rigs = Rigs::connect_all(&[]).await.unwrap();
        let voices = vec![VoiceSettings {
            rig: "nowhere".to_string(),
            vfo: Vfo::A,
            carrier_hz: 7_030_000,
        }];
        assert!(rigs.bind_voices(&voices).is_err());
    }

    #[tokio::test]
    async fn test_silent_rig_fails_startup() {
        let mock = MockRigctld::start(MockBehavior::Silent).await.unwrap();
        let result = Rigs::connect_all(&[rigctl_settings("remote", &mock)]).await;
        assert!(result.is_err());
    }
}
