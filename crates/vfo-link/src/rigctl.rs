//! rigctld client
//!
//! Talks to a Hamlib `rigctld` daemon instead of directly to the radio. The
//! daemon owns the serial port; this client only sends `F <hz>` lines.
//!
//! On connect the client asks the daemon for the rig's info string and
//! treats silence as a failed handshake, so a daemon that accepted the
//! socket but lost its radio is caught at startup rather than mid-song.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use vfo_protocol::{RigctlCommand, RigctlReply};

use crate::error::LinkError;
use crate::setter::FrequencySetter;

/// Default rigctld TCP port
pub const DEFAULT_PORT: u16 = 4532;

/// Pause between connection attempts while waiting for the daemon
const RECONNECT_INTERVAL: Duration = Duration::from_millis(100);

/// Connection settings for a rigctld daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RigctlConfig {
    /// Hostname or IP address
    pub host: String,
    /// TCP port
    pub port: u16,
    /// How long to keep trying to connect
    pub connect_timeout: Duration,
    /// How long to wait for each reply line
    pub response_timeout: Duration,
    /// Query the rig info after connecting and fail if nothing answers
    pub validate_on_connect: bool,
}

impl Default for RigctlConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(1),
            validate_on_connect: true,
        }
    }
}

impl RigctlConfig {
    /// `host:port` string
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Client for one rigctld daemon
pub struct RigctlClient<T> {
    endpoint: String,
    response_timeout: Duration,
    io: Mutex<BufReader<T>>,
}

impl RigctlClient<TcpStream> {
    /// Connect to rigctld, retrying until `connect_timeout` elapses
    pub async fn connect(config: &RigctlConfig) -> Result<Self, LinkError> {
        let endpoint = config.endpoint();
        debug!(
            "Connecting to rigctld at {} (timeout {}ms)",
            endpoint,
            config.connect_timeout.as_millis()
        );

        let stream = tokio::time::timeout(config.connect_timeout, connect_retrying(&endpoint))
            .await
            .map_err(|_| LinkError::ConnectTimeout {
                endpoint: endpoint.clone(),
                timeout_ms: config.connect_timeout.as_millis() as u64,
            })?;

        // Rig commands are tiny and latency-sensitive
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY on {}: {}", endpoint, e);
        }

        let client = Self::from_stream(stream, endpoint, config.response_timeout);

        if config.validate_on_connect {
            let info = client.validate().await?;
            info!("Connected to rigctld at {} ({})", client.endpoint, info);
        } else {
            info!("Connected to rigctld at {}", client.endpoint);
        }

        Ok(client)
    }
}

async fn connect_retrying(endpoint: &str) -> TcpStream {
    loop {
        match TcpStream::connect(endpoint).await {
            Ok(stream) => return stream,
            Err(e) => {
                debug!("rigctld at {} not reachable yet: {}", endpoint, e);
                tokio::time::sleep(RECONNECT_INTERVAL).await;
            }
        }
    }
}

impl<T> RigctlClient<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already-connected stream
    pub fn from_stream(stream: T, endpoint: impl Into<String>, response_timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            response_timeout,
            io: Mutex::new(BufReader::new(stream)),
        }
    }

    /// Address of the daemon
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one command and read one reply line
    pub async fn send_command(&self, command: &RigctlCommand) -> Result<RigctlReply, LinkError> {
        let mut io = self.io.lock().await;

        let bytes = command.encode();
        io.get_mut().write_all(&bytes).await?;
        io.get_mut().flush().await?;
        debug!("Sent to {}: {}", self.endpoint, command);

        let mut line = String::new();
        match tokio::time::timeout(self.response_timeout, io.read_line(&mut line)).await {
            Err(_) => Err(LinkError::ResponseTimeout {
                timeout_ms: self.response_timeout.as_millis() as u64,
            }),
            Ok(Err(e)) => Err(LinkError::Io(e)),
            Ok(Ok(0)) => Err(LinkError::Closed),
            Ok(Ok(_)) => {
                let reply = RigctlReply::parse(&line);
                debug!("Reply from {}: {:?}", self.endpoint, reply);
                Ok(reply)
            }
        }
    }

    /// Query the rig info string
    pub async fn get_info(&self) -> Result<String, LinkError> {
        match self.send_command(&RigctlCommand::GetInfo).await? {
            RigctlReply::Value(info) => Ok(info),
            RigctlReply::Status(code) => Ok(format!("RPRT {}", code)),
        }
    }

    /// Check that the daemon answers the info query
    pub async fn validate(&self) -> Result<String, LinkError> {
        self.get_info().await.map_err(|e| LinkError::HandshakeFailed {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })
    }

    /// Tune the rig's current VFO to `hz`
    ///
    /// A missing reply is not an error; the daemon is slow to acknowledge
    /// while the radio is busy and the command has usually taken effect.
    pub async fn set_freq(&self, hz: u64) -> Result<(), LinkError> {
        match self.send_command(&RigctlCommand::SetFrequency { hz }).await {
            Ok(reply) => {
                if !reply.is_ok() {
                    debug!("rigctld at {} reported {:?} for F {}", self.endpoint, reply, hz);
                }
                Ok(())
            }
            Err(e) if e.is_response_timeout() => {
                debug!("No reply from {} for F {}", self.endpoint, hz);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<T> FrequencySetter for RigctlClient<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn set_frequency(&self, hz: u64) -> Result<(), LinkError> {
        self.set_freq(hz).await
    }

    fn describe(&self) -> String {
        format!("rigctld {}", self.endpoint)
    }
}
