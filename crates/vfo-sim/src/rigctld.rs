//! Mock rigctld daemon
//!
//! Listens on an ephemeral localhost port and speaks enough of the rigctld
//! line protocol for [`RigctlClient`](vfo_link::RigctlClient) to be tested
//! against: `F <hz>` is acknowledged with `RPRT 0` and `_` answers with a
//! fixed info string.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use vfo_link::RigctlConfig;
use vfo_protocol::{RigctlCommand, RigctlReply};

/// Info string returned for `_`
pub const MOCK_INFO: &str = "Mock IC-7610";

/// How the mock answers commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockBehavior {
    /// Reply to every command
    #[default]
    Responsive,
    /// Record commands but never reply
    Silent,
}

/// A running mock rigctld
pub struct MockRigctld {
    addr: SocketAddr,
    commands: Arc<Mutex<Vec<RigctlCommand>>>,
    task: JoinHandle<()>,
}

impl MockRigctld {
    /// Bind to `127.0.0.1:0` and start accepting clients
    pub async fn start(behavior: MockBehavior) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let commands = Arc::new(Mutex::new(Vec::new()));

        info!("Mock rigctld listening on {} ({:?})", addr, behavior);

        let log = Arc::clone(&commands);
        let task = tokio::spawn(async move {
            while let Ok((stream, peer)) = listener.accept().await {
                debug!("Mock rigctld accepted {}", peer);
                tokio::spawn(serve_client(stream, behavior, Arc::clone(&log)));
            }
        });

        Ok(Self {
            addr,
            commands,
            task,
        })
    }

    /// Bound socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bound TCP port
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Client configuration pointing at this mock with short timeouts
    pub fn config(&self) -> RigctlConfig {
        RigctlConfig {
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            connect_timeout: Duration::from_millis(500),
            response_timeout: Duration::from_millis(100),
            validate_on_connect: true,
        }
    }

    /// Every command received so far, across all clients
    pub fn commands(&self) -> Vec<RigctlCommand> {
        self.commands
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Frequencies received via `F`, oldest first
    pub fn frequencies(&self) -> Vec<u64> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                RigctlCommand::SetFrequency { hz } => Some(hz),
                RigctlCommand::GetInfo => None,
            })
            .collect()
    }

    /// Most recent frequency set, if any
    pub fn frequency(&self) -> Option<u64> {
        self.frequencies().last().copied()
    }
}

impl Drop for MockRigctld {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_client(
    stream: TcpStream,
    behavior: MockBehavior,
    commands: Arc<Mutex<Vec<RigctlCommand>>>,
) {
    let mut stream = BufReader::new(stream);
    let mut line = String::new();

    loop {
        line.clear();
        match stream.read_line(&mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let reply = match RigctlCommand::parse(&line) {
            Ok(command) => {
                debug!("Mock rigctld received {}", command);
                let reply = match command {
                    RigctlCommand::SetFrequency { .. } => RigctlReply::Status(0),
                    RigctlCommand::GetInfo => RigctlReply::Value(MOCK_INFO.to_string()),
                };
                commands
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push(command);
                reply
            }
            Err(e) => {
                debug!("Mock rigctld rejected {:?}: {}", line, e);
                RigctlReply::Status(-1)
            }
        };

        if behavior == MockBehavior::Silent {
            continue;
        }
        if stream.get_mut().write_all(&reply.encode()).await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_to_raw_client() {
        let mock = MockRigctld::start(MockBehavior::Responsive).await.unwrap();
        let stream = TcpStream::connect(mock.addr()).await.unwrap();
        let mut stream = BufReader::new(stream);

        stream.get_mut().write_all(b"F 14066560\n").await.unwrap();
        let mut line = String::new();
        stream.read_line(&mut line).await.unwrap();
        assert_eq!(line, "RPRT 0\n");

        line.clear();
        stream.get_mut().write_all(b"_\n").await.unwrap();
        stream.read_line(&mut line).await.unwrap();
        assert_eq!(line.trim_end(), MOCK_INFO);

        line.clear();
        stream.get_mut().write_all(b"Q\n").await.unwrap();
        stream.read_line(&mut line).await.unwrap();
        assert_eq!(line, "RPRT -1\n");

        assert_eq!(mock.frequencies(), vec![14_066_560]);
        assert_eq!(mock.commands().len(), 2);
    }
}
