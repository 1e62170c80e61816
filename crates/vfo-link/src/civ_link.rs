//! CI-V radio link
//!
//! A [`CivLink`] owns one physical connection to an Icom radio. Every frame
//! goes through a per-link lock, and after each write the link keeps the
//! lock for a short settle delay so the radio has finished processing the
//! previous command before the next one arrives. Successive frames on the
//! same link are therefore limited to roughly 100 per second; separate links
//! do not wait on each other.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::{debug, info};
use vfo_protocol::{CivFrame, Vfo};

use crate::error::LinkError;
use crate::setter::VfoSetter;

/// Default serial baud rate for CI-V over USB
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Delay after each frame before the link accepts the next one
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(10);

/// One CI-V connection to a single radio
pub struct CivLink<T> {
    name: String,
    address: u8,
    settle: Duration,
    io: Mutex<T>,
}

impl CivLink<SerialStream> {
    /// Open a CI-V link on a serial port
    ///
    /// RTS and DTR are deasserted after opening; on many USB CI-V interfaces
    /// these lines are wired to PTT or CW keying.
    pub fn open_serial(port_name: &str, baud_rate: u32, address: u8) -> Result<Self, LinkError> {
        let mut stream = tokio_serial::new(port_name, baud_rate)
            .timeout(Duration::from_millis(1000))
            .open_native_async()?;
        stream.write_request_to_send(false)?;
        stream.write_data_terminal_ready(false)?;

        info!(
            "Opened CI-V link on {} at {} baud (address 0x{:02X})",
            port_name, baud_rate, address
        );

        Ok(Self::new(port_name, stream, address))
    }
}

impl<T> CivLink<T> {
    /// Create a link over an already-open byte stream
    ///
    /// Any `AsyncWrite` works, e.g. a `tokio::io::duplex` half connected to
    /// a virtual radio.
    pub fn new(name: impl Into<String>, io: T, address: u8) -> Self {
        Self {
            name: name.into(),
            address,
            settle: DEFAULT_SETTLE,
            io: Mutex::new(io),
        }
    }

    /// Override the post-send settle delay
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Name of the link (usually the serial port path)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// CI-V address of the radio on this link
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Settle delay applied after every frame
    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// Bind one VFO of this link as a frequency setter
    pub fn vfo(self: &Arc<Self>, vfo: Vfo) -> VfoSetter<T> {
        VfoSetter::new(Arc::clone(self), vfo)
    }
}

impl<T> CivLink<T>
where
    T: AsyncWrite + Unpin + Send,
{
    /// Frame and send a command to this link's radio
    ///
    /// Returns once the frame is written and the settle delay has elapsed.
    pub async fn send(&self, command: u8, subcommand: u8, payload: &[u8]) -> Result<(), LinkError> {
        let frame = CivFrame::new(self.address, command, subcommand, payload.to_vec());
        self.send_frame(&frame).await
    }

    /// Send a pre-built frame
    pub async fn send_frame(&self, frame: &CivFrame) -> Result<(), LinkError> {
        let bytes = frame.encode();

        let mut io = self.io.lock().await;
        io.write_all(&bytes).await?;
        io.flush().await?;
        debug!("Sent {} bytes on {}: {:02X?}", bytes.len(), self.name, bytes);

        // Hold the lock through the settle delay so the next frame waits too
        tokio::time::sleep(self.settle).await;
        Ok(())
    }

    /// Tune VFO A or B to `hz`
    pub async fn set_vfo(&self, vfo: Vfo, hz: u64) -> Result<(), LinkError> {
        let frame = CivFrame::set_vfo(self.address, vfo, hz)?;
        self.send_frame(&frame).await
    }

    /// Tune VFO A to `hz`
    pub async fn set_frequency(&self, hz: u64) -> Result<(), LinkError> {
        self.set_vfo(Vfo::A, hz).await
    }

    /// Shut down the write side of the transport
    pub async fn close(&self) -> Result<(), LinkError> {
        let mut io = self.io.lock().await;
        io.shutdown().await?;
        info!("Closed CI-V link {}", self.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use tokio::io::{duplex, AsyncReadExt};
    use vfo_protocol::CivCodec;

    use super::*;

    #[tokio::test]
    async fn test_send_writes_exact_frame() {
        let (client, mut radio) = duplex(256);
        let link = CivLink::new("test", client, 0x98);

        link.send(0xE0, 0x25, &[0x00, 0x00, 0x70, 0x06, 0x07, 0x00])
            .await
            .unwrap();

        let mut buf = [0u8; 12];
        radio.read_exact(&mut buf).await.unwrap();
        assert_eq!(
            buf,
            [0xFE, 0xFE, 0x98, 0xE0, 0x25, 0x00, 0x00, 0x70, 0x06, 0x07, 0x00, 0xFD]
        );

        // Nothing beyond the terminator
        link.close().await.unwrap();
        let mut rest = Vec::new();
        radio.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_send_waits_settle_delay() {
        let (client, _radio) = duplex(256);
        let link = CivLink::new("test", client, 0x98);

        let start = Instant::now();
        link.send(0xE0, 0x25, &[0x00]).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_set_vfo_b() {
        let (client, mut radio) = duplex(256);
        let link = CivLink::new("test", client, 0x98).with_settle(Duration::ZERO);

        link.set_vfo(Vfo::B, 14_066_560).await.unwrap();

        let mut buf = [0u8; 12];
        radio.read_exact(&mut buf).await.unwrap();
        let mut codec = CivCodec::new();
        codec.push_bytes(&buf);
        let frame = codec.next_frame().unwrap();
        assert_eq!(frame.address, 0x98);
        assert_eq!(frame.vfo_frequency(), Some((Vfo::B, 14_066_560)));
    }

    #[tokio::test]
    async fn test_set_vfo_rejects_out_of_range() {
        let (client, _radio) = duplex(256);
        let link = CivLink::new("test", client, 0x98);

        let err = link.set_frequency(12_000_000_000).await.unwrap_err();
        assert!(matches!(err, LinkError::Encode(_)));
    }

    #[tokio::test]
    async fn test_concurrent_senders_do_not_interleave() {
        let (client, mut radio) = duplex(1024);
        let link = Arc::new(CivLink::new("test", client, 0x98));

        let a = link.vfo(Vfo::A);
        let b = link.vfo(Vfo::B);
        let start = Instant::now();
        let (ra, rb) = tokio::join!(
            crate::FrequencySetter::set_frequency(&a, 7_000_000),
            crate::FrequencySetter::set_frequency(&b, 7_100_000)
        );
        ra.unwrap();
        rb.unwrap();
        // Second frame waited for the first frame's settle delay
        assert!(start.elapsed() >= Duration::from_millis(20));

        let mut buf = [0u8; 24];
        radio.read_exact(&mut buf).await.unwrap();
        let mut codec = CivCodec::new();
        codec.push_bytes(&buf);
        let mut seen = vec![
            codec.next_frame().and_then(|f| f.vfo_frequency()).unwrap(),
            codec.next_frame().and_then(|f| f.vfo_frequency()).unwrap(),
        ];
        seen.sort_by_key(|(_, hz)| *hz);
        assert_eq!(seen, vec![(Vfo::A, 7_000_000), (Vfo::B, 7_100_000)]);
    }

    #[tokio::test]
    async fn test_write_error_propagates() {
        let (client, radio) = duplex(64);
        drop(radio);
        let link = CivLink::new("test", client, 0x98);

        let err = link.set_frequency(7_000_000).await.unwrap_err();
        assert!(matches!(err, LinkError::Io(_)));
    }
}
