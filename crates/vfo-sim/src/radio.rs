//! Virtual Icom radio
//!
//! Consumes the bytes a [`CivLink`](vfo_link::CivLink) writes and keeps track
//! of what the two VFOs would be tuned to.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use vfo_protocol::{CivCodec, CivFrame, Vfo};

const FEED_CHUNK: usize = 32;

/// A simulated two-VFO Icom radio
#[derive(Debug)]
pub struct VirtualIcom {
    /// CI-V address this radio answers to
    address: u8,
    /// Current VFO A frequency
    vfo_a: Option<u64>,
    /// Current VFO B frequency
    vfo_b: Option<u64>,
    /// Every frequency change in arrival order
    history: Vec<(Vfo, u64)>,
    /// Frames addressed elsewhere or not understood
    ignored_frames: usize,
    codec: CivCodec,
}

impl VirtualIcom {
    /// Create a radio answering to `address`
    pub fn new(address: u8) -> Self {
        Self {
            address,
            vfo_a: None,
            vfo_b: None,
            history: Vec::new(),
            ignored_frames: 0,
            codec: CivCodec::new(),
        }
    }

    /// CI-V address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Current frequency of a VFO, if it has ever been set
    pub fn vfo(&self, vfo: Vfo) -> Option<u64> {
        match vfo {
            Vfo::A => self.vfo_a,
            Vfo::B => self.vfo_b,
        }
    }

    /// Every frequency change received, oldest first
    pub fn history(&self) -> &[(Vfo, u64)] {
        &self.history
    }

    /// Number of frames that were not for this radio or not understood
    pub fn ignored_frames(&self) -> usize {
        self.ignored_frames
    }

    /// Audio tone heard on a VFO when beating against `carrier_hz` in USB
    ///
    /// `None` when the VFO is unset or tuned above the carrier, which puts
    /// the carrier outside the receive passband.
    pub fn beat_note(&self, vfo: Vfo, carrier_hz: u64) -> Option<u64> {
        self.vfo(vfo).and_then(|hz| carrier_hz.checked_sub(hz))
    }

    /// Feed raw bytes from the link; returns how many frequency changes
    /// were applied
    pub fn push_bytes(&mut self, data: &[u8]) -> usize {
        let mut applied = 0;
        // The codec bounds its buffer, so drain frames between small chunks
        for chunk in data.chunks(FEED_CHUNK) {
            self.codec.push_bytes(chunk);
            while let Some(frame) = self.codec.next_frame() {
                if self.apply(&frame) {
                    applied += 1;
                }
            }
        }
        applied
    }

    fn apply(&mut self, frame: &CivFrame) -> bool {
        if frame.address != self.address {
            debug!(
                "Virtual radio 0x{:02X} ignoring frame for 0x{:02X}",
                self.address, frame.address
            );
            self.ignored_frames += 1;
            return false;
        }

        match frame.vfo_frequency() {
            Some((vfo, hz)) => {
                debug!("Virtual radio 0x{:02X} VFO {} -> {} Hz", self.address, vfo.name(), hz);
                match vfo {
                    Vfo::A => self.vfo_a = Some(hz),
                    Vfo::B => self.vfo_b = Some(hz),
                }
                self.history.push((vfo, hz));
                true
            }
            None => {
                self.ignored_frames += 1;
                false
            }
        }
    }

    /// Read from `stream` until EOF, then return the final radio state
    pub async fn run<S>(mut self, mut stream: S) -> io::Result<Self>
    where
        S: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 256];
        info!("Virtual radio 0x{:02X} listening", self.address);

        loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            self.push_bytes(&buf[..n]);
        }

        info!(
            "Virtual radio 0x{:02X} stream closed after {} changes",
            self.address,
            self.history.len()
        );
        Ok(self)
    }

    /// Spawn [`run`](Self::run) on the current runtime
    pub fn spawn<S>(self, stream: S) -> JoinHandle<io::Result<Self>>
    where
        S: AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(self.run(stream))
    }
}
