//! Icom CI-V Framing
//!
//! CI-V messages are variable-length binary frames delimited by a two-byte
//! preamble and a terminator.
//!
//! # Frame Format
//! ```text
//! FE FE [address] [command] [subcommand] [payload...] FD
//! ```
//!
//! - `FE FE`: Preamble (two bytes)
//! - `address`: Destination radio address (0x98 for the IC-7610)
//! - `command`, `subcommand`: Operation selector
//! - `payload`: Variable length data (BCD encoded for frequencies)
//! - `FD`: Terminator
//!
//! The only operation the synthesizer needs is "set VFO frequency", which
//! uses command `0xE0` / subcommand `0x25` with a payload of one VFO selector
//! byte followed by the 5-byte BCD frequency.

use crate::bcd::{decode_frequency, encode_frequency, FREQUENCY_BYTES};
use crate::error::{EncodeError, ParseError};

/// CI-V frame preamble byte
pub const PREAMBLE: u8 = 0xFE;
/// CI-V frame terminator byte
pub const TERMINATOR: u8 = 0xFD;
/// Default radio address (IC-7610)
pub const DEFAULT_RADIO_ADDR: u8 = 0x98;
/// Command byte for the VFO frequency operation
pub const SET_VFO_COMMAND: u8 = 0xE0;
/// Subcommand byte for the VFO frequency operation
pub const SET_VFO_SUBCOMMAND: u8 = 0x25;

/// Minimum frame: FE FE addr cmd subcmd FD
const MIN_FRAME_LEN: usize = 6;
/// Maximum frame length (reasonable limit)
const MAX_FRAME_LEN: usize = 64;

/// Which of the radio's two VFOs a command addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Vfo {
    /// VFO A (main)
    #[default]
    A,
    /// VFO B (sub)
    B,
}

impl Vfo {
    /// Payload selector byte for this VFO
    pub fn selector(self) -> u8 {
        match self {
            Vfo::A => 0x00,
            Vfo::B => 0x01,
        }
    }

    /// Parse a payload selector byte
    pub fn from_selector(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Vfo::A),
            0x01 => Some(Vfo::B),
            _ => None,
        }
    }

    /// Short display name
    pub fn name(self) -> &'static str {
        match self {
            Vfo::A => "A",
            Vfo::B => "B",
        }
    }
}

/// A single CI-V frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CivFrame {
    /// Destination address
    pub address: u8,
    /// Command byte
    pub command: u8,
    /// Subcommand byte
    pub subcommand: u8,
    /// Payload between the subcommand and the terminator
    pub payload: Vec<u8>,
}

impl CivFrame {
    /// Create a new frame
    pub fn new(address: u8, command: u8, subcommand: u8, payload: Vec<u8>) -> Self {
        Self {
            address,
            command,
            subcommand,
            payload,
        }
    }

    /// Build a "set VFO frequency" frame for the radio at `address`
    pub fn set_vfo(address: u8, vfo: Vfo, hz: u64) -> Result<Self, EncodeError> {
        let bcd = encode_frequency(hz)?;
        let mut payload = Vec::with_capacity(1 + FREQUENCY_BYTES);
        payload.push(vfo.selector());
        payload.extend_from_slice(&bcd);
        Ok(Self::new(
            address,
            SET_VFO_COMMAND,
            SET_VFO_SUBCOMMAND,
            payload,
        ))
    }

    /// Encode this frame to its wire format
    pub fn encode(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(MIN_FRAME_LEN + self.payload.len());
        frame.extend_from_slice(&[
            PREAMBLE,
            PREAMBLE,
            self.address,
            self.command,
            self.subcommand,
        ]);
        frame.extend_from_slice(&self.payload);
        frame.push(TERMINATOR);
        frame
    }

    /// Interpret this frame as a "set VFO frequency" command
    ///
    /// Returns `None` if the frame is some other command or its payload is
    /// malformed.
    pub fn vfo_frequency(&self) -> Option<(Vfo, u64)> {
        if self.command != SET_VFO_COMMAND || self.subcommand != SET_VFO_SUBCOMMAND {
            return None;
        }
        let (&selector, bcd) = self.payload.split_first()?;
        let vfo = Vfo::from_selector(selector)?;
        let hz = decode_frequency(bcd).ok()?;
        Some((vfo, hz))
    }

    /// Parse a complete frame, preamble through terminator
    pub fn parse(frame: &[u8]) -> Result<Self, ParseError> {
        if frame.len() < MIN_FRAME_LEN {
            return Err(ParseError::Incomplete {
                needed: MIN_FRAME_LEN - frame.len(),
            });
        }

        if frame[0] != PREAMBLE || frame[1] != PREAMBLE {
            return Err(ParseError::InvalidFrame("missing preamble".into()));
        }

        if frame[frame.len() - 1] != TERMINATOR {
            return Err(ParseError::InvalidFrame("missing terminator".into()));
        }

        Ok(Self {
            address: frame[2],
            command: frame[3],
            subcommand: frame[4],
            payload: frame[5..frame.len() - 1].to_vec(),
        })
    }
}

/// Streaming CI-V frame decoder
#[derive(Debug)]
pub struct CivCodec {
    buffer: Vec<u8>,
}

impl CivCodec {
    /// Create a new CI-V codec
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_FRAME_LEN),
        }
    }

    /// Find the start of a valid frame (FE FE sequence)
    fn find_preamble(&self) -> Option<usize> {
        self.buffer
            .windows(2)
            .position(|w| w[0] == PREAMBLE && w[1] == PREAMBLE)
    }

    /// Push raw bytes into the codec buffer
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        // Prevent buffer overflow
        if self.buffer.len() > MAX_FRAME_LEN * 4 {
            let start = self.buffer.len() - MAX_FRAME_LEN;
            self.buffer.drain(..start);
        }
    }

    /// Extract the next complete frame, if available
    ///
    /// Malformed frames are logged and skipped.
    pub fn next_frame(&mut self) -> Option<CivFrame> {
        loop {
            let preamble_pos = self.find_preamble()?;

            // Discard bytes before preamble
            if preamble_pos > 0 {
                self.buffer.drain(..preamble_pos);
            }

            let term_pos = self.buffer.iter().position(|&b| b == TERMINATOR)?;
            let frame: Vec<u8> = self.buffer.drain(..=term_pos).collect();

            match CivFrame::parse(&frame) {
                Ok(parsed) => return Some(parsed),
                Err(e) => {
                    tracing::warn!("Failed to parse CI-V frame {:02X?}: {}", frame, e);
                }
            }
        }
    }

    /// Number of buffered bytes not yet consumed
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the internal buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for CivCodec {
    fn default() -> Self {
        Self::new()
    }
}
