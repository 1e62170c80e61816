//! VFO Protocol Library
//!
//! This crate provides the wire formats used to retune a transceiver's VFOs
//! from a stream of musical notes:
//!
//! - **BCD frequencies**: 5-byte, 10-digit little-endian BCD encoding used by
//!   Icom radios
//! - **Icom CI-V framing**: `FE FE <addr> <cmd> <subcmd> <payload> FD`
//!   envelopes, with a streaming decoder for the reverse direction
//! - **rigctld line protocol**: newline-terminated ASCII commands understood
//!   by the Hamlib network daemon
//!
//! Everything in this crate is pure: no I/O, no timing. The transports that
//! put these bytes on a serial port or socket live in `vfo-link`.
//!
//! # Example
//!
//! ```rust
//! use vfo_protocol::civ::{CivFrame, Vfo};
//!
//! let frame = CivFrame::set_vfo(0x98, Vfo::A, 7_067_000).unwrap();
//! assert_eq!(
//!     frame.encode(),
//!     vec![0xFE, 0xFE, 0x98, 0xE0, 0x25, 0x00, 0x00, 0x70, 0x06, 0x07, 0x00, 0xFD]
//! );
//! ```

pub mod bcd;
pub mod civ;
pub mod error;
pub mod rigctl;

pub use bcd::{decode_frequency, encode_frequency, FREQUENCY_BYTES, MAX_FREQUENCY_HZ};
pub use civ::{CivCodec, CivFrame, Vfo};
pub use error::{EncodeError, ParseError};
pub use rigctl::{RigctlCommand, RigctlReply};
