//! VFO Link Library
//!
//! Transports that turn "set this oscillator to N Hz" into bytes on a wire:
//!
//! - [`CivLink`]: one Icom CI-V connection (normally a serial port), with a
//!   per-link lock and a post-send settle delay
//! - [`RigctlClient`]: a Hamlib `rigctld` client speaking the line protocol
//!   over TCP
//!
//! Both are exposed to the synthesizer through the [`FrequencySetter`]
//! capability, so a voice does not care which kind of rig it is bound to.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vfo_link::{CivLink, FrequencySetter};
//! use vfo_protocol::Vfo;
//!
//! # async fn example() -> Result<(), vfo_link::LinkError> {
//! let link = Arc::new(CivLink::open_serial("/dev/ttyUSB0", 115_200, 0x98)?);
//! let vfo_b = CivLink::vfo(&link, Vfo::B);
//! vfo_b.set_frequency(14_066_560).await?;
//! # Ok(())
//! # }
//! ```

pub mod civ_link;
pub mod error;
pub mod rigctl;
pub mod setter;

pub use civ_link::{CivLink, DEFAULT_BAUD_RATE, DEFAULT_SETTLE};
pub use error::LinkError;
pub use rigctl::{RigctlClient, RigctlConfig};
pub use setter::{FrequencySetter, VfoSetter};
