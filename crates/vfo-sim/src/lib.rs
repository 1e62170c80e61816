//! VFO Simulation Library
//!
//! Stand-ins for the hardware side of the synthesizer so that links and the
//! allocator can be exercised without a radio on the bench:
//!
//! - **VirtualIcom**: decodes CI-V frames from a byte stream and tracks the
//!   resulting VFO A/B frequencies
//! - **MockRigctld**: a TCP server speaking the rigctld line protocol that
//!   records every command it receives
//! - **RecordingSetter**: a `FrequencySetter` that logs calls into a shared
//!   [`CallLog`] and can be told to fail
//!
//! # Example
//!
//! ```rust
//! use vfo_link::CivLink;
//! use vfo_protocol::Vfo;
//! use vfo_sim::VirtualIcom;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (client, radio_io) = tokio::io::duplex(256);
//! let radio = VirtualIcom::new(0x98).spawn(radio_io);
//!
//! let link = CivLink::new("virtual", client, 0x98);
//! link.set_vfo(Vfo::A, 14_066_560).await.unwrap();
//! link.close().await.unwrap();
//!
//! let radio = radio.await.unwrap().unwrap();
//! assert_eq!(radio.vfo(Vfo::A), Some(14_066_560));
//! # }
//! ```

pub mod radio;
pub mod recorder;
pub mod rigctld;

pub use radio::VirtualIcom;
pub use recorder::{CallLog, RecordingSetter, SetterCall};
pub use rigctld::{MockBehavior, MockRigctld};
