//! VFO Synthesizer Library
//!
//! Plays MIDI on radio transceivers. Each voice is a VFO beating against a
//! fixed carrier; tuning the VFO `f` Hz below the carrier produces an `f` Hz
//! tone in a receiver listening on USB.
//!
//! # Architecture
//!
//! ```text
//! MIDI callback ──► MidiAdapter ──► mpsc (bounded) ──► run_allocator task
//!                                                           │
//!                                                  ToneSlotAllocator
//!                                                           │
//!                                            FrequencySetter per voice
//! ```
//!
//! # Example
//!
//! ```rust
//! use vfo_sim::{CallLog, RecordingSetter};
//! use vfo_synth::{Allocation, ToneSlotAllocator, VoiceBinding};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let log = CallLog::new();
//! let voice = VoiceBinding::new(14_067_000, RecordingSetter::new("A", &log));
//! let mut allocator = ToneSlotAllocator::new(vec![voice], 600).unwrap();
//!
//! assert_eq!(allocator.start(440).await, Allocation::Assigned { slot: 0 });
//! assert_eq!(log.for_label("A"), vec![14_066_560]);
//! # }
//! ```

pub mod actor;
pub mod allocator;
pub mod config;
pub mod error;
pub mod event;
pub mod midi;
pub mod slot;

pub use actor::{run_allocator, run_allocator_with_drops, spawn_allocator, AllocatorHandle};
pub use allocator::{Allocation, ToneSlotAllocator};
pub use config::{SynthConfig, DEFAULT_OFF_TONE_DELTA_HZ, DEFAULT_QUEUE_CAPACITY};
pub use error::SynthError;
pub use event::{ToneEvent, ToneKind};
pub use midi::{note_to_frequency, Dispatch, MidiAction, MidiAdapter, MidiMessage};
pub use slot::{VoiceBinding, VoiceSlot};
