//! Synthesizer error types

use thiserror::Error;

/// Errors building or configuring the synthesizer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SynthError {
    /// An allocator needs at least one voice
    #[error("at least one voice is required")]
    NoVoices,

    /// MIDI channels are numbered 0-15
    #[error("invalid MIDI channel {0} (expected 0-15)")]
    InvalidMidiChannel(u8),

    /// The event queue must be able to hold at least one event
    #[error("event queue capacity must be at least 1")]
    ZeroQueueCapacity,
}
