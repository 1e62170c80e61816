//! Synthesizer configuration

use serde::{Deserialize, Serialize};

use crate::error::SynthError;

/// Default offset above the carrier used to silence a voice
pub const DEFAULT_OFF_TONE_DELTA_HZ: u64 = 600;

/// Default capacity of the MIDI to allocator event queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Tunables for the allocator and MIDI adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Hz above the carrier a released voice is parked at
    pub off_tone_delta_hz: u64,
    /// Bounded event queue capacity
    pub queue_capacity: usize,
    /// Only accept notes on this MIDI channel (0-15); omni when unset
    pub midi_channel: Option<u8>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            off_tone_delta_hz: DEFAULT_OFF_TONE_DELTA_HZ,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            midi_channel: None,
        }
    }
}

impl SynthConfig {
    /// Check the values are usable
    pub fn validate(&self) -> Result<(), SynthError> {
        if self.queue_capacity == 0 {
            return Err(SynthError::ZeroQueueCapacity);
        }
        if let Some(channel) = self.midi_channel {
            if channel > 15 {
                return Err(SynthError::InvalidMidiChannel(channel));
            }
        }
        Ok(())
    }
}
