//! Tone events
//!
//! The only thing that crosses from the MIDI side to the allocator task.

use std::fmt;

/// Whether a tone begins or ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToneKind {
    Start,
    Stop,
}

/// A request to start or stop one audio tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToneEvent {
    pub kind: ToneKind,
    /// Audio pitch in Hz
    pub audio_hz: u64,
}

impl ToneEvent {
    pub fn start(audio_hz: u64) -> Self {
        Self {
            kind: ToneKind::Start,
            audio_hz,
        }
    }

    pub fn stop(audio_hz: u64) -> Self {
        Self {
            kind: ToneKind::Stop,
            audio_hz,
        }
    }
}

impl fmt::Display for ToneEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ToneKind::Start => write!(f, "START {} Hz", self.audio_hz),
            ToneKind::Stop => write!(f, "STOP {} Hz", self.audio_hz),
        }
    }
}
