//! MIDI event adapter
//!
//! Turns raw MIDI channel messages into [`ToneEvent`]s and hands them to the
//! allocator task. [`MidiAdapter::handle_message`] runs on the MIDI driver's
//! callback thread, so it never waits and never logs: if the queue is full
//! the event is dropped and counted. The allocator task reports the count.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::SynthError;
use crate::event::ToneEvent;

/// Status high nibble for note off
const NOTE_OFF: u8 = 0x8;
/// Status high nibble for note on
const NOTE_ON: u8 = 0x9;

/// Classification of a channel message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiAction {
    NoteOn,
    NoteOff,
    Unknown,
}

impl MidiAction {
    /// Classify by the status byte's high nibble
    pub fn from_status(status: u8) -> Self {
        match status >> 4 {
            NOTE_ON => MidiAction::NoteOn,
            NOTE_OFF => MidiAction::NoteOff,
            _ => MidiAction::Unknown,
        }
    }
}

/// A decoded three-byte MIDI message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiMessage {
    /// Channel from the status low nibble (0-15)
    pub channel: u8,
    pub action: MidiAction,
    pub note: u8,
    pub velocity: u8,
}

impl MidiMessage {
    /// Decode a message; `None` if shorter than three bytes
    pub fn parse(raw: &[u8]) -> Option<Self> {
        if raw.len() < 3 {
            return None;
        }
        Some(Self {
            channel: raw[0] & 0x0F,
            action: MidiAction::from_status(raw[0]),
            note: raw[1],
            velocity: raw[2],
        })
    }

    /// Pitch of the note in Hz
    pub fn frequency_hz(&self) -> u64 {
        note_to_frequency(self.note)
    }

    /// Tone event this message stands for
    ///
    /// A note-on with zero velocity is a note-off.
    pub fn to_tone_event(&self) -> Option<ToneEvent> {
        let hz = self.frequency_hz();
        match self.action {
            MidiAction::NoteOn if self.velocity > 0 => Some(ToneEvent::start(hz)),
            MidiAction::NoteOn | MidiAction::NoteOff => Some(ToneEvent::stop(hz)),
            MidiAction::Unknown => None,
        }
    }
}

/// Equal-tempered pitch of a MIDI note, A4 (69) = 440 Hz, rounded to 1 Hz
pub fn note_to_frequency(note: u8) -> u64 {
    let semitones = f64::from(note) - 69.0;
    (440.0 * 2f64.powf(semitones / 12.0)).round() as u64
}

/// Result of offering one raw message to the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Queued for the allocator
    Enqueued(ToneEvent),
    /// Not a note message, too short, or on a filtered channel
    Ignored,
    /// The queue was full
    Dropped(ToneEvent),
    /// The allocator is gone
    Closed(ToneEvent),
}

/// Bridge from MIDI callbacks to the allocator queue
#[derive(Debug)]
pub struct MidiAdapter {
    tx: mpsc::Sender<ToneEvent>,
    channel_filter: Option<u8>,
    dropped: Arc<AtomicU64>,
}

impl MidiAdapter {
    /// Accept notes on every channel
    pub fn new(tx: mpsc::Sender<ToneEvent>) -> Self {
        Self::with_drop_counter(tx, Arc::new(AtomicU64::new(0)))
    }

    /// Accept notes on every channel, counting drops into a shared counter
    pub fn with_drop_counter(tx: mpsc::Sender<ToneEvent>, dropped: Arc<AtomicU64>) -> Self {
        Self {
            tx,
            channel_filter: None,
            dropped,
        }
    }

    /// Only accept notes on `channel`, or every channel when `None`
    pub fn with_channel_filter(mut self, channel: Option<u8>) -> Result<Self, SynthError> {
        if let Some(ch) = channel {
            if ch > 15 {
                return Err(SynthError::InvalidMidiChannel(ch));
            }
        }
        self.channel_filter = channel;
        Ok(self)
    }

    pub fn channel_filter(&self) -> Option<u8> {
        self.channel_filter
    }

    /// Events lost to a full queue so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Classify `raw` and enqueue the resulting tone event without blocking
    pub fn handle_message(&self, raw: &[u8]) -> Dispatch {
        let Some(message) = MidiMessage::parse(raw) else {
            return Dispatch::Ignored;
        };

        if let Some(wanted) = self.channel_filter {
            if message.channel != wanted {
                return Dispatch::Ignored;
            }
        }

        let Some(event) = message.to_tone_event() else {
            return Dispatch::Ignored;
        };

        match self.tx.try_send(event) {
            Ok(()) => Dispatch::Enqueued(event),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Dispatch::Dropped(event)
            }
            Err(TrySendError::Closed(_)) => Dispatch::Closed(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_to_frequency() {
        assert_eq!(note_to_frequency(69), 440);
        assert_eq!(note_to_frequency(81), 880);
        assert_eq!(note_to_frequency(57), 220);
        assert_eq!(note_to_frequency(60), 262);
        assert_eq!(note_to_frequency(0), 8);
        assert_eq!(note_to_frequency(127), 12_544);
    }

    #[test]
    fn test_parse_classifies_status() {
        let on = MidiMessage::parse(&[0x93, 69, 100]).unwrap();
        assert_eq!(on.action, MidiAction::NoteOn);
        assert_eq!(on.channel, 3);
        assert_eq!(on.to_tone_event(), Some(ToneEvent::start(440)));

        let off = MidiMessage::parse(&[0x80, 69, 64]).unwrap();
        assert_eq!(off.to_tone_event(), Some(ToneEvent::stop(440)));

        let cc = MidiMessage::parse(&[0xB0, 7, 100]).unwrap();
        assert_eq!(cc.action, MidiAction::Unknown);
        assert_eq!(cc.to_tone_event(), None);
    }

    #[test]
    fn test_zero_velocity_note_on_is_stop() {
        let msg = MidiMessage::parse(&[0x90, 81, 0]).unwrap();
        assert_eq!(msg.to_tone_event(), Some(ToneEvent::stop(880)));
    }

    #[test]
    fn test_short_messages_ignored() {
        assert_eq!(MidiMessage::parse(&[0xF8]), None);
        assert_eq!(MidiMessage::parse(&[0x90, 60]), None);
    }

    #[tokio::test]
    async fn test_adapter_enqueues_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let adapter = MidiAdapter::new(tx);

        assert_eq!(
            adapter.handle_message(&[0x90, 69, 100]),
            Dispatch::Enqueued(ToneEvent::start(440))
        );
        assert_eq!(adapter.handle_message(&[0xC0, 5, 0]), Dispatch::Ignored);
        assert_eq!(
            adapter.handle_message(&[0x80, 69, 0]),
            Dispatch::Enqueued(ToneEvent::stop(440))
        );

        assert_eq!(rx.recv().await, Some(ToneEvent::start(440)));
        assert_eq!(rx.recv().await, Some(ToneEvent::stop(440)));
    }

    #[test]
    fn test_channel_filter() {
        let (tx, _rx) = mpsc::channel(8);
        let adapter = MidiAdapter::new(tx).with_channel_filter(Some(9)).unwrap();

        assert_eq!(adapter.handle_message(&[0x90, 60, 100]), Dispatch::Ignored);
        assert!(matches!(
            adapter.handle_message(&[0x99, 60, 100]),
            Dispatch::Enqueued(_)
        ));
    }

    #[test]
    fn test_channel_filter_rejects_out_of_range() {
        let (tx, _rx) = mpsc::channel(8);
        let err = MidiAdapter::new(tx).with_channel_filter(Some(16)).unwrap_err();
        assert_eq!(err, SynthError::InvalidMidiChannel(16));
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let (tx, mut rx) = mpsc::channel(1);
        let adapter = MidiAdapter::new(tx);

        assert!(matches!(adapter.handle_message(&[0x90, 60, 100]), Dispatch::Enqueued(_)));
        assert_eq!(
            adapter.handle_message(&[0x90, 62, 100]),
            Dispatch::Dropped(ToneEvent::start(294))
        );
        assert_eq!(adapter.dropped(), 1);

        // The first event survived
        assert_eq!(rx.try_recv().unwrap(), ToneEvent::start(262));
    }

    #[test]
    fn test_adapters_share_drop_counter() {
        let (tx, _rx) = mpsc::channel(1);
        let counter = Arc::new(AtomicU64::new(0));
        let first = MidiAdapter::with_drop_counter(tx.clone(), Arc::clone(&counter));
        let second = MidiAdapter::with_drop_counter(tx, Arc::clone(&counter));

        assert!(matches!(first.handle_message(&[0x90, 60, 100]), Dispatch::Enqueued(_)));
        for note in [62, 64, 65] {
            assert!(matches!(
                second.handle_message(&[0x90, note, 100]),
                Dispatch::Dropped(_)
            ));
        }
        assert!(matches!(first.handle_message(&[0x80, 60, 0]), Dispatch::Dropped(_)));

        assert_eq!(counter.load(Ordering::Relaxed), 4);
        assert_eq!(first.dropped(), 4);
        assert_eq!(second.dropped(), 4);
    }

    #[test]
    fn test_closed_queue() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let adapter = MidiAdapter::new(tx);

        assert!(matches!(adapter.handle_message(&[0x90, 60, 100]), Dispatch::Closed(_)));
        assert_eq!(adapter.dropped(), 0);
    }
}
