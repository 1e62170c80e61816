//! Tone-slot allocator
//!
//! Maps a stream of START/STOP tone events onto a fixed set of voices.
//!
//! # Allocation rules
//!
//! - START of a pitch that is already sounding does nothing.
//! - Otherwise the lowest-numbered idle voice takes the pitch.
//! - With every voice busy, the voice after the most recently assigned one
//!   (wrapping) is stolen and retuned.
//! - STOP of a sounding pitch parks its voice at `carrier + off_tone_delta`.
//!   STOP of anything else does nothing.
//!
//! A voice's state changes even if retuning the hardware fails; the failure
//! is logged and the next event is processed normally.

use tracing::{debug, warn};

use crate::error::SynthError;
use crate::event::{ToneEvent, ToneKind};
use crate::slot::{VoiceBinding, VoiceSlot};

/// What an event did to the voices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// An idle voice started sounding
    Assigned { slot: usize },
    /// A busy voice was taken over
    Stolen { slot: usize, previous_hz: u64 },
    /// A voice went idle
    Released { slot: usize },
    /// Nothing changed and no hardware was touched
    Unchanged,
}

/// Polyphonic voice allocator
pub struct ToneSlotAllocator {
    slots: Vec<VoiceSlot>,
    /// Index of the most recently assigned voice
    last_assigned: usize,
    off_tone_delta_hz: u64,
}

impl ToneSlotAllocator {
    /// Create an allocator with one voice per binding, all idle
    pub fn new(bindings: Vec<VoiceBinding>, off_tone_delta_hz: u64) -> Result<Self, SynthError> {
        if bindings.is_empty() {
            return Err(SynthError::NoVoices);
        }

        Ok(Self {
            slots: bindings.into_iter().map(VoiceSlot::new).collect(),
            last_assigned: 0,
            off_tone_delta_hz,
        })
    }

    /// Number of voices
    pub fn voice_count(&self) -> usize {
        self.slots.len()
    }

    pub fn voices(&self) -> &[VoiceSlot] {
        &self.slots
    }

    /// Pitch sounding on each voice, in voice order
    pub fn sounding(&self) -> Vec<Option<u64>> {
        self.slots.iter().map(VoiceSlot::sounding).collect()
    }

    pub fn last_assigned(&self) -> usize {
        self.last_assigned
    }

    pub fn off_tone_delta_hz(&self) -> u64 {
        self.off_tone_delta_hz
    }

    /// Voice currently sounding `audio_hz`
    pub fn slot_for(&self, audio_hz: u64) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.sounding() == Some(audio_hz))
    }

    /// Apply one event
    pub async fn handle_event(&mut self, event: ToneEvent) -> Allocation {
        match event.kind {
            ToneKind::Start => self.start(event.audio_hz).await,
            ToneKind::Stop => self.stop(event.audio_hz).await,
        }
    }

    /// Start sounding `audio_hz`
    pub async fn start(&mut self, audio_hz: u64) -> Allocation {
        if let Some(slot) = self.slot_for(audio_hz) {
            debug!("{} Hz already sounding on voice {}", audio_hz, slot);
            return Allocation::Unchanged;
        }

        let (slot, outcome) = match self.slots.iter().position(VoiceSlot::is_idle) {
            Some(slot) => (slot, Allocation::Assigned { slot }),
            None => {
                let slot = (self.last_assigned + 1) % self.slots.len();
                let previous_hz = self.slots[slot].sounding().unwrap_or_default();
                (slot, Allocation::Stolen { slot, previous_hz })
            }
        };

        self.slots[slot].set_sounding(Some(audio_hz));
        self.last_assigned = slot;
        debug!("START {} Hz on voice {} ({:?})", audio_hz, slot, outcome);

        match self.slots[slot].vfo_for(audio_hz) {
            Some(vfo_hz) => self.retune(slot, vfo_hz).await,
            None => warn!(
                "{} Hz is above voice {} carrier {} Hz, not retuning",
                audio_hz,
                slot,
                self.slots[slot].carrier_hz()
            ),
        }

        outcome
    }

    /// Stop sounding `audio_hz`
    pub async fn stop(&mut self, audio_hz: u64) -> Allocation {
        let Some(slot) = self.slot_for(audio_hz) else {
            debug!("STOP {} Hz ignored, not sounding", audio_hz);
            return Allocation::Unchanged;
        };

        self.slots[slot].set_sounding(None);
        debug!("STOP {} Hz on voice {}", audio_hz, slot);

        let off = self.slots[slot].off_tone(self.off_tone_delta_hz);
        self.retune(slot, off).await;

        Allocation::Released { slot }
    }

    /// Park every voice at its off-tone and mark it idle
    pub async fn silence_all(&mut self) {
        for slot in 0..self.slots.len() {
            self.slots[slot].set_sounding(None);
            let off = self.slots[slot].off_tone(self.off_tone_delta_hz);
            self.retune(slot, off).await;
        }
    }

    async fn retune(&self, slot: usize, vfo_hz: u64) {
        let voice = &self.slots[slot];
        if let Err(e) = voice.setter().set_frequency(vfo_hz).await {
            warn!(
                "Failed to tune voice {} ({}) to {} Hz: {}",
                slot,
                voice.setter().describe(),
                vfo_hz,
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use vfo_sim::{CallLog, RecordingSetter};

    use super::*;

    const CARRIER: u64 = 14_067_000;

    fn allocator(voices: usize) -> (ToneSlotAllocator, CallLog) {
        let log = CallLog::new();
        let bindings = (0..voices)
            .map(|i| VoiceBinding::new(CARRIER, RecordingSetter::new(format!("v{}", i), &log)))
            .collect();
        (ToneSlotAllocator::new(bindings, 600).unwrap(), log)
    }

    #[test]
    fn test_requires_a_voice() {
        let err = ToneSlotAllocator::new(Vec::new(), 600).err();
        assert_eq!(err, Some(SynthError::NoVoices));
    }

    #[tokio::test]
    async fn test_start_uses_first_idle_voice() {
        let (mut alloc, log) = allocator(3);

        assert_eq!(alloc.start(440).await, Allocation::Assigned { slot: 0 });
        assert_eq!(alloc.start(880).await, Allocation::Assigned { slot: 1 });
        assert_eq!(alloc.last_assigned(), 1);
        assert_eq!(log.for_label("v0"), vec![CARRIER - 440]);
        assert_eq!(log.for_label("v1"), vec![CARRIER - 880]);
    }

    #[tokio::test]
    async fn test_released_voice_is_reused_first() {
        let (mut alloc, _log) = allocator(3);

        alloc.start(100).await;
        alloc.start(200).await;
        alloc.start(300).await;
        assert_eq!(alloc.stop(200).await, Allocation::Released { slot: 1 });
        assert_eq!(alloc.start(400).await, Allocation::Assigned { slot: 1 });
        assert_eq!(alloc.sounding(), vec![Some(100), Some(400), Some(300)]);
    }

    #[tokio::test]
    async fn test_stop_parks_at_off_tone() {
        let (mut alloc, log) = allocator(1);

        alloc.start(700).await;
        alloc.stop(700).await;
        assert_eq!(log.for_label("v0"), vec![CARRIER - 700, CARRIER + 600]);
        assert_eq!(alloc.sounding(), vec![None]);
    }

    #[tokio::test]
    async fn test_stolen_reports_previous_pitch() {
        let (mut alloc, _log) = allocator(2);

        alloc.start(100).await;
        alloc.start(200).await;
        assert_eq!(
            alloc.start(300).await,
            Allocation::Stolen {
                slot: 0,
                previous_hz: 100
            }
        );
        assert_eq!(alloc.last_assigned(), 0);
    }

    #[tokio::test]
    async fn test_pitch_above_carrier_changes_state_only() {
        let log = CallLog::new();
        let binding = VoiceBinding::new(1_000, RecordingSetter::new("low", &log));
        let mut alloc = ToneSlotAllocator::new(vec![binding], 600).unwrap();

        assert_eq!(alloc.start(1_500).await, Allocation::Assigned { slot: 0 });
        assert_eq!(alloc.sounding(), vec![Some(1_500)]);
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_setter_failure_keeps_state() {
        let log = CallLog::new();
        let setter = std::sync::Arc::new(RecordingSetter::new("v0", &log));
        setter.set_failing(true);
        let binding = VoiceBinding::shared(CARRIER, setter.clone());
        let mut alloc = ToneSlotAllocator::new(vec![binding], 600).unwrap();

        assert_eq!(alloc.start(500).await, Allocation::Assigned { slot: 0 });
        assert_eq!(alloc.sounding(), vec![Some(500)]);

        setter.set_failing(false);
        assert_eq!(alloc.stop(500).await, Allocation::Released { slot: 0 });
        assert_eq!(log.for_label("v0"), vec![CARRIER - 500, CARRIER + 600]);
    }

    #[tokio::test]
    async fn test_silence_all() {
        let (mut alloc, log) = allocator(2);

        alloc.start(100).await;
        log.clear();
        alloc.silence_all().await;

        assert_eq!(alloc.sounding(), vec![None, None]);
        assert_eq!(log.for_label("v0"), vec![CARRIER + 600]);
        assert_eq!(log.for_label("v1"), vec![CARRIER + 600]);
    }
}
