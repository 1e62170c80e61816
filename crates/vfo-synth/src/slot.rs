//! Voice slots
//!
//! A voice is one oscillator (a VFO) beating against a fixed carrier. Tuning
//! the VFO to `carrier - f` produces an audio tone of `f` Hz in the receiver;
//! parking it above the carrier moves the beat out of the passband.

use std::fmt;
use std::sync::Arc;

use vfo_link::FrequencySetter;

/// Construction parameters for one voice
#[derive(Clone)]
pub struct VoiceBinding {
    /// Carrier frequency this voice beats against, in Hz
    pub carrier_hz: u64,
    /// Oscillator that produces the beat
    pub setter: Arc<dyn FrequencySetter>,
}

impl VoiceBinding {
    pub fn new(carrier_hz: u64, setter: impl FrequencySetter + 'static) -> Self {
        Self {
            carrier_hz,
            setter: Arc::new(setter),
        }
    }

    pub fn shared(carrier_hz: u64, setter: Arc<dyn FrequencySetter>) -> Self {
        Self { carrier_hz, setter }
    }
}

impl fmt::Debug for VoiceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceBinding")
            .field("carrier_hz", &self.carrier_hz)
            .field("setter", &self.setter.describe())
            .finish()
    }
}

/// One hardware voice and what it is currently playing
pub struct VoiceSlot {
    carrier_hz: u64,
    sounding: Option<u64>,
    setter: Arc<dyn FrequencySetter>,
}

impl VoiceSlot {
    pub(crate) fn new(binding: VoiceBinding) -> Self {
        Self {
            carrier_hz: binding.carrier_hz,
            sounding: None,
            setter: binding.setter,
        }
    }

    /// Carrier frequency in Hz
    pub fn carrier_hz(&self) -> u64 {
        self.carrier_hz
    }

    /// Audio tone currently sounding, `None` when idle
    pub fn sounding(&self) -> Option<u64> {
        self.sounding
    }

    pub fn is_idle(&self) -> bool {
        self.sounding.is_none()
    }

    pub fn setter(&self) -> &Arc<dyn FrequencySetter> {
        &self.setter
    }

    pub(crate) fn set_sounding(&mut self, audio_hz: Option<u64>) {
        self.sounding = audio_hz;
    }

    /// VFO frequency that produces `audio_hz`; `None` if it would be negative
    pub fn vfo_for(&self, audio_hz: u64) -> Option<u64> {
        self.carrier_hz.checked_sub(audio_hz)
    }

    /// VFO frequency that keeps this voice silent
    pub fn off_tone(&self, delta_hz: u64) -> u64 {
        self.carrier_hz.saturating_add(delta_hz)
    }
}

impl fmt::Debug for VoiceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceSlot")
            .field("carrier_hz", &self.carrier_hz)
            .field("sounding", &self.sounding)
            .field("setter", &self.setter.describe())
            .finish()
    }
}
