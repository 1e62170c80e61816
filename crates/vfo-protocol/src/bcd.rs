//! BCD frequency encoding
//!
//! Icom radios carry frequencies as ten decimal digits packed two per byte,
//! least significant pair first. Writing the frequency as a zero-padded
//! 10-digit string `d0 d1 ... d9`, the bytes on the wire are:
//!
//! ```text
//! byte0 = d8 d9   (ones, tens of Hz)
//! byte1 = d6 d7   (hundreds, thousands)
//! byte2 = d4 d5   (ten-thousands, hundred-thousands)
//! byte3 = d2 d3   (millions, ten-millions)
//! byte4 = d0 d1   (hundred-millions, billions)
//! ```
//!
//! Each digit pair is read literally as a hex byte: the pair "70" becomes
//! `0x70`, so 7.067 MHz (`0007067000`) encodes as `00 70 06 07 00`.
//!
//! Frequencies above [`MAX_FREQUENCY_HZ`] have no representation. They are
//! rejected with [`EncodeError::FrequencyOutOfRange`] rather than having
//! their upper digits silently dropped.

use crate::error::{EncodeError, ParseError};

/// Number of bytes in an encoded frequency
pub const FREQUENCY_BYTES: usize = 5;

/// Largest frequency representable in 10 BCD digits
pub const MAX_FREQUENCY_HZ: u64 = 9_999_999_999;

/// Encode a frequency in Hz to 5 BCD bytes, least significant pair first
pub fn encode_frequency(hz: u64) -> Result<[u8; FREQUENCY_BYTES], EncodeError> {
    if hz > MAX_FREQUENCY_HZ {
        return Err(EncodeError::FrequencyOutOfRange {
            hz,
            max: MAX_FREQUENCY_HZ,
        });
    }

    let mut out = [0u8; FREQUENCY_BYTES];
    let mut remaining = hz;

    for byte in out.iter_mut() {
        let low = (remaining % 10) as u8;
        remaining /= 10;
        let high = (remaining % 10) as u8;
        remaining /= 10;
        *byte = (high << 4) | low;
    }

    Ok(out)
}

/// Decode 5 BCD bytes (least significant pair first) into a frequency in Hz
pub fn decode_frequency(data: &[u8]) -> Result<u64, ParseError> {
    if data.len() < FREQUENCY_BYTES {
        return Err(ParseError::Incomplete {
            needed: FREQUENCY_BYTES - data.len(),
        });
    }
    if data.len() > FREQUENCY_BYTES {
        return Err(ParseError::InvalidFrame(format!(
            "frequency field is {} bytes, expected {}",
            data.len(),
            FREQUENCY_BYTES
        )));
    }

    let mut freq: u64 = 0;
    let mut multiplier: u64 = 1;

    for &byte in data {
        let low = (byte & 0x0F) as u64;
        let high = ((byte >> 4) & 0x0F) as u64;

        if low > 9 || high > 9 {
            return Err(ParseError::InvalidBcd(byte));
        }

        freq += low * multiplier;
        multiplier *= 10;
        freq += high * multiplier;
        multiplier *= 10;
    }

    Ok(freq)
}
