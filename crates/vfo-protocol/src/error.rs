//! Error types for VFO protocol parsing and encoding

use thiserror::Error;

/// Errors that can occur while parsing protocol data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Buffer is incomplete - need more data
    #[error("incomplete data: need {needed} more bytes")]
    Incomplete { needed: usize },

    /// Invalid frame structure
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// Invalid BCD encoding
    #[error("invalid BCD digit: 0x{0:02X}")]
    InvalidBcd(u8),

    /// Line could not be interpreted as a rigctld command or reply
    #[error("invalid line: {0}")]
    InvalidLine(String),
}

/// Errors that can occur while encoding outbound commands
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Frequency does not fit in the 10-digit BCD field
    #[error("frequency {hz} Hz out of range (max {max} Hz)")]
    FrequencyOutOfRange { hz: u64, max: u64 },
}
