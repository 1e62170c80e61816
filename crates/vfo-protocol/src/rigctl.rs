//! rigctld Line Protocol
//!
//! Hamlib's `rigctld` daemon accepts newline-terminated ASCII commands on a
//! TCP socket (port 4532 by default) and answers each with one line.
//!
//! ```text
//! F 14066560\n    -> RPRT 0\n        set frequency, status reply
//! _\n             -> IC-7610\n       rig info query, value reply
//! ```
//!
//! Replies are not interpreted beyond telling a status report apart from a
//! value line.

use std::fmt;

use crate::error::ParseError;

/// Commands sent to rigctld
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RigctlCommand {
    /// Set the current VFO frequency in Hz
    SetFrequency { hz: u64 },
    /// Query rig model information
    GetInfo,
}

impl RigctlCommand {
    /// Encode this command as a newline-terminated line
    pub fn encode(&self) -> Vec<u8> {
        format!("{}\n", self).into_bytes()
    }

    /// Parse a command line (with or without its trailing newline)
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut parts = line.split_whitespace();

        match parts.next() {
            Some("F") | Some("\\set_freq") => {
                let arg = parts
                    .next()
                    .ok_or_else(|| ParseError::InvalidLine(line.to_string()))?;
                // rigctld accepts fractional Hz; only whole Hz are produced here
                let hz = arg
                    .split('.')
                    .next()
                    .and_then(|whole| whole.parse::<u64>().ok())
                    .ok_or_else(|| ParseError::InvalidLine(line.to_string()))?;
                Ok(RigctlCommand::SetFrequency { hz })
            }
            Some("_") | Some("\\get_info") => Ok(RigctlCommand::GetInfo),
            _ => Err(ParseError::InvalidLine(line.to_string())),
        }
    }
}

impl fmt::Display for RigctlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RigctlCommand::SetFrequency { hz } => write!(f, "F {}", hz),
            RigctlCommand::GetInfo => write!(f, "_"),
        }
    }
}

/// A single reply line from rigctld
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RigctlReply {
    /// `RPRT <code>` status report, 0 means success
    Status(i32),
    /// Any other line, e.g. the answer to a query
    Value(String),
}

impl RigctlReply {
    /// Parse a reply line (with or without its trailing newline)
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(code) = line.strip_prefix("RPRT ") {
            if let Ok(code) = code.trim().parse::<i32>() {
                return RigctlReply::Status(code);
            }
        }
        RigctlReply::Value(line.to_string())
    }

    /// Check whether this reply reports success
    pub fn is_ok(&self) -> bool {
        match self {
            RigctlReply::Status(code) => *code == 0,
            RigctlReply::Value(_) => true,
        }
    }

    /// Encode this reply as a newline-terminated line
    pub fn encode(&self) -> Vec<u8> {
        match self {
            RigctlReply::Status(code) => format!("RPRT {}\n", code).into_bytes(),
            RigctlReply::Value(value) => format!("{}\n", value).into_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_set_frequency() {
        let cmd = RigctlCommand::SetFrequency { hz: 14_066_560 };
        assert_eq!(cmd.encode(), b"F 14066560\n".to_vec());
    }

    #[test]
    fn test_encode_get_info() {
        assert_eq!(RigctlCommand::GetInfo.encode(), b"_\n".to_vec());
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            RigctlCommand::parse("F 7067000\n"),
            Ok(RigctlCommand::SetFrequency { hz: 7_067_000 })
        );
        assert_eq!(
            RigctlCommand::parse("\\set_freq 7067000.000000"),
            Ok(RigctlCommand::SetFrequency { hz: 7_067_000 })
        );
        assert_eq!(RigctlCommand::parse("_"), Ok(RigctlCommand::GetInfo));
        assert!(RigctlCommand::parse("F").is_err());
        assert!(RigctlCommand::parse("F abc").is_err());
        assert!(RigctlCommand::parse("M USB 2400").is_err());
    }

    #[test]
    fn test_parse_replies() {
        assert_eq!(RigctlReply::parse("RPRT 0\n"), RigctlReply::Status(0));
        assert_eq!(RigctlReply::parse("RPRT -11"), RigctlReply::Status(-11));
        assert_eq!(
            RigctlReply::parse("IC-7610\n"),
            RigctlReply::Value("IC-7610".to_string())
        );
        assert!(RigctlReply::Status(0).is_ok());
        assert!(!RigctlReply::Status(-1).is_ok());
    }

    #[test]
    fn test_reply_encode() {
        assert_eq!(RigctlReply::Status(0).encode(), b"RPRT 0\n".to_vec());
        assert_eq!(
            RigctlReply::Value("IC-7610".into()).encode(),
            b"IC-7610\n".to_vec()
        );
    }
}
