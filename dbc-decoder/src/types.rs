//! Core types for the DBC decoder library
//!
//! This module defines the error type shared by the parser and the signal
//! codec. Parse errors abort the whole parse call; decode errors only affect
//! the single decode call that raised them.

use std::fmt;

/// Result type for parser and decoder operations
pub type Result<T> = std::result::Result<T, DbcError>;

/// Errors that can occur while parsing a DBC file or decoding a frame
#[derive(Debug, thiserror::Error)]
pub enum DbcError {
    #[error("Input is not a DBC file")]
    NonDbcFormat,

    #[error("Missing VERSION header")]
    MissingVersionHeader,

    #[error("Missing bit timing section (BS_:)")]
    MissingBitTiming,

    #[error("Missing node list (BU_:)")]
    MissingNodeList,

    #[error("Unknown message: CAN ID 0x{0:X}")]
    UnknownMessageId(u32),

    #[error("Payload too long: {0} bytes (maximum is 8)")]
    PayloadTooLong(usize),

    #[error("Big-endian signal '{0}' is not supported by this decoder configuration")]
    UnsupportedEndianness(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse category of a [`DbcError`], for callers that branch on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input is not recognizable as DBC text at all
    Format,
    /// A required header section is absent
    Structural,
    /// A single decode call failed; the schema is unaffected
    Decode,
    /// The underlying reader failed
    Io,
}

impl DbcError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbcError::NonDbcFormat => ErrorKind::Format,
            DbcError::MissingVersionHeader
            | DbcError::MissingBitTiming
            | DbcError::MissingNodeList => ErrorKind::Structural,
            DbcError::UnknownMessageId(_)
            | DbcError::PayloadTooLong(_)
            | DbcError::UnsupportedEndianness(_) => ErrorKind::Decode,
            DbcError::Io(_) => ErrorKind::Io,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Format => write!(f, "Format"),
            ErrorKind::Structural => write!(f, "Structural"),
            ErrorKind::Decode => write!(f, "Decode"),
            ErrorKind::Io => write!(f, "Io"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(DbcError::NonDbcFormat.kind(), ErrorKind::Format);
        assert_eq!(DbcError::MissingVersionHeader.kind(), ErrorKind::Structural);
        assert_eq!(DbcError::MissingBitTiming.kind(), ErrorKind::Structural);
        assert_eq!(DbcError::MissingNodeList.kind(), ErrorKind::Structural);
        assert_eq!(DbcError::UnknownMessageId(1).kind(), ErrorKind::Decode);
        assert_eq!(DbcError::PayloadTooLong(9).kind(), ErrorKind::Decode);
        assert_eq!(
            DbcError::UnsupportedEndianness("Sig".to_string()).kind(),
            ErrorKind::Decode
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", DbcError::UnknownMessageId(0x21D)),
            "Unknown message: CAN ID 0x21D"
        );
        assert_eq!(
            format!("{}", DbcError::PayloadTooLong(12)),
            "Payload too long: 12 bytes (maximum is 8)"
        );
        assert_eq!(format!("{}", ErrorKind::Structural), "Structural");
    }
}
