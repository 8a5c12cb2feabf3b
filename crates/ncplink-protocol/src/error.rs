//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when encoding or decoding serial API frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload exceeds the maximum a frame can carry.
    #[error("payload too large: maximum {max} bytes, got {actual}")]
    PayloadTooLarge {
        /// Maximum allowed payload length.
        max: usize,
        /// Actual payload length supplied.
        actual: usize,
    },

    /// Frame is too short to be valid.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Length field is outside the valid range.
    #[error("invalid length field: 0x{0:02X}")]
    InvalidLength(u8),

    /// Length field does not match the number of bytes supplied.
    #[error("length mismatch: length field says {declared} bytes, buffer holds {actual}")]
    LengthMismatch {
        /// Byte count declared by the length field.
        declared: usize,
        /// Byte count actually present after the length field.
        actual: usize,
    },

    /// First byte is not the SOF marker.
    #[error("missing SOF: got 0x{0:02X}")]
    MissingSof(u8),

    /// Unknown frame kind byte.
    #[error("unknown frame kind: 0x{0:02X}")]
    InvalidKind(u8),

    /// Checksum verification failed.
    #[error("checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch {
        /// Checksum computed over the received bytes.
        expected: u8,
        /// Checksum byte carried by the frame.
        actual: u8,
    },
}
