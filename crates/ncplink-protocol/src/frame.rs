//! Frame encoding and decoding.
//!
//! A serial API frame carries one command or response between the host and
//! the radio module:
//!
//! ```text
//! | Field    | Size (bytes)                | Description                               |
//! |----------|-----------------------------|-------------------------------------------|
//! | SOF      | 1                           | Start of frame marker (0x01).             |
//! | length   | 1                           | payload_len + 3 (kind, command, checksum).|
//! | kind     | 1                           | Request (0x00) or Response (0x01).        |
//! | command  | 1                           | Function identifier, dispatcher-defined.  |
//! | payload  | up to 177 (`MAX_PAYLOAD_SIZE`) | Command parameters.                    |
//! | checksum | 1                           | ~XOR of length through last payload byte. |
//! ```
//!
//! The ACK, NAK, and CAN control bytes travel outside this structure as
//! single bytes and are modeled by [`ControlByte`].

use crate::constants::*;
use crate::error::ProtocolError;

/// Whether a frame initiates an exchange or answers one.
///
/// Both sides may send requests: the host to issue commands, the module to
/// push unsolicited notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Host command or module notification.
    Request,
    /// Reply to a request.
    Response,
}

impl FrameKind {
    /// Wire encoding of this kind.
    pub fn to_byte(self) -> u8 {
        match self {
            FrameKind::Request => FRAME_KIND_REQUEST,
            FrameKind::Response => FRAME_KIND_RESPONSE,
        }
    }

    /// Decode a kind byte.
    pub fn from_byte(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            FRAME_KIND_REQUEST => Ok(FrameKind::Request),
            FRAME_KIND_RESPONSE => Ok(FrameKind::Response),
            other => Err(ProtocolError::InvalidKind(other)),
        }
    }
}

/// Single-byte control symbols exchanged outside frame structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlByte {
    /// Frame received and verified.
    Ack,
    /// Frame received with checksum error.
    Nak,
    /// Abort the outstanding transmission.
    Can,
}

impl ControlByte {
    /// Recognize a control byte. Returns `None` for SOF and noise bytes.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            ACK => Some(ControlByte::Ack),
            NAK => Some(ControlByte::Nak),
            CAN => Some(ControlByte::Can),
            _ => None,
        }
    }

    /// Wire value of this control byte.
    pub fn to_byte(self) -> u8 {
        match self {
            ControlByte::Ack => ACK,
            ControlByte::Nak => NAK,
            ControlByte::Can => CAN,
        }
    }
}

/// One complete, checksum-validated unit of application data.
///
/// Frames are immutable once built; a new value is produced per
/// transmission and per successful reception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Request or response.
    pub kind: FrameKind,
    /// Function identifier, meaning defined by the dispatcher.
    pub command: u8,
    /// Command parameters, up to [`MAX_PAYLOAD_SIZE`] bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Build a frame, validating the payload length.
    pub fn new(kind: FrameKind, command: u8, payload: Vec<u8>) -> Result<Self, ProtocolError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                max: MAX_PAYLOAD_SIZE,
                actual: payload.len(),
            });
        }
        Ok(Frame {
            kind,
            command,
            payload,
        })
    }

    /// Value of the wire length field for this frame.
    pub fn length_field(&self) -> u8 {
        (self.payload.len() + 3) as u8
    }

    /// Encode to wire bytes: `[SOF, length, kind, command, payload…, checksum]`.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        if self.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                max: MAX_PAYLOAD_SIZE,
                actual: self.payload.len(),
            });
        }

        let mut buf = Vec::with_capacity(self.payload.len() + FRAME_OVERHEAD);
        buf.push(SOF);
        buf.push(self.length_field());
        buf.push(self.kind.to_byte());
        buf.push(self.command);
        buf.extend_from_slice(&self.payload);
        buf.push(checksum(&buf[1..]));
        Ok(buf)
    }

    /// Decode and validate a complete wire frame.
    ///
    /// Expects exactly one frame starting at the SOF byte. A checksum
    /// mismatch is reported without consuming stream position; resync is
    /// the receive assembler's job.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < FRAME_OVERHEAD {
            return Err(ProtocolError::FrameTooShort {
                expected: FRAME_OVERHEAD,
                actual: bytes.len(),
            });
        }
        if bytes[0] != SOF {
            return Err(ProtocolError::MissingSof(bytes[0]));
        }

        let length = bytes[1];
        if !(FRAME_LENGTH_MIN..=FRAME_LENGTH_MAX).contains(&length) {
            return Err(ProtocolError::InvalidLength(length));
        }
        // Everything after SOF and the length byte: kind, command, payload, checksum.
        if bytes.len() - 2 != length as usize {
            return Err(ProtocolError::LengthMismatch {
                declared: length as usize,
                actual: bytes.len() - 2,
            });
        }

        let received = bytes[bytes.len() - 1];
        let computed = checksum(&bytes[1..bytes.len() - 1]);
        if received != computed {
            return Err(ProtocolError::ChecksumMismatch {
                expected: computed,
                actual: received,
            });
        }

        let kind = FrameKind::from_byte(bytes[2])?;
        Ok(Frame {
            kind,
            command: bytes[3],
            payload: bytes[4..bytes.len() - 1].to_vec(),
        })
    }
}

/// Compute the frame checksum over the covered span (length field through
/// the last payload byte).
///
/// Running XOR seeded with 0xFF, which is the bitwise complement of the
/// plain XOR of the span. Any single corrupted bit in the span flips the
/// result.
pub fn checksum(covered: &[u8]) -> u8 {
    covered.iter().fold(0xFF, |acc, &b| acc ^ b)
}
