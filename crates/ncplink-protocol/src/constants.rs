//! Protocol constants
//!
//! These constants define the framing bytes, field encodings, and size
//! limits of the NCP serial API wire format.

// ============================================================================
// Framing Bytes
// ============================================================================

/// Start of frame marker.
pub const SOF: u8 = 0x01;
/// Acknowledge - frame received and checksum verified.
pub const ACK: u8 = 0x06;
/// Negative acknowledge - frame received with bad checksum.
pub const NAK: u8 = 0x15;
/// Cancel - abort the outstanding transmission.
pub const CAN: u8 = 0x18;

// ============================================================================
// Frame Kind Encoding
// ============================================================================

/// Wire encoding of a request frame (host-initiated or unsolicited).
pub const FRAME_KIND_REQUEST: u8 = 0x00;
/// Wire encoding of a response frame (reply to a request).
pub const FRAME_KIND_RESPONSE: u8 = 0x01;

// ============================================================================
// Size Limits
// ============================================================================

/// Size of the receive buffer on the module side.
pub const RECEIVE_BUFFER_SIZE: usize = 180;

/// Smallest valid value of the length field (kind + command + checksum).
pub const FRAME_LENGTH_MIN: u8 = 3;

/// Largest valid value of the length field.
pub const FRAME_LENGTH_MAX: u8 = RECEIVE_BUFFER_SIZE as u8;

/// Maximum payload bytes per frame.
///
/// The length field covers kind, command, payload, and checksum, so the
/// payload may use everything the length field can express minus those
/// three bytes.
pub const MAX_PAYLOAD_SIZE: usize = RECEIVE_BUFFER_SIZE - 3;

/// Bytes of framing around the payload on the wire: SOF, length, kind,
/// command, and checksum.
pub const FRAME_OVERHEAD: usize = 5;
