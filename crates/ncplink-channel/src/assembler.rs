//! Byte-at-a-time receive frame assembly.
//!
//! The assembler consumes bytes handed to it by the poll driver and walks
//! one frame at a time through
//! `WaitSof → WaitLength → WaitKind → WaitCommand → WaitPayload → WaitChecksum`.
//! Terminal outcomes (a completed frame, a checksum failure, a framing
//! error, or an inter-byte timeout) reset it to `WaitSof`, so the worst a
//! malformed or stalled frame can cost is one receive buffer.
//!
//! Control bytes (ACK/NAK/CAN) are only meaningful between frames; seen
//! while in `WaitSof` they are reported to the caller, seen mid-frame they
//! are ordinary payload data.

use bytes::BytesMut;
use log::{debug, warn};
use ncplink_protocol::{
    checksum, ControlByte, Frame, FrameKind, FRAME_LENGTH_MAX, FRAME_LENGTH_MIN,
    RECEIVE_BUFFER_SIZE, SOF,
};

/// Receive state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxState {
    /// Idle, waiting for a frame or control byte.
    WaitSof,
    /// SOF seen, waiting for the length field.
    WaitLength,
    /// Waiting for the kind byte.
    WaitKind,
    /// Waiting for the command byte.
    WaitCommand,
    /// Collecting payload bytes.
    WaitPayload {
        /// Payload bytes still expected.
        remaining: u8,
    },
    /// Waiting for the checksum byte.
    WaitChecksum,
}

/// Outcome of feeding one byte to the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RxEvent {
    /// Byte consumed, frame still incomplete.
    Pending,
    /// A control byte arrived between frames.
    Control(ControlByte),
    /// A complete frame passed checksum validation.
    Frame(Frame),
    /// A complete frame failed checksum validation and was discarded.
    ChecksumFailed,
    /// A byte that cannot start or continue a frame was discarded.
    Noise,
}

/// Assembles frames from the incoming byte stream.
///
/// One instance per channel, created at initialization and reused for the
/// life of the link. The receive buffer is allocated once and cleared
/// between frames, never reallocated.
#[derive(Debug)]
pub struct RxAssembler {
    state: RxState,
    /// Covered span of the frame under assembly: length, kind, command,
    /// payload. Exactly the bytes the checksum is computed over.
    buffer: BytesMut,
    /// Time the most recent byte arrived, valid outside `WaitSof`.
    last_byte_ms: u64,
}

impl RxAssembler {
    /// Create an idle assembler.
    pub fn new() -> Self {
        RxAssembler {
            state: RxState::WaitSof,
            buffer: BytesMut::with_capacity(RECEIVE_BUFFER_SIZE),
            last_byte_ms: 0,
        }
    }

    /// Current state, for observability.
    pub fn state(&self) -> RxState {
        self.state
    }

    /// Whether a frame is partially assembled.
    pub fn mid_frame(&self) -> bool {
        self.state != RxState::WaitSof
    }

    /// Feed one byte into the state machine.
    pub fn push_byte(&mut self, byte: u8, now_ms: u64) -> RxEvent {
        if self.mid_frame() {
            self.last_byte_ms = now_ms;
        }

        match self.state {
            RxState::WaitSof => {
                if byte == SOF {
                    self.state = RxState::WaitLength;
                    // Arm the inter-byte deadline.
                    self.last_byte_ms = now_ms;
                    return RxEvent::Pending;
                }
                if let Some(ctrl) = ControlByte::from_byte(byte) {
                    return RxEvent::Control(ctrl);
                }
                debug!("discarding noise byte 0x{:02X}", byte);
                RxEvent::Noise
            }

            RxState::WaitLength => {
                if !(FRAME_LENGTH_MIN..=FRAME_LENGTH_MAX).contains(&byte) {
                    // The length field itself is untrustworthy, so no NAK;
                    // resync to the next recognized lead byte.
                    warn!("invalid length field 0x{:02X}, resyncing", byte);
                    self.reset();
                    return RxEvent::Noise;
                }
                self.buffer.extend_from_slice(&[byte]);
                self.state = RxState::WaitKind;
                RxEvent::Pending
            }

            RxState::WaitKind => {
                self.buffer.extend_from_slice(&[byte]);
                self.state = RxState::WaitCommand;
                RxEvent::Pending
            }

            RxState::WaitCommand => {
                self.buffer.extend_from_slice(&[byte]);
                let payload_len = self.buffer[0] - 3;
                self.state = if payload_len == 0 {
                    RxState::WaitChecksum
                } else {
                    RxState::WaitPayload {
                        remaining: payload_len,
                    }
                };
                RxEvent::Pending
            }

            RxState::WaitPayload { remaining } => {
                self.buffer.extend_from_slice(&[byte]);
                if remaining > 1 {
                    self.state = RxState::WaitPayload {
                        remaining: remaining - 1,
                    };
                } else {
                    self.state = RxState::WaitChecksum;
                }
                RxEvent::Pending
            }

            RxState::WaitChecksum => self.complete(byte),
        }
    }

    /// Validate the checksum byte and produce the terminal event.
    fn complete(&mut self, received: u8) -> RxEvent {
        let computed = checksum(&self.buffer);
        if received != computed {
            warn!(
                "checksum mismatch: expected 0x{:02X}, got 0x{:02X}",
                computed, received
            );
            self.reset();
            return RxEvent::ChecksumFailed;
        }

        let kind = match FrameKind::from_byte(self.buffer[1]) {
            Ok(kind) => kind,
            Err(_) => {
                // Checksum-valid but structurally unknown; a NAK would make
                // the peer retransmit the same thing forever.
                warn!("unknown frame kind 0x{:02X}, discarding frame", self.buffer[1]);
                self.reset();
                return RxEvent::Noise;
            }
        };

        let frame = Frame {
            kind,
            command: self.buffer[2],
            payload: self.buffer[3..].to_vec(),
        };
        self.reset();
        RxEvent::Frame(frame)
    }

    /// Check the inter-byte deadline. Returns true if a partial frame was
    /// discarded because the gap since the last byte exceeded
    /// `byte_timeout_ms`.
    pub fn check_timeout(&mut self, now_ms: u64, byte_timeout_ms: u64) -> bool {
        if self.mid_frame() && now_ms.saturating_sub(self.last_byte_ms) > byte_timeout_ms {
            warn!("rx byte timeout in {:?}, discarding partial frame", self.state);
            self.reset();
            return true;
        }
        false
    }

    /// Return to idle, keeping the buffer allocation.
    fn reset(&mut self) {
        self.state = RxState::WaitSof;
        self.buffer.clear();
    }
}

impl Default for RxAssembler {
    fn default() -> Self {
        Self::new()
    }
}
