//! NCP Serial API Frame Format
//!
//! This crate provides the wire format used between a host processor and an
//! NCP radio module over a raw byte transport (UART, SPI, or Ethernet).
//! Application data travels in checksummed frames; link bookkeeping travels
//! in single control bytes (ACK, NAK, CAN) outside frame structure.
//!
//! # Example
//!
//! ```rust
//! use ncplink_protocol::{Frame, FrameKind};
//!
//! let frame = Frame::new(FrameKind::Request, 0x04, vec![0x01, 0x02])?;
//! let wire = frame.encode()?;
//! let back = Frame::decode(&wire)?;
//! assert_eq!(back, frame);
//! # Ok::<(), ncplink_protocol::ProtocolError>(())
//! ```
//!
//! The reliability machinery on top of this format (receive assembly,
//! acknowledgement, retransmission, duplicate suppression) lives in
//! `ncplink-channel`.

mod constants;
mod error;
mod frame;

pub use constants::*;
pub use error::*;
pub use frame::*;
