//! # ncplink-channel
//!
//! Reliable, ordered, duplex frame channel between a host processor and an
//! NCP radio module, carried over an unreliable byte pipe (UART, SPI, or
//! Ethernet). Turns the raw byte transport into a request/response/
//! notification channel with bounded memory and poll-driven timeouts.
//!
//! The moving parts, leaves first:
//!
//! - [`assembler::RxAssembler`] — byte-at-a-time receive state machine
//! - [`transmitter::TxController`] — single-frame-in-flight ACK/retry control
//! - [`dedup::DedupFilter`] — stale-retransmission suppression
//! - [`channel::CommChannel`] — the poll driver tying them together
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ncplink_channel::{ChannelConfig, CommChannel, MonotonicClock, TransmitStatus};
//! use ncplink_protocol::FrameKind;
//!
//! let (delivery_tx, delivery_rx) = crossbeam_channel::bounded(16);
//! let mut channel = CommChannel::new(
//!     transport,
//!     MonotonicClock::new(),
//!     ChannelConfig::default(),
//!     delivery_tx,
//! );
//!
//! let handle = channel.transmit(FrameKind::Request, 0x04, vec![0x01, 0x02])?;
//! loop {
//!     channel.poll();
//!     if handle.is_done() {
//!         break;
//!     }
//! }
//! for frame in delivery_rx.try_iter() {
//!     // hand off to the command dispatcher
//! }
//! ```
//!
//! No operation in this crate blocks or allocates beyond one receive buffer
//! and one encoded outstanding frame; `poll()` is safe to call from a
//! periodic tick.

pub mod assembler;
pub mod channel;
pub mod clock;
pub mod config;
pub mod dedup;
pub mod error;
pub mod transmitter;
pub mod transport;

pub use channel::{CommChannel, PollOutcome};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{ChannelConfig, TransportKind};
pub use error::ChannelError;
pub use transmitter::{TransmitHandle, TransmitStatus, TxFailure};
pub use transport::{ByteTransport, TransportError};
