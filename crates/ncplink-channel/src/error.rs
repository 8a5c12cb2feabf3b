//! Channel error types.

use crate::transport::TransportError;
use ncplink_protocol::ProtocolError;
use thiserror::Error;

/// Errors returned by channel operations.
///
/// None of these are fatal to the link: `Busy` and `Protocol` are caller
/// errors rejected before any I/O, and a `Transport` failure affects only
/// the operation that hit it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// A frame is already in flight; the protocol is single-frame-in-flight.
    #[error("transmitter busy: a frame is already awaiting acknowledgement")]
    Busy,

    /// Frame encoding or validation failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The byte transport rejected the write.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
