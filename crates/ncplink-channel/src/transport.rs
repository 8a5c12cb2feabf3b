//! Byte transport boundary.
//!
//! The channel core only ever consumes bytes that the transport has already
//! buffered; it never blocks waiting for more. If the real driver is
//! interrupt-fed, the bounded queue between the ISR and the poll loop lives
//! on the transport side of this trait (see `ncplink-transport`), making it
//! the single concurrency boundary in the system.

use thiserror::Error;

/// Errors reported by a byte-level transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The peer side of the transport is gone.
    #[error("transport disconnected")]
    Disconnected,

    /// The outgoing buffer cannot accept more bytes right now.
    #[error("transport write buffer full")]
    BufferFull,

    /// Underlying driver I/O failure.
    #[error("transport I/O error: {0}")]
    Io(String),
}

/// A non-blocking byte pipe to the peer.
///
/// `read_byte` and `write` must return immediately; the poll driver calls
/// them from a cooperative loop with hard timing requirements.
pub trait ByteTransport {
    /// Whether at least one received byte is waiting.
    fn bytes_available(&self) -> bool;

    /// Take the next received byte, if any.
    fn read_byte(&mut self) -> Option<u8>;

    /// Queue bytes for transmission to the peer.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}
