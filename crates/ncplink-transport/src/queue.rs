//! Bounded byte-queue transport.
//!
//! [`QueueTransport`] is the consumer side of two bounded channels: one fed
//! by the platform driver (UART or SPI receive interrupt), one drained by
//! it (driver transmit path). The queues are the single concurrency
//! boundary in the system: the ISR produces, the poll loop consumes, and
//! neither side ever blocks.
//!
//! [`loopback_pair`] cross-wires two queue transports for tests and
//! host-only integration, the same trick the simulator plays when it wires
//! a firmware UART to a TCP client.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use log::warn;
use ncplink_channel::{ByteTransport, TransportError};

/// Default queue depth, sized to hold a few maximum-length frames.
pub const DEFAULT_QUEUE_DEPTH: usize = 512;

/// Driver-facing side of a [`QueueTransport`].
///
/// Cloneable so the receive ISR and the transmit driver loop can each hold
/// one. `inject` is the ISR path and never blocks.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    rx_producer: Sender<u8>,
    tx_consumer: Receiver<u8>,
}

impl DriverHandle {
    /// Push received bytes toward the channel core. Bytes that do not fit
    /// are dropped with a warning; the framing layer recovers from the gap
    /// via checksum and timeout.
    pub fn inject(&self, bytes: &[u8]) {
        for &byte in bytes {
            match self.rx_producer.try_send(byte) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!("rx queue full, dropping received byte");
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    /// Take one byte the channel core has queued for transmission.
    pub fn try_take(&self) -> Option<u8> {
        self.tx_consumer.try_recv().ok()
    }

    /// Drain everything queued for transmission.
    pub fn drain(&self) -> Vec<u8> {
        self.tx_consumer.try_iter().collect()
    }
}

/// Byte transport backed by bounded queues to a platform driver.
#[derive(Debug)]
pub struct QueueTransport {
    rx: Receiver<u8>,
    tx: Sender<u8>,
}

impl QueueTransport {
    /// Create a transport and its driver-facing handle, with `depth` bytes
    /// of buffering in each direction.
    pub fn with_driver(depth: usize) -> (QueueTransport, DriverHandle) {
        let (rx_producer, rx) = bounded(depth);
        let (tx, tx_consumer) = bounded(depth);
        (
            QueueTransport { rx, tx },
            DriverHandle {
                rx_producer,
                tx_consumer,
            },
        )
    }
}

impl ByteTransport for QueueTransport {
    fn bytes_available(&self) -> bool {
        !self.rx.is_empty()
    }

    fn read_byte(&mut self) -> Option<u8> {
        match self.rx.try_recv() {
            Ok(byte) => Some(byte),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        for &byte in bytes {
            match self.tx.try_send(byte) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => return Err(TransportError::BufferFull),
                Err(TrySendError::Disconnected(_)) => return Err(TransportError::Disconnected),
            }
        }
        Ok(())
    }
}

/// Two queue transports wired back to back: whatever one writes, the other
/// reads. `depth` bytes of buffering in each direction.
pub fn loopback_pair(depth: usize) -> (QueueTransport, QueueTransport) {
    let (a_to_b_tx, a_to_b_rx) = bounded(depth);
    let (b_to_a_tx, b_to_a_rx) = bounded(depth);
    (
        QueueTransport {
            rx: b_to_a_rx,
            tx: a_to_b_tx,
        },
        QueueTransport {
            rx: a_to_b_rx,
            tx: b_to_a_tx,
        },
    )
}
