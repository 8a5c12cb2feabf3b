//! Transmit and acknowledgement control.
//!
//! The link is strictly single-frame-in-flight: at most one outstanding
//! transmission exists, and a second `transmit` is rejected with `Busy`
//! until the first completes. Completion is exposed as a value rather than
//! a callback: [`TransmitHandle`] is a cheap clone over shared atomics that
//! the caller polls between `poll()` invocations.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use ncplink_protocol::{ControlByte, Frame};

use crate::error::ChannelError;
use crate::transport::ByteTransport;

// Status codes stored in the shared atomic.
const STATUS_IN_FLIGHT: u8 = 0;
const STATUS_DELIVERED: u8 = 1;
const STATUS_TIMED_OUT: u8 = 2;
const STATUS_CANCELLED: u8 = 3;

/// Why a transmission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxFailure {
    /// Retry budget exhausted without an ACK.
    Timeout,
    /// The peer sent CAN; the caller must re-issue explicitly.
    Cancelled,
}

/// Completion state of one transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitStatus {
    /// Awaiting acknowledgement (possibly mid-retry).
    InFlight,
    /// The peer acknowledged the frame.
    Delivered,
    /// The transmission failed; the link itself remains usable.
    Failed(TxFailure),
}

#[derive(Debug, Default)]
struct TxShared {
    status: AtomicU8,
    acked: AtomicBool,
}

/// Handle for observing one transmission's completion.
///
/// Remains valid after the transmission completes; `status()` then reports
/// the final outcome forever.
#[derive(Debug, Clone)]
pub struct TransmitHandle {
    shared: Arc<TxShared>,
}

impl TransmitHandle {
    /// Current completion state.
    pub fn status(&self) -> TransmitStatus {
        match self.shared.status.load(Ordering::Acquire) {
            STATUS_IN_FLIGHT => TransmitStatus::InFlight,
            STATUS_DELIVERED => TransmitStatus::Delivered,
            STATUS_TIMED_OUT => TransmitStatus::Failed(TxFailure::Timeout),
            _ => TransmitStatus::Failed(TxFailure::Cancelled),
        }
    }

    /// Whether the transmission has reached a final outcome.
    pub fn is_done(&self) -> bool {
        self.status() != TransmitStatus::InFlight
    }

    /// Whether the peer's ACK has been seen. Latches true exactly once,
    /// the first time a matching ACK arrives.
    pub fn acked(&self) -> bool {
        self.shared.acked.load(Ordering::Acquire)
    }
}

/// Link-level transmit events surfaced to the poll driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxEvent {
    /// The outstanding frame was ACKed.
    Acked,
    /// The identical bytes were sent again after a NAK or deadline.
    Retransmitted,
    /// Retry budget exhausted; the transmission failed.
    Exhausted,
    /// The peer cancelled the transmission with CAN.
    Cancelled,
}

/// The single in-flight transmission.
#[derive(Debug)]
struct Outstanding {
    /// Exact wire bytes, re-sent unchanged on every retry.
    encoded: Vec<u8>,
    /// Retries performed so far (not counting the initial send).
    retries: u8,
    /// When the current attempt's ACK deadline expires.
    deadline_ms: u64,
    shared: Arc<TxShared>,
}

/// Drives transmission, acknowledgement, and bounded retransmission.
#[derive(Debug, Default)]
pub struct TxController {
    outstanding: Option<Outstanding>,
}

impl TxController {
    /// Create an idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a transmission is awaiting acknowledgement.
    pub fn is_busy(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Encode and send a frame, arming the ACK deadline.
    ///
    /// Returns `ChannelError::Busy` while a previous transmission is still
    /// outstanding.
    pub fn transmit<T: ByteTransport>(
        &mut self,
        frame: &Frame,
        transport: &mut T,
        now_ms: u64,
        ack_timeout_ms: u64,
    ) -> Result<TransmitHandle, ChannelError> {
        if self.is_busy() {
            return Err(ChannelError::Busy);
        }

        let encoded = frame.encode()?;
        transport.write(&encoded)?;
        debug!(
            "transmitted cmd 0x{:02X} ({} bytes), awaiting ack",
            frame.command,
            encoded.len()
        );

        let shared = Arc::new(TxShared::default());
        self.outstanding = Some(Outstanding {
            encoded,
            retries: 0,
            deadline_ms: now_ms + ack_timeout_ms,
            shared: shared.clone(),
        });
        Ok(TransmitHandle { shared })
    }

    /// React to a control byte from the peer.
    pub fn handle_control<T: ByteTransport>(
        &mut self,
        ctrl: ControlByte,
        transport: &mut T,
        now_ms: u64,
        ack_timeout_ms: u64,
        max_retries: u8,
    ) -> Option<TxEvent> {
        if self.outstanding.is_none() {
            // Stray control byte, e.g. a late ACK for a transmission we
            // already gave up on.
            debug!("ignoring control byte {:?} with nothing outstanding", ctrl);
            return None;
        }

        match ctrl {
            ControlByte::Ack => {
                let outstanding = self.outstanding.take()?;
                outstanding.shared.acked.store(true, Ordering::Release);
                outstanding
                    .shared
                    .status
                    .store(STATUS_DELIVERED, Ordering::Release);
                Some(TxEvent::Acked)
            }
            ControlByte::Nak => {
                warn!("peer NAKed outstanding frame");
                self.retry_or_fail(transport, now_ms, ack_timeout_ms, max_retries)
            }
            ControlByte::Can => {
                warn!("peer cancelled outstanding frame");
                let outstanding = self.outstanding.take()?;
                outstanding
                    .shared
                    .status
                    .store(STATUS_CANCELLED, Ordering::Release);
                Some(TxEvent::Cancelled)
            }
        }
    }

    /// Check the ACK deadline, retransmitting or failing as appropriate.
    pub fn check_timeout<T: ByteTransport>(
        &mut self,
        transport: &mut T,
        now_ms: u64,
        ack_timeout_ms: u64,
        max_retries: u8,
    ) -> Option<TxEvent> {
        let expired = matches!(&self.outstanding, Some(o) if now_ms >= o.deadline_ms);
        if !expired {
            return None;
        }
        warn!("ack timeout for outstanding frame");
        self.retry_or_fail(transport, now_ms, ack_timeout_ms, max_retries)
    }

    /// Retransmit the identical bytes if budget remains, otherwise fail the
    /// transmission.
    fn retry_or_fail<T: ByteTransport>(
        &mut self,
        transport: &mut T,
        now_ms: u64,
        ack_timeout_ms: u64,
        max_retries: u8,
    ) -> Option<TxEvent> {
        let mut outstanding = self.outstanding.take()?;

        if outstanding.retries < max_retries {
            outstanding.retries += 1;
            outstanding.deadline_ms = now_ms + ack_timeout_ms;
            match transport.write(&outstanding.encoded) {
                Ok(()) => {
                    debug!("retransmission {}/{}", outstanding.retries, max_retries);
                    self.outstanding = Some(outstanding);
                    return Some(TxEvent::Retransmitted);
                }
                Err(err) => {
                    warn!("retransmission write failed: {}", err);
                    // Fall through to final failure.
                }
            }
        }

        outstanding
            .shared
            .status
            .store(STATUS_TIMED_OUT, Ordering::Release);
        Some(TxEvent::Exhausted)
    }
}
