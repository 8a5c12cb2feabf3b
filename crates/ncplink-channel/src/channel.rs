//! The poll-driven frame channel.
//!
//! [`CommChannel`] ties the receive assembler, transmit controller, and
//! duplicate filter together over one byte transport. A host application
//! calls [`CommChannel::poll`] repeatedly from a cooperative loop or timer
//! tick; nothing here blocks, and time is only ever observed inside
//! `poll` by comparing deadlines against the channel's clock.
//!
//! Delivered frames are pushed into the bounded crossbeam channel supplied
//! at construction; the dispatcher drains it at its own pace.

use crossbeam_channel::{Sender, TrySendError};
use log::{debug, warn};
use ncplink_protocol::{ControlByte, Frame, FrameKind};

use crate::assembler::{RxAssembler, RxEvent};
use crate::clock::Clock;
use crate::config::ChannelConfig;
use crate::dedup::{DedupFilter, Screen};
use crate::error::ChannelError;
use crate::transmitter::{TransmitHandle, TxController, TxEvent};
use crate::transport::ByteTransport;

/// The most significant thing that happened during one `poll` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing notable happened.
    Idle,
    /// A valid frame was received and delivered.
    FrameReceived,
    /// The outstanding transmission was ACKed by the peer.
    FrameSent,
    /// A frame arrived with a checksum error and was NAKed.
    FrameError,
    /// A partial frame stalled past the byte timeout and was discarded.
    RxTimeout,
    /// The outstanding transmission failed (retries exhausted or cancelled).
    TxTimeout,
}

impl PollOutcome {
    /// Received frames outrank transmit completions, which outrank error
    /// and timeout bookkeeping.
    fn significance(self) -> u8 {
        match self {
            PollOutcome::FrameReceived => 5,
            PollOutcome::FrameSent => 4,
            PollOutcome::FrameError => 3,
            PollOutcome::RxTimeout => 2,
            PollOutcome::TxTimeout => 1,
            PollOutcome::Idle => 0,
        }
    }

    fn merge(self, other: PollOutcome) -> PollOutcome {
        if other.significance() > self.significance() {
            other
        } else {
            self
        }
    }
}

/// A reliable, ordered, duplex frame channel over an unreliable byte pipe.
///
/// One instance per physical link. The channel owns its receive buffer and
/// its single outstanding transmission; all state is touched only from
/// `poll` and `transmit`, so a single logical thread of control drives it.
pub struct CommChannel<T: ByteTransport, C: Clock> {
    transport: T,
    clock: C,
    config: ChannelConfig,
    assembler: RxAssembler,
    transmitter: TxController,
    dedup: DedupFilter,
    delivery: Sender<Frame>,
}

impl<T: ByteTransport, C: Clock> CommChannel<T, C> {
    /// Create a channel over `transport`, delivering received frames into
    /// `delivery`.
    pub fn new(transport: T, clock: C, config: ChannelConfig, delivery: Sender<Frame>) -> Self {
        CommChannel {
            transport,
            clock,
            config,
            assembler: RxAssembler::new(),
            transmitter: TxController::new(),
            dedup: DedupFilter::new(),
            delivery,
        }
    }

    /// Current ACK deadline in milliseconds.
    pub fn ack_timeout_ms(&self) -> u64 {
        self.config.ack_timeout_ms
    }

    /// Adjust the ACK deadline at runtime.
    pub fn set_ack_timeout_ms(&mut self, ms: u64) {
        self.config.ack_timeout_ms = ms;
    }

    /// Current inter-byte deadline in milliseconds.
    pub fn byte_timeout_ms(&self) -> u64 {
        self.config.byte_timeout_ms
    }

    /// Adjust the inter-byte deadline at runtime.
    pub fn set_byte_timeout_ms(&mut self, ms: u64) {
        self.config.byte_timeout_ms = ms;
    }

    /// Whether a transmission is awaiting acknowledgement.
    pub fn is_busy(&self) -> bool {
        self.transmitter.is_busy()
    }

    /// Validate, encode, and send a frame, returning a handle that reports
    /// acknowledgement and completion.
    ///
    /// Rejected with [`ChannelError::Busy`] while a previous transmission
    /// is outstanding, and with a protocol error if the payload is too
    /// large. Neither rejection performs any I/O.
    pub fn transmit(
        &mut self,
        kind: FrameKind,
        command: u8,
        payload: Vec<u8>,
    ) -> Result<TransmitHandle, ChannelError> {
        let frame = Frame::new(kind, command, payload)?;
        let now_ms = self.clock.now_ms();
        self.transmitter
            .transmit(&frame, &mut self.transport, now_ms, self.config.ack_timeout_ms)
    }

    /// Drive the channel: drain available transport bytes through the
    /// assembler, then check the receive and transmit deadlines.
    ///
    /// Never blocks. Returns the most significant outcome observed during
    /// this call.
    pub fn poll(&mut self) -> PollOutcome {
        let mut outcome = PollOutcome::Idle;

        while let Some(byte) = self.transport.read_byte() {
            let now_ms = self.clock.now_ms();
            match self.assembler.push_byte(byte, now_ms) {
                RxEvent::Pending | RxEvent::Noise => {}
                RxEvent::Control(ctrl) => {
                    outcome = outcome.merge(self.handle_control(ctrl, now_ms));
                }
                RxEvent::Frame(frame) => {
                    outcome = outcome.merge(self.handle_frame(frame, now_ms));
                }
                RxEvent::ChecksumFailed => {
                    self.send_control(ControlByte::Nak);
                    outcome = outcome.merge(PollOutcome::FrameError);
                }
            }
        }

        let now_ms = self.clock.now_ms();
        if self
            .assembler
            .check_timeout(now_ms, self.config.byte_timeout_ms)
        {
            outcome = outcome.merge(PollOutcome::RxTimeout);
        }

        // check_timeout only ever retransmits or exhausts the budget.
        if let Some(TxEvent::Exhausted) = self.transmitter.check_timeout(
            &mut self.transport,
            now_ms,
            self.config.ack_timeout_ms,
            self.config.max_retries,
        ) {
            outcome = outcome.merge(PollOutcome::TxTimeout);
        }

        outcome
    }

    /// React to a control byte seen between frames.
    fn handle_control(&mut self, ctrl: ControlByte, now_ms: u64) -> PollOutcome {
        match self.transmitter.handle_control(
            ctrl,
            &mut self.transport,
            now_ms,
            self.config.ack_timeout_ms,
            self.config.max_retries,
        ) {
            Some(TxEvent::Acked) => PollOutcome::FrameSent,
            Some(TxEvent::Exhausted) | Some(TxEvent::Cancelled) => PollOutcome::TxTimeout,
            Some(TxEvent::Retransmitted) | None => PollOutcome::Idle,
        }
    }

    /// Screen a completed frame and deliver it if it is not a stale
    /// retransmission. Every delivery decision is ACKed exactly once,
    /// duplicates included.
    fn handle_frame(&mut self, frame: Frame, now_ms: u64) -> PollOutcome {
        match self
            .dedup
            .screen(&frame, now_ms, self.config.dedup_window_ms)
        {
            Screen::Deliver => {
                self.send_control(ControlByte::Ack);
                match self.delivery.try_send(frame) {
                    Ok(()) => {}
                    Err(TrySendError::Full(frame)) => {
                        // Link-level ACK already went out; backpressure is
                        // the dispatcher's problem, not the peer's.
                        warn!(
                            "delivery queue full, dropping frame cmd 0x{:02X}",
                            frame.command
                        );
                    }
                    Err(TrySendError::Disconnected(frame)) => {
                        warn!(
                            "delivery queue disconnected, dropping frame cmd 0x{:02X}",
                            frame.command
                        );
                    }
                }
                PollOutcome::FrameReceived
            }
            Screen::Duplicate => {
                debug!("re-acking duplicate frame cmd 0x{:02X}", frame.command);
                self.send_control(ControlByte::Ack);
                PollOutcome::Idle
            }
        }
    }

    /// Emit a single control byte, logging on transport failure.
    fn send_control(&mut self, ctrl: ControlByte) {
        if let Err(err) = self.transport.write(&[ctrl.to_byte()]) {
            warn!("failed to send {:?}: {}", ctrl, err);
        }
    }
}
