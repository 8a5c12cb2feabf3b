//! End-to-end tests for the poll-driven frame channel.
//!
//! These drive a `CommChannel` against a scripted in-memory transport and a
//! manually advanced clock, so every timeout path is deterministic.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crossbeam_channel::{bounded, Receiver};
use ncplink_channel::{
    ByteTransport, ChannelConfig, CommChannel, ManualClock, PollOutcome, TransmitStatus,
    TransportError, TxFailure,
};
use ncplink_protocol::{Frame, FrameKind, ACK, NAK};

#[derive(Default)]
struct ScriptedInner {
    rx: VecDeque<u8>,
    writes: Vec<Vec<u8>>,
}

/// Transport double the test can feed and inspect while the channel owns a
/// clone of it.
#[derive(Clone, Default)]
struct ScriptedTransport {
    inner: Rc<RefCell<ScriptedInner>>,
}

impl ScriptedTransport {
    fn feed(&self, bytes: &[u8]) {
        self.inner.borrow_mut().rx.extend(bytes.iter().copied());
    }

    fn writes(&self) -> Vec<Vec<u8>> {
        self.inner.borrow().writes.clone()
    }

    /// Count single-byte control writes with the given value.
    fn control_count(&self, value: u8) -> usize {
        self.inner
            .borrow()
            .writes
            .iter()
            .filter(|w| w.as_slice() == [value])
            .count()
    }

    /// Writes that look like frames (more than one byte).
    fn frame_writes(&self) -> Vec<Vec<u8>> {
        self.inner
            .borrow()
            .writes
            .iter()
            .filter(|w| w.len() > 1)
            .cloned()
            .collect()
    }
}

impl ByteTransport for ScriptedTransport {
    fn bytes_available(&self) -> bool {
        !self.inner.borrow().rx.is_empty()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.inner.borrow_mut().rx.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.inner.borrow_mut().writes.push(bytes.to_vec());
        Ok(())
    }
}

struct Fixture {
    channel: CommChannel<ScriptedTransport, ManualClock>,
    transport: ScriptedTransport,
    clock: ManualClock,
    delivered: Receiver<Frame>,
}

fn fixture(config: ChannelConfig) -> Fixture {
    let transport = ScriptedTransport::default();
    let clock = ManualClock::new();
    let (tx, rx) = bounded(16);
    let channel = CommChannel::new(transport.clone(), clock.clone(), config, tx);
    Fixture {
        channel,
        transport,
        clock,
        delivered: rx,
    }
}

fn wire(kind: FrameKind, command: u8, payload: &[u8]) -> Vec<u8> {
    Frame::new(kind, command, payload.to_vec())
        .unwrap()
        .encode()
        .unwrap()
}

#[test]
fn test_idle_poll() {
    let mut f = fixture(ChannelConfig::default());
    assert_eq!(f.channel.poll(), PollOutcome::Idle);
}

#[test]
fn test_receive_delivers_and_acks() {
    let mut f = fixture(ChannelConfig::default());
    f.transport.feed(&wire(FrameKind::Request, 0x04, &[1, 2]));

    assert_eq!(f.channel.poll(), PollOutcome::FrameReceived);

    let frame = f.delivered.try_recv().unwrap();
    assert_eq!(frame.command, 0x04);
    assert_eq!(frame.payload, vec![1, 2]);
    assert_eq!(f.transport.control_count(ACK), 1);
}

#[test]
fn test_corrupted_frame_naked_not_delivered() {
    let mut f = fixture(ChannelConfig::default());
    let mut bytes = wire(FrameKind::Request, 0x04, &[1, 2]);
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    f.transport.feed(&bytes);

    assert_eq!(f.channel.poll(), PollOutcome::FrameError);
    assert!(f.delivered.try_recv().is_err());
    assert_eq!(f.transport.control_count(NAK), 1);
    assert_eq!(f.transport.control_count(ACK), 0);
}

#[test]
fn test_duplicate_one_delivery_two_acks() {
    let mut f = fixture(ChannelConfig::default());
    let bytes = wire(FrameKind::Request, 0x04, &[1, 2]);

    f.transport.feed(&bytes);
    assert_eq!(f.channel.poll(), PollOutcome::FrameReceived);

    f.clock.advance_ms(100);
    f.transport.feed(&bytes);
    // Re-acked but not re-delivered.
    assert_eq!(f.channel.poll(), PollOutcome::Idle);

    assert_eq!(f.delivered.try_iter().count(), 1);
    assert_eq!(f.transport.control_count(ACK), 2);
}

#[test]
fn test_repeat_after_window_is_new_delivery() {
    let config = ChannelConfig {
        dedup_window_ms: 500,
        ..ChannelConfig::default()
    };
    let mut f = fixture(config);
    let bytes = wire(FrameKind::Request, 0x04, &[1, 2]);

    f.transport.feed(&bytes);
    assert_eq!(f.channel.poll(), PollOutcome::FrameReceived);

    f.clock.advance_ms(600);
    f.transport.feed(&bytes);
    assert_eq!(f.channel.poll(), PollOutcome::FrameReceived);

    assert_eq!(f.delivered.try_iter().count(), 2);
}

#[test]
fn test_transmit_acked() {
    let mut f = fixture(ChannelConfig::default());
    let handle = f
        .channel
        .transmit(FrameKind::Request, 0x04, vec![1, 2])
        .unwrap();
    assert_eq!(handle.status(), TransmitStatus::InFlight);

    f.transport.feed(&[ACK]);
    assert_eq!(f.channel.poll(), PollOutcome::FrameSent);
    assert_eq!(handle.status(), TransmitStatus::Delivered);
    assert!(handle.acked());
}

#[test]
fn test_transmit_busy_until_done() {
    let mut f = fixture(ChannelConfig::default());
    let _handle = f
        .channel
        .transmit(FrameKind::Request, 0x04, vec![])
        .unwrap();
    assert!(f.channel.is_busy());
    assert!(f.channel.transmit(FrameKind::Request, 0x05, vec![]).is_err());

    f.transport.feed(&[ACK]);
    f.channel.poll();
    assert!(!f.channel.is_busy());
    assert!(f.channel.transmit(FrameKind::Request, 0x05, vec![]).is_ok());
}

#[test]
fn test_silent_peer_exhausts_retries() {
    // max_retries = 2: three identical transmissions, then failure.
    let config = ChannelConfig {
        ack_timeout_ms: 1000,
        max_retries: 2,
        ..ChannelConfig::default()
    };
    let mut f = fixture(config);
    let handle = f
        .channel
        .transmit(FrameKind::Request, 0x04, vec![9])
        .unwrap();

    f.clock.advance_ms(1000);
    assert_eq!(f.channel.poll(), PollOutcome::Idle); // retransmission 1
    f.clock.advance_ms(1000);
    assert_eq!(f.channel.poll(), PollOutcome::Idle); // retransmission 2
    f.clock.advance_ms(1000);
    assert_eq!(f.channel.poll(), PollOutcome::TxTimeout);

    let frames = f.transport.frame_writes();
    assert_eq!(frames.len(), 3);
    assert!(frames.iter().all(|w| w == &frames[0]));
    assert_eq!(handle.status(), TransmitStatus::Failed(TxFailure::Timeout));

    // The channel remains usable for the next transmission.
    assert!(f.channel.transmit(FrameKind::Request, 0x05, vec![]).is_ok());
}

#[test]
fn test_nak_triggers_single_retransmission() {
    let mut f = fixture(ChannelConfig::default());
    let handle = f
        .channel
        .transmit(FrameKind::Request, 0x04, vec![7])
        .unwrap();

    f.transport.feed(&[NAK]);
    assert_eq!(f.channel.poll(), PollOutcome::Idle);
    assert_eq!(f.transport.frame_writes().len(), 2);

    f.transport.feed(&[ACK]);
    assert_eq!(f.channel.poll(), PollOutcome::FrameSent);
    assert_eq!(handle.status(), TransmitStatus::Delivered);
}

#[test]
fn test_can_aborts_outstanding_transmission() {
    let mut f = fixture(ChannelConfig::default());
    let handle = f
        .channel
        .transmit(FrameKind::Request, 0x04, vec![7])
        .unwrap();

    f.transport.feed(&[ncplink_protocol::CAN]);
    assert_eq!(f.channel.poll(), PollOutcome::TxTimeout);
    assert_eq!(
        handle.status(),
        TransmitStatus::Failed(TxFailure::Cancelled)
    );
    assert!(!f.channel.is_busy());
}

#[test]
fn test_byte_timeout_then_clean_reassembly() {
    let config = ChannelConfig {
        byte_timeout_ms: 150,
        ..ChannelConfig::default()
    };
    let mut f = fixture(config);
    let bytes = wire(FrameKind::Request, 0x04, &[1, 2, 3]);

    // First half of a frame, then a stall past the byte deadline.
    f.transport.feed(&bytes[..4]);
    assert_eq!(f.channel.poll(), PollOutcome::Idle);
    f.clock.advance_ms(200);
    assert_eq!(f.channel.poll(), PollOutcome::RxTimeout);
    assert!(f.delivered.try_recv().is_err());

    // A complete, well-formed frame afterwards assembles normally.
    f.transport.feed(&bytes);
    assert_eq!(f.channel.poll(), PollOutcome::FrameReceived);
    assert_eq!(f.delivered.try_recv().unwrap().payload, vec![1, 2, 3]);
}

#[test]
fn test_received_frame_outranks_tx_timeout() {
    // A received frame and an exhausted transmission in the same poll:
    // FrameReceived is the more significant outcome.
    let config = ChannelConfig {
        ack_timeout_ms: 1000,
        max_retries: 0,
        ..ChannelConfig::default()
    };
    let mut f = fixture(config);
    let _handle = f
        .channel
        .transmit(FrameKind::Request, 0x04, vec![])
        .unwrap();

    f.clock.advance_ms(1000);
    f.transport.feed(&wire(FrameKind::Response, 0x04, &[0x42]));
    assert_eq!(f.channel.poll(), PollOutcome::FrameReceived);
}

#[test]
fn test_noise_before_frame_is_harmless() {
    let mut f = fixture(ChannelConfig::default());
    f.transport.feed(&[0xFF, 0x55, 0x7E]);
    f.transport.feed(&wire(FrameKind::Request, 0x04, &[1]));

    assert_eq!(f.channel.poll(), PollOutcome::FrameReceived);
    assert_eq!(f.delivered.try_iter().count(), 1);
}

#[test]
fn test_runtime_timeout_tunables() {
    let mut f = fixture(ChannelConfig::default());
    assert_eq!(f.channel.ack_timeout_ms(), 1600);
    f.channel.set_ack_timeout_ms(800);
    assert_eq!(f.channel.ack_timeout_ms(), 800);

    assert_eq!(f.channel.byte_timeout_ms(), 150);
    f.channel.set_byte_timeout_ms(250);
    assert_eq!(f.channel.byte_timeout_ms(), 250);
}

#[test]
fn test_oversized_payload_rejected_before_io() {
    let mut f = fixture(ChannelConfig::default());
    let err = f
        .channel
        .transmit(FrameKind::Request, 0x04, vec![0; 178])
        .unwrap_err();
    assert!(matches!(err, ncplink_channel::ChannelError::Protocol(_)));
    assert!(f.transport.writes().is_empty());
    assert!(!f.channel.is_busy());
}

#[test]
fn test_duplex_receive_while_awaiting_ack() {
    // An incoming frame from the peer must be handled while our own
    // transmission is still awaiting its ACK.
    let mut f = fixture(ChannelConfig::default());
    let handle = f
        .channel
        .transmit(FrameKind::Request, 0x04, vec![1])
        .unwrap();

    f.transport.feed(&wire(FrameKind::Request, 0x20, &[5]));
    assert_eq!(f.channel.poll(), PollOutcome::FrameReceived);
    assert_eq!(handle.status(), TransmitStatus::InFlight);

    f.transport.feed(&[ACK]);
    assert_eq!(f.channel.poll(), PollOutcome::FrameSent);
    assert_eq!(handle.status(), TransmitStatus::Delivered);
}
