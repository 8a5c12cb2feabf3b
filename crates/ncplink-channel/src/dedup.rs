//! Duplicate frame suppression.
//!
//! The peer cannot tell "my ACK was lost" from "my frame was lost" and
//! retransmits identically either way. The receiver must not deliver the
//! same frame twice, but must still re-ACK so the peer's retry machinery
//! completes. A repeat arriving after the window has elapsed is a
//! deliberate repeat command from the peer's application layer and is
//! delivered normally.

use log::debug;
use ncplink_protocol::{Frame, FrameKind};

/// Verdict for one received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// New frame; deliver upward and ACK.
    Deliver,
    /// Stale retransmission; ACK but do not deliver.
    Duplicate,
}

/// Identity and arrival time of the most recently delivered frame.
///
/// Replaced wholesale on each delivery, never mutated in place.
#[derive(Debug, Clone)]
struct DedupRecord {
    kind: FrameKind,
    command: u8,
    payload: Vec<u8>,
    seen_at_ms: u64,
}

impl DedupRecord {
    fn matches(&self, frame: &Frame) -> bool {
        self.kind == frame.kind
            && self.command == frame.command
            && self.payload == frame.payload
    }
}

/// Screens received frames against the last delivered one.
#[derive(Debug, Default)]
pub struct DedupFilter {
    last: Option<DedupRecord>,
}

impl DedupFilter {
    /// Create a filter with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `frame` is a fresh delivery or a stale retransmission.
    ///
    /// On `Deliver` the record is replaced with this frame's identity; on
    /// `Duplicate` the record keeps its original arrival time, so the
    /// window is measured from the delivery, not from the latest retry.
    pub fn screen(&mut self, frame: &Frame, now_ms: u64, window_ms: u64) -> Screen {
        if let Some(record) = &self.last {
            if record.matches(frame) && now_ms.saturating_sub(record.seen_at_ms) <= window_ms {
                debug!(
                    "suppressing duplicate of cmd 0x{:02X} ({} ms after delivery)",
                    frame.command,
                    now_ms.saturating_sub(record.seen_at_ms)
                );
                return Screen::Duplicate;
            }
        }

        self.last = Some(DedupRecord {
            kind: frame.kind,
            command: frame.command,
            payload: frame.payload.clone(),
            seen_at_ms: now_ms,
        });
        Screen::Deliver
    }
}
