//! Channel configuration.

use serde::{Deserialize, Serialize};

/// Default deadline for the peer's ACK after a transmit.
pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 1600;
/// Default maximum inter-byte gap while assembling a frame.
pub const DEFAULT_BYTE_TIMEOUT_MS: u64 = 150;
/// Default retransmission bound (total attempts = retries + 1).
pub const DEFAULT_MAX_RETRIES: u8 = 2;
/// Default window during which an identical incoming frame is treated as a
/// stale retransmission. Sized to the same order of magnitude as
/// `ack_timeout * retries` on the peer side.
pub const DEFAULT_DEDUP_WINDOW_MS: u64 = 500;

/// Which byte-level collaborator carries the link.
///
/// Opaque to the channel core; the host application selects the matching
/// transport implementation at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Serial UART link.
    Uart,
    /// SPI link.
    Spi,
    /// TCP-carried link.
    Ethernet,
}

/// Tunables for one frame channel (one per physical link).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Deadline in milliseconds for the peer's ACK after a transmit.
    pub ack_timeout_ms: u64,
    /// Maximum inter-byte gap in milliseconds while assembling a frame.
    pub byte_timeout_ms: u64,
    /// Retransmission attempts per frame after the initial send.
    pub max_retries: u8,
    /// Window in milliseconds for duplicate-frame suppression.
    pub dedup_window_ms: u64,
    /// Byte-level collaborator carrying the link.
    pub transport: TransportKind,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
            byte_timeout_ms: DEFAULT_BYTE_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            dedup_window_ms: DEFAULT_DEDUP_WINDOW_MS,
            transport: TransportKind::Uart,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChannelConfig::default();
        assert_eq!(config.ack_timeout_ms, 1600);
        assert_eq!(config.byte_timeout_ms, 150);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.transport, TransportKind::Uart);
    }
}
