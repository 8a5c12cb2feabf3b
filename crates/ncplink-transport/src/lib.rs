//! # ncplink-transport
//!
//! Byte-level collaborators for the NCP frame channel. The channel core
//! (`ncplink-channel`) only ever consumes already-buffered bytes through
//! the `ByteTransport` trait; this crate supplies the implementations:
//!
//! - [`QueueTransport`] — bounded queues to a platform driver (UART, SPI);
//!   the driver's receive interrupt feeds the [`DriverHandle`], the poll
//!   loop consumes.
//! - [`loopback_pair`] — two queue transports wired back to back, for
//!   tests and host-only integration.
//! - [`TcpTransport`] — the Ethernet collaborator, bridging a tokio
//!   `TcpStream` into the same queues.

pub mod queue;
pub mod tcp;

pub use queue::{loopback_pair, DriverHandle, QueueTransport, DEFAULT_QUEUE_DEPTH};
pub use tcp::TcpTransport;
