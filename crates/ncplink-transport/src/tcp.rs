//! TCP-carried byte transport (the Ethernet collaborator).
//!
//! A background tokio task bridges the socket to the same bounded byte
//! queues the driver transports use, so the channel core sees an identical
//! non-blocking interface regardless of the physical link. The task owns
//! the stream; the [`TcpTransport`] handed to the channel is plain sync.

use std::io;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, warn};
use ncplink_channel::{ByteTransport, TransportError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::queue::DEFAULT_QUEUE_DEPTH;

/// Byte transport over a TCP connection.
pub struct TcpTransport {
    rx: Receiver<u8>,
    tx: mpsc::Sender<Vec<u8>>,
}

impl TcpTransport {
    /// Connect to `addr` and spawn the bridge task on the current runtime.
    pub async fn connect(addr: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        debug!("connected to {}", addr);
        Ok(Self::from_stream(stream))
    }

    /// Wrap an already-established stream (e.g. an accepted connection on
    /// the module side of a test rig).
    pub fn from_stream(stream: TcpStream) -> Self {
        let (rx_producer, rx) = bounded(DEFAULT_QUEUE_DEPTH);
        let (tx, tx_consumer) = mpsc::channel::<Vec<u8>>(64);

        tokio::spawn(async move {
            if let Err(e) = run_bridge(stream, rx_producer, tx_consumer).await {
                warn!("tcp bridge terminated: {}", e);
            }
        });

        TcpTransport { rx, tx }
    }
}

impl ByteTransport for TcpTransport {
    fn bytes_available(&self) -> bool {
        !self.rx.is_empty()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.try_recv().ok()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        match self.tx.try_send(bytes.to_vec()) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(TransportError::BufferFull),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(TransportError::Disconnected),
        }
    }
}

/// Pump bytes between the socket and the queues until either side closes.
async fn run_bridge(
    mut stream: TcpStream,
    rx_producer: Sender<u8>,
    mut tx_consumer: mpsc::Receiver<Vec<u8>>,
) -> io::Result<()> {
    let (mut reader, mut writer) = stream.split();
    let mut read_buf = [0u8; 1024];

    loop {
        tokio::select! {
            result = reader.read(&mut read_buf) => {
                match result {
                    Ok(0) => {
                        // Connection closed by peer.
                        return Ok(());
                    }
                    Ok(n) => {
                        for &byte in &read_buf[..n] {
                            match rx_producer.try_send(byte) {
                                Ok(()) => {}
                                Err(TrySendError::Full(_)) => {
                                    warn!("rx queue full, dropping received byte");
                                }
                                Err(TrySendError::Disconnected(_)) => return Ok(()),
                            }
                        }
                    }
                    Err(e) => return Err(e),
                }
            }

            outgoing = tx_consumer.recv() => {
                match outgoing {
                    Some(data) => {
                        writer.write_all(&data).await?;
                        // Control bytes and frames must hit the wire now,
                        // not on some later flush.
                        writer.flush().await?;
                    }
                    None => {
                        // Transport dropped; nothing left to send.
                        return Ok(());
                    }
                }
            }
        }
    }
}
