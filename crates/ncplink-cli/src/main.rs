//! Host-side diagnostic tool.
//!
//! Connects to a radio module over TCP (the Ethernet transport), transmits
//! one command frame, and polls the channel until the transmission
//! completes and a response frame (if any) arrives. Useful for poking at a
//! module or a simulator without a full host application.
//!
//! ```text
//! ncplink --connect 127.0.0.1:5000 0x04 01a0ff
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::bounded;
use ncplink_channel::{
    ChannelConfig, CommChannel, MonotonicClock, TransmitStatus, TransportKind, TxFailure,
};
use ncplink_protocol::FrameKind;
use ncplink_transport::TcpTransport;

/// How often the cooperative loop gives the channel a turn.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Parser)]
#[command(name = "ncplink", about = "Send a serial API frame to an NCP radio module")]
struct Args {
    /// Module address (host:port).
    #[arg(long, default_value = "127.0.0.1:5000")]
    connect: String,

    /// Command identifier, decimal or 0x-prefixed hex.
    #[arg(value_parser = parse_byte)]
    command: u8,

    /// Payload as a hex string, e.g. 01a0ff.
    #[arg(default_value = "")]
    payload: String,

    /// Optional YAML file with channel tunables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// How long to wait for a response frame after delivery, in ms.
    #[arg(long, default_value_t = 3000)]
    response_timeout_ms: u64,
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x") {
        Some(hex_part) => u8::from_str_radix(hex_part, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| format!("not a byte value: {}", s))
}

fn load_config(path: Option<&PathBuf>) -> Result<ChannelConfig, Box<dyn Error>> {
    let mut config = match path {
        Some(path) => serde_yaml::from_str(&std::fs::read_to_string(path)?)?,
        None => ChannelConfig::default(),
    };
    config.transport = TransportKind::Ethernet;
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let payload = hex::decode(&args.payload)?;
    let config = load_config(args.config.as_ref())?;

    // The bridge task lives on this runtime; the poll loop below is plain
    // blocking code.
    let runtime = tokio::runtime::Runtime::new()?;
    let transport = runtime.block_on(TcpTransport::connect(&args.connect))?;

    let (delivery_tx, delivery_rx) = bounded(16);
    let mut channel = CommChannel::new(transport, MonotonicClock::new(), config, delivery_tx);

    eprintln!(
        "-> cmd 0x{:02X}, {} payload byte(s)",
        args.command,
        payload.len()
    );
    let handle = channel.transmit(FrameKind::Request, args.command, payload)?;

    // Phase 1: drive the channel until the transmission completes.
    let status = loop {
        channel.poll();
        match handle.status() {
            TransmitStatus::InFlight => std::thread::sleep(POLL_INTERVAL),
            done => break done,
        }
    };
    match status {
        TransmitStatus::Delivered => eprintln!("<- ack"),
        TransmitStatus::Failed(TxFailure::Timeout) => {
            return Err("no ack from module (retries exhausted)".into());
        }
        _ => {
            return Err("module cancelled the transmission".into());
        }
    }

    // Phase 2: wait for a response frame.
    let deadline = Instant::now() + Duration::from_millis(args.response_timeout_ms);
    while Instant::now() < deadline {
        channel.poll();
        if let Ok(frame) = delivery_rx.try_recv() {
            println!(
                "{:?} cmd=0x{:02X} payload={}",
                frame.kind,
                frame.command,
                hex::encode(&frame.payload)
            );
            return Ok(());
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    eprintln!("no response frame within {} ms", args.response_timeout_ms);
    Ok(())
}
