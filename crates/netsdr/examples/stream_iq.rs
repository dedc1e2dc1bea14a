//! Stream IQ samples from a NetSDR receiver.
//!
//! Connects to the receiver's command port, tunes to a frequency, starts
//! IQ streaming, and reports the datagram rate for a fixed window. This
//! is useful for verifying network throughput before wiring the stream
//! into a DSP chain.
//!
//! # Requirements
//!
//! - A NetSDR-compatible receiver reachable on the LAN
//! - Addresses adjusted for your setup
//!
//! # Usage
//!
//! ```sh
//! cargo run -p netsdr --example stream_iq
//! ```

use std::time::Duration;

use netsdr::{NetSdrClient, TcpControlChannel, UdpDataChannel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let control_addr = "192.168.1.100:50000";
    let data_port = 60000;
    let freq_hz: u64 = 14_074_000;

    println!("Connecting to receiver at {}...", control_addr);

    let client = NetSdrClient::new(
        Box::new(TcpControlChannel::new(control_addr)),
        Box::new(UdpDataChannel::new(data_port)),
    );
    client.connect().await?;
    println!("Connected.");

    client.change_frequency(freq_hz, 0).await?;
    println!("Tuned channel 0 to {:.3} MHz", freq_hz as f64 / 1_000_000.0);

    let mut iq = client.subscribe_iq();
    client.start_iq_streaming().await?;
    println!("Streaming IQ for 10 seconds...\n");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    let mut datagrams: u64 = 0;
    let mut bytes: u64 = 0;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }

        match tokio::time::timeout(remaining, iq.recv()).await {
            Ok(Ok(payload)) => {
                datagrams += 1;
                bytes += payload.len() as u64;
            }
            Ok(Err(tokio::sync::broadcast::error::RecvError::Lagged(n))) => {
                println!("(missed {} datagrams due to lag)", n);
            }
            Ok(Err(tokio::sync::broadcast::error::RecvError::Closed)) => {
                println!("IQ stream closed.");
                break;
            }
            Err(_) => break,
        }
    }

    println!(
        "Received {} datagrams, {:.1} KiB/s",
        datagrams,
        bytes as f64 / 1024.0 / 10.0
    );

    client.stop_iq_streaming().await?;
    client.disconnect().await?;
    println!("Disconnected.");
    Ok(())
}
