//! Monitor client events and unsolicited receiver messages.
//!
//! Demonstrates subscribing to the client event stream and printing all
//! events as they arrive while stepping the receiver through a few
//! frequency changes. Useful for debugging what a particular receiver
//! sends outside the request/reply cycle.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p netsdr --example monitor_events
//! ```

use std::time::Duration;

use netsdr::{ClientEvent, NetSdrClient, TcpControlChannel, UdpDataChannel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let control_addr = "192.168.1.100:50000";

    let client = NetSdrClient::new(
        Box::new(TcpControlChannel::new(control_addr)),
        Box::new(UdpDataChannel::new(60000)),
    );

    let mut events = client.subscribe();

    println!("Connecting to receiver at {}...", control_addr);
    client.connect().await?;

    // Generate some traffic: step across the 20 m FT8/FT4 segment.
    for freq_hz in [14_074_000u64, 14_080_000, 14_090_000] {
        client.change_frequency(freq_hz, 0).await?;
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    println!("Monitoring events for 30 seconds...\n");
    let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
    let start = tokio::time::Instant::now();

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }

        match tokio::time::timeout(remaining, events.recv()).await {
            Ok(Ok(event)) => {
                let elapsed = start.elapsed();
                let timestamp = format!("{:>4}.{:03}s", elapsed.as_secs(), elapsed.subsec_millis());

                match event {
                    ClientEvent::Connected => println!("{} Connected", timestamp),
                    ClientEvent::Disconnected => {
                        println!("{} Disconnected", timestamp);
                        break;
                    }
                    ClientEvent::StreamingStarted => println!("{} StreamingStarted", timestamp),
                    ClientEvent::StreamingStopped => println!("{} StreamingStopped", timestamp),
                    ClientEvent::Unsolicited(msg) => {
                        // Data items can show up on the control channel
                        // if a receiver is configured for TCP IQ output.
                        let label = if netsdr::items::is_data_item(&msg) {
                            "data"
                        } else {
                            "control"
                        };
                        println!(
                            "{} Unsolicited {:<7} kind={:?} item={:?} params={:02X?}",
                            timestamp, label, msg.kind, msg.item, msg.params
                        );
                    }
                }
            }
            Ok(Err(tokio::sync::broadcast::error::RecvError::Lagged(n))) => {
                println!("(missed {} events due to lag)", n);
            }
            Ok(Err(tokio::sync::broadcast::error::RecvError::Closed)) => break,
            Err(_) => break,
        }
    }

    client.disconnect().await?;
    println!("\nMonitoring complete.");
    Ok(())
}
