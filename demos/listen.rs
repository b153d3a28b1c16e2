//! Long-lived listener.
//!
//! Demonstrates:
//! - Building a Listener for a given or random channel
//! - Subscribing to lifecycle events
//! - Surviving reconnects until Ctrl+C
//!
//! Usage:
//!   cargo run --example listen
//!   cargo run --example listen -- --channel my-channel-id
//!   cargo run --example listen -- --service http://localhost:8080 --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use anyhow::Context;
use buoy_client::{ChannelAddress, Listener, ListenerEvent};
use common::Args;
use tokio::sync::broadcast::error::RecvError;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== Listen ===\n");

    let address = match args.channel {
        Some(channel) => ChannelAddress::new(&args.service, channel),
        None => ChannelAddress::random(&args.service),
    }
    .context("invalid channel address")?;

    println!("[1] Listening on {address}");
    println!("    Send with: curl -d 'hello' {}\n", address.delivery_url()?);

    let listener = Listener::builder()
        .address(address)
        .auto_connect(false)
        .build()
        .context("failed to build listener")?;

    let mut events = listener.subscribe();
    listener.connect();

    println!("[2] Waiting for messages (Ctrl+C to exit)...\n");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            event = events.recv() => match event {
                Ok(ListenerEvent::Connected) => println!("    ✓ connected"),
                Ok(ListenerEvent::Disconnected) => println!("    ✗ disconnected"),
                Ok(ListenerEvent::Message(message)) => println!("    → {message}"),
                Ok(ListenerEvent::Error(e)) => println!("    ! {e} ({})", e.code()),
                Err(RecvError::Lagged(skipped)) => println!("    ! skipped {skipped} events"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    listener.disconnect();
    println!("\n[3] Disconnected");

    Ok(())
}
