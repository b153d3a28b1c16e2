//! Send to and receive from the same channel.
//!
//! Demonstrates:
//! - Single-shot receive with a timeout
//! - Delivery with `require_delivery`
//! - Cancelling a receive with a token
//!
//! Usage:
//!   cargo run --example send_receive
//!   cargo run --example send_receive -- --service http://localhost:8080 --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::Context;
use buoy_client::{
    CancellationToken, ChannelAddress, Encoding, Listener, ReceiveOptions, SendOptions, Sender,
};
use common::Args;
use serde_json::json;

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
    println!("=== Send / Receive ===\n");

    let address = ChannelAddress::random(&args.service)?;
    println!("[1] Channel: {address}\n");

    // ========================================================================
    // Receive one JSON message
    // ========================================================================

    println!("[2] Receiving with a 30s timeout...");

    let receiver = tokio::spawn(
        Listener::builder()
            .address(address.clone())
            .encoding(Encoding::Json)
            .receive(ReceiveOptions::new().with_timeout(Duration::from_secs(30))),
    );

    let sender = Sender::with_default_client(address.clone());
    let options = SendOptions::new()
        .with_timeout(Duration::from_secs(10))
        .with_require_delivery(true);

    let result = sender
        .send(json!({"hello": "world"}), &options)
        .await
        .context("send failed")?;
    println!("    ✓ Sent ({result})");

    let message = receiver.await.context("receiver panicked")??;
    println!("    ✓ Received {message}\n");

    // ========================================================================
    // Cancelled receive
    // ========================================================================

    println!("[3] Receiving, cancelled after 1s...");

    let token = CancellationToken::new();
    let receive = Listener::builder()
        .address(address)
        .receive(ReceiveOptions::new().with_cancel(token.clone()));

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
    });

    match receive.await {
        Err(e) if e.is_cancelled() => println!("    ✓ {e}"),
        other => anyhow::bail!("expected cancellation, got {other:?}"),
    }

    Ok(())
}
