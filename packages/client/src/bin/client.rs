//! Interactive drawing client.
//!
//! Joins the relay, receives the current surface from a peer and then shares
//! every stroke typed at the prompt. The surface lives in memory and can be
//! printed with `show`.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tegaki-client
//! cargo run --bin tegaki-client -- -u ws://127.0.0.1:3000/ws --width 120 --height 80
//! ```

use clap::Parser;

use tegaki_client::engine::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use tegaki_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tegaki-client")]
#[command(about = "CLI client for a shared real-time drawing surface", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Surface width in pixels
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: u16,

    /// Surface height in pixels
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = tegaki_client::run_client(args.url, args.width, args.height).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
