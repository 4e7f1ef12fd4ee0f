//! Drawing relay server.
//!
//! Rebroadcasts drawing events between connected clients and hands each
//! newcomer a snapshot of the surface taken from an existing peer.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tegaki-server
//! cargo run --bin tegaki-server -- --host 0.0.0.0 --port 3000 --bootstrap-timeout-ms 5000
//! ```

use std::{sync::Arc, time::Duration};

use clap::{Parser, ValueEnum};
use tegaki_server::{
    domain::{BootstrapSourceSelector, NewestPeer, OldestPeer},
    infrastructure::registry::InMemoryConnectionRegistry,
    ui::Server,
    usecase::{DEFAULT_BOOTSTRAP_TIMEOUT, MessageRelay, StateBootstrap},
};
use tegaki_shared::logger::setup_logger;

/// Which ready peer is asked for its surface when a client joins.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum BootstrapSource {
    /// The peer connected the longest
    Oldest,
    /// The most recently joined peer
    Newest,
}

impl BootstrapSource {
    fn selector(self) -> Arc<dyn BootstrapSourceSelector> {
        match self {
            BootstrapSource::Oldest => Arc::new(OldestPeer),
            BootstrapSource::Newest => Arc::new(NewestPeer),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "tegaki-server")]
#[command(about = "Relay server for a shared real-time drawing surface", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// How long a joining client waits for a peer's snapshot, in milliseconds
    #[arg(long, default_value_t = DEFAULT_BOOTSTRAP_TIMEOUT.as_millis() as u64)]
    bootstrap_timeout_ms: u64,

    /// Which ready peer to ask for the current surface
    #[arg(long, value_enum, default_value = "oldest")]
    bootstrap_source: BootstrapSource,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. ConnectionRegistry
    // 2. UseCases
    // 3. Server

    // 1. Create ConnectionRegistry (in-memory)
    let registry = Arc::new(InMemoryConnectionRegistry::new(
        args.bootstrap_source.selector(),
    ));

    // 2. Create UseCases
    let bootstrap_timeout = Duration::from_millis(args.bootstrap_timeout_ms);
    let bootstrap = Arc::new(StateBootstrap::new(registry.clone(), bootstrap_timeout));
    let relay = Arc::new(MessageRelay::new(registry, bootstrap));
    tracing::info!(
        "Bootstrap source: {:?}, timeout: {:?}",
        args.bootstrap_source,
        bootstrap_timeout
    );

    // 3. Create and run the server
    let server = Server::new(relay);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
