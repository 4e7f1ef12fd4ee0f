//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::usecase::MessageRelay;

use super::{handler::websocket_handler, signal::shutdown_signal, state::AppState};

/// Path of the single WebSocket endpoint.
pub const WS_PATH: &str = "/ws";

/// Drawing relay server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(relay);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// MessageRelay（受信メッセージ振り分けのユースケース）
    relay: Arc<MessageRelay>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(relay: Arc<MessageRelay>) -> Self {
        Self { relay }
    }

    /// Build the router exposing only the WebSocket endpoint.
    pub fn router(&self) -> Router {
        let app_state = Arc::new(AppState {
            relay: self.relay.clone(),
        });

        Router::new()
            .route(WS_PATH, get(websocket_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();

        tracing::info!("Drawing relay listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }

    /// Serve on an already bound listener until Ctrl+C.
    pub async fn serve(self, listener: TcpListener) -> Result<(), Box<dyn std::error::Error>> {
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve_with_shutdown(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    /// Run the drawing relay server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;
        tracing::info!("Connect to: ws://{}{}", bind_addr, WS_PATH);

        self.serve(listener).await
    }
}
