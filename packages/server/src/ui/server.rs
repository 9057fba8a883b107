//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        create_room, create_user, get_room, get_room_by_link, get_room_presence, get_user,
        health_check, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Watch party relay server
///
/// # Example
///
/// ```ignore
/// let state = Arc::new(AppState::new(registry, RelayConfig::default()));
/// Server::new(state).run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// ルーティングを組み立てる（テストからも使う）
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/users", post(create_user))
            .route("/api/users/{user_id}", get(get_user))
            .route("/api/rooms", post(create_room))
            .route("/api/rooms/{room_id}", get(get_room))
            .route("/api/rooms/{room_id}/presence", get(get_room_presence))
            .route("/api/rooms/by-link/{link}", get(get_room_by_link))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the relay server
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
        let app = self.router();

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Sajiki relay listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws?userId=<user id>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // 保留中の自動クローズ・書き込みは実行せずに破棄する
        self.state.shutdown().await;
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
