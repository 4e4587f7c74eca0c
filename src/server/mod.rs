//! HTTP surface over the conversation phases.
//!
//! | Route                       | Phase                               |
//! |-----------------------------|-------------------------------------|
//! | `POST /api/respond`         | direct response, buffered           |
//! | `POST /api/respond/stream`  | direct response, streamed           |
//! | `POST /api/tools/detect`    | tool detection                      |
//! | `POST /api/tools/continue`  | tool dispatch plus streamed answer  |
//! | `GET  /api/tools`           | tool catalog                        |
//! | `GET  /health`              | liveness                            |

mod handlers;
mod wire;

use crate::config::ServerConfig;
use crate::conversation::Conversation;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// State shared by every handler.
pub struct AppState {
    conversation: Conversation,
    shutdown: CancellationToken,
}

type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(conversation: Conversation, shutdown: CancellationToken) -> Self {
        Self {
            conversation,
            shutdown,
        }
    }

    /// Token for one in-flight request. Server shutdown cancels it too.
    fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

/// Build the router. `cors` adds a permissive CORS layer for browser clients.
pub fn router(state: AppState, cors: bool) -> Router {
    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/tools", get(handlers::list_tools))
        .route("/api/respond", post(handlers::respond))
        .route("/api/respond/stream", post(handlers::respond_stream))
        .route("/api/tools/detect", post(handlers::detect))
        .route("/api/tools/continue", post(handlers::continue_with_tool))
        .with_state(Arc::new(state));

    if cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}

/// Bind `config.listen` and serve until `shutdown` fires.
pub async fn serve(
    config: &ServerConfig,
    conversation: Conversation,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.listen).await?;
    info!(addr = %listener.local_addr()?, cors = config.cors, "listening");

    let app = router(AppState::new(conversation, shutdown.clone()), config.cors);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("server stopped");
    Ok(())
}
