use crate::auth::Authenticator;
use crate::broadcaster::Broadcaster;
use crate::middleware::{cors_layer, get_tracing_layer, logging_middleware};
use crate::routes::{documents, health, stream};
use axum::{middleware::from_fn, routing::get, Router};
use catalog_common::*;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub snapshot_path: Arc<PathBuf>,
    pub broadcaster: Arc<Broadcaster>,
    pub authenticator: Arc<dyn Authenticator>,
}

pub struct CatalogServer {
    state: AppState,
    config: ServerConfig,
}

impl CatalogServer {
    pub fn new(
        config: &SystemConfig,
        broadcaster: Arc<Broadcaster>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            state: AppState {
                snapshot_path: Arc::new(config.indexing.snapshot_path.clone()),
                broadcaster,
                authenticator,
            },
            config: config.server.clone(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/documents", get(documents::list_documents))
            .route("/ws", get(stream::websocket_handler))
            .route("/health", get(health::health_check))
            .layer(from_fn(logging_middleware))
            .layer(get_tracing_layer())
            .layer(cors_layer(&self.config))
            .with_state(self.state.clone())
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_address()).await?;
        self.serve(listener, shutdown).await
    }

    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!("Catalog server listening on http://{}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Catalog server stopped");
        Ok(())
    }
}
