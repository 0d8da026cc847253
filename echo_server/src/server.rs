//! Server implementation.
//!
//! A stateless axum router over an injected [`EchoStore`]:
//! - `POST /api/save-echo` appends one echo to a user's inventory
//! - `GET /api/inventory/{user_id}` lists it
//! - everything else falls through to the static game client, if present

use std::{
    future::Future,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::Path,
    sync::Arc,
};

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path as UrlPath, State},
    routing::{get, post},
    Json, Router,
};
use echo_shared::{
    api::{InventoryResponse, SaveEchoRequest, SaveEchoResponse, INVENTORY_ROUTE, SAVE_ECHO_PATH},
    config::EchoConfig,
    echo::EchoRecord,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::{debug, info, warn};

use crate::{
    error::ApiError,
    store::{EchoStore, MemoryEchoStore},
};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EchoStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn EchoStore>) -> Self {
        Self { store }
    }
}

/// Builds the full application router.
///
/// `public_dir` is served as a fallback; `/` resolves to its `index.html`.
pub fn build_router(state: AppState, public_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route(SAVE_ECHO_PATH, post(save_echo))
        .route(INVENTORY_ROUTE, get(get_inventory))
        .with_state(state);

    let app = match public_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };
    app.layer(CorsLayer::permissive())
}

async fn save_echo(
    State(state): State<AppState>,
    body: Result<Json<SaveEchoRequest>, JsonRejection>,
) -> Result<Json<SaveEchoResponse>, ApiError> {
    let Json(req) = body?;
    let user_id = req.user_id().ok_or(ApiError::MissingField("userId"))?;
    let echo_type = req.echo_type().ok_or(ApiError::MissingField("type"))?;

    let inventory = state
        .store
        .append(user_id, EchoRecord::new(echo_type))
        .await?;
    info!(user_id, echo_type, count = inventory.len(), "Echo saved");

    Ok(Json(SaveEchoResponse {
        success: true,
        count: inventory.len(),
        inventory,
    }))
}

async fn get_inventory(
    State(state): State<AppState>,
    UrlPath(user_id): UrlPath<String>,
) -> Result<Json<InventoryResponse>, ApiError> {
    let items = state.store.inventory(&user_id).await?;
    debug!(user_id = %user_id, items = items.len(), "Inventory read");
    Ok(Json(InventoryResponse { user_id, items }))
}

/// Echo backend bound to a socket.
pub struct EchoServer {
    pub cfg: EchoConfig,
    listener: TcpListener,
    store: Arc<dyn EchoStore>,
}

impl EchoServer {
    /// Binds with a fresh in-memory store.
    pub async fn bind(cfg: EchoConfig) -> anyhow::Result<Self> {
        Self::with_store(cfg, Arc::new(MemoryEchoStore::new())).await
    }

    /// Binds with a caller-provided store.
    pub async fn with_store(cfg: EchoConfig, store: Arc<dyn EchoStore>) -> anyhow::Result<Self> {
        let addr: SocketAddr = cfg.server_addr.parse().context("parse server_addr")?;
        let listener = TcpListener::bind(addr).await.context("tcp bind")?;
        Ok(Self {
            cfg,
            listener,
            store,
        })
    }

    /// Returns the local address (after binding).
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the backing store.
    pub fn store(&self) -> Arc<dyn EchoStore> {
        Arc::clone(&self.store)
    }

    /// Router for this server's config and store.
    pub fn router(&self) -> Router {
        let public_dir = Path::new(&self.cfg.public_dir);
        let public_dir = if public_dir.is_dir() {
            Some(public_dir)
        } else {
            warn!(dir = %public_dir.display(), "Static directory missing, serving API only");
            None
        };
        build_router(AppState::new(self.store()), public_dir)
    }

    /// Serves until `signal` resolves, then drains in-flight requests.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let local = self.local_addr()?;
        info!(%local, "Echo server listening");
        axum::serve(self.listener, app)
            .with_graceful_shutdown(signal)
            .await
            .context("serve")?;
        info!("Echo server stopped");
        Ok(())
    }
}

/// Applies a `PORT` value as hosting platforms set it. An unparsable value is
/// logged and leaves `cfg` untouched.
pub fn apply_port_override(cfg: EchoConfig, port: Option<&str>) -> EchoConfig {
    let Some(port) = port else {
        return cfg;
    };
    match port.trim().parse::<u16>() {
        Ok(port) => cfg.with_port(port),
        Err(_) => {
            warn!(port, "Ignoring invalid PORT");
            cfg
        }
    }
}

/// Helper for tests: bind to an ephemeral localhost port.
pub async fn bind_ephemeral() -> anyhow::Result<(EchoServer, EchoConfig)> {
    let cfg = EchoConfig {
        server_addr: format!("{}:{}", IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
        ..Default::default()
    };
    let mut server = EchoServer::bind(cfg).await?;
    let addr = server.local_addr()?;
    server.cfg.server_addr = addr.to_string();
    server.cfg.api_base = format!("http://{addr}");
    let cfg = server.cfg.clone();
    Ok((server, cfg))
}
