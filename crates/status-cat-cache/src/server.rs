//! HTTP surface of the cache
//!
//! Every request goes through one fallback handler: the first path segment is
//! validated as a status code, then the method picks GET, PUT or DELETE.

use crate::error::{plain_text, CacheError, Result, StartupError};
use crate::types::CacheConfig;
use crate::upstream::{CatFetcher, Upstream};
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use status_image_store::{ImageStore, StatusKey};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared state for the HTTP server
pub struct ServerState {
    pub store: ImageStore,
    pub fetcher: CatFetcher,
    pub max_body_bytes: usize,
}

impl ServerState {
    pub fn new(store: ImageStore, fetcher: CatFetcher, max_body_bytes: usize) -> Self {
        Self {
            store,
            fetcher,
            max_body_bytes,
        }
    }

    /// Build the state from configuration. Does not create the cache directory.
    pub fn from_config(config: &CacheConfig) -> std::result::Result<Self, StartupError> {
        let store = ImageStore::new(config.cache_dir.clone());
        let fetcher = CatFetcher::new(
            &config.upstream_url,
            Duration::from_secs(config.upstream_timeout_secs),
        )?;
        Ok(Self::new(store, fetcher, config.max_body_bytes))
    }
}

pub type SharedState = Arc<ServerState>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .fallback(handle_request)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `host:port` and serve until Ctrl-C or SIGTERM
pub async fn start_server(state: SharedState, host: &str, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received");
}

async fn handle_request(State(state): State<SharedState>, request: Request) -> Response {
    match dispatch(&state, request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn dispatch(state: &ServerState, request: Request) -> Result<Response> {
    let key = StatusKey::from_path(request.uri().path())?;

    let method = request.method().clone();
    match method {
        Method::GET => get_image(state, &key).await,
        Method::PUT => {
            let body = read_body(request, state.max_body_bytes).await?;
            put_image(state, &key, body).await
        }
        Method::DELETE => delete_image(state, &key).await,
        _ => Err(CacheError::MethodNotAllowed),
    }
}

async fn read_body(request: Request, limit: usize) -> Result<Bytes> {
    axum::body::to_bytes(request.into_body(), limit)
        .await
        .map_err(|e| CacheError::BadRequest(format!("unreadable body: {}", e)))
}

/// Serve from disk, or fetch from upstream on a miss
async fn get_image(state: &ServerState, key: &StatusKey) -> Result<Response> {
    if let Some(data) = state.store.read(key).await? {
        debug!(key = %key, "Cache hit");
        return Ok(image_response(data, CacheStatus::Hit));
    }

    debug!(key = %key, "Cache miss");
    let data = match state.fetcher.fetch(key).await? {
        Upstream::Found(data) => data,
        Upstream::NotFound => return Err(CacheError::NotFound),
    };

    persist_fetched(state, key, &data).await;
    Ok(image_response(data, CacheStatus::Miss))
}

/// Best-effort write of a freshly fetched image; failures are only logged
async fn persist_fetched(state: &ServerState, key: &StatusKey, data: &[u8]) {
    if let Err(e) = state.store.write(key, data).await {
        warn!(key = %key, error = %e, "Failed to cache fetched image");
    }
}

async fn put_image(state: &ServerState, key: &StatusKey, body: Bytes) -> Result<Response> {
    if body.is_empty() {
        return Err(CacheError::BadRequest("empty body".to_string()));
    }

    state.store.write(key, &body).await?;
    info!(key = %key, size = body.len(), "Stored image from PUT");
    Ok(plain_text(StatusCode::CREATED, "Created"))
}

async fn delete_image(state: &ServerState, key: &StatusKey) -> Result<Response> {
    if !state.store.remove(key).await? {
        return Err(CacheError::NotFound);
    }

    info!(key = %key, "Evicted image");
    Ok(plain_text(StatusCode::OK, "OK"))
}

fn image_response(data: impl Into<Body>, cache_status: CacheStatus) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (HeaderName::from_static("x-cache"), cache_status.as_str()),
        ],
        data.into(),
    )
        .into_response()
}
