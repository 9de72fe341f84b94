use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, extract::Request, middleware};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Span, error, info, info_span, warn};
use uuid::Uuid;

use super::error::ApiError;
use super::middleware::{admission, advertise_capabilities};
use super::state::AppState;
use super::{listing, v1, v2};
use crate::config::{Config, LISTING_ROOT};
use crate::index::SqliteIndex;
use crate::storage::HttpContentStore;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Build the application router.
///
/// Order of execution: TraceLayer -> capability headers -> availability gate -> handler
pub fn router(state: AppState) -> Router {
    let prefix = state.config.server.remote_prefix.clone();

    let remote = Router::new()
        .nest("/v1", v1::routes())
        .nest("/v2", v2::routes());

    let router = if prefix.is_empty() {
        Router::new().merge(remote)
    } else {
        Router::new().nest(&prefix, remote)
    };

    router
        .nest(LISTING_ROOT, listing::routes())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), admission))
        .layer(middleware::from_fn(advertise_capabilities))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

fn request_span(request: &Request) -> Span {
    info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %request.method(),
        uri = %request.uri(),
    )
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub async fn run(config: Config, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);

    let index = SqliteIndex::connect(&config.index)
        .await
        .map_err(|e| format!("Failed to open index: {}", e))?;
    index
        .migrate()
        .await
        .map_err(|e| format!("Failed to migrate index: {}", e))?;

    let store = HttpContentStore::new(&config.content_store)
        .map_err(|e| format!("Failed to build content store client: {}", e))?;

    info!(
        environment = %config.server.environment,
        gate_policy = ?config.gate_policy(),
        prefix = %config.server.remote_prefix,
        store = %config.content_store.base_url,
        "Starting recipegate"
    );

    if config.server.trusts_client_host() {
        warn!("server.public_url is unset; V1 download URLs follow the client's Host header");
    }

    let state = AppState::with_sqlite(config, Arc::new(store), index);
    let metrics = state.metrics.clone();
    let audits = state.audits.clone();
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "recipegate listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    audits.close();
    if !audits.is_empty() {
        info!(pending = audits.len(), "Waiting for download audit writes");
    }
    audits.wait().await;

    let totals = metrics.snapshot();
    info!(
        admitted = totals.requests_admitted,
        rejected = totals.requests_rejected,
        downloads = totals.downloads_observed,
        audit_failures = totals.audit_failures,
        "Server stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
