//! HTTP service that fetches, stores and returns the current quote.

pub mod error;

use anyhow::{Context, Result};
use axum::{Json, Router, extract::State, routing::get};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::core::config::{AppConfig, TimeoutsConfig};
use crate::core::{Deadline, QuoteProvider, QuoteResponse, QuoteStore};
use crate::providers::AwesomeApiProvider;
use crate::store::SqliteQuoteStore;
pub use error::ServiceError;

/// Shared by every request. The store is the only resource requests have in common.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn QuoteProvider>,
    pub store: Arc<dyn QuoteStore>,
    pub fetch_timeout: Duration,
    pub store_timeout: Duration,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        store: Arc<dyn QuoteStore>,
        timeouts: &TimeoutsConfig,
    ) -> Self {
        AppState {
            provider,
            store,
            fetch_timeout: timeouts.fetch_timeout(),
            store_timeout: timeouts.store_timeout(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/cotacao", get(get_quote))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fetches under its own budget, then stores under a second budget taken
/// fresh from the request rather than from what the fetch left over.
///
/// Both bounded calls live inside this future, so a dropped connection
/// cancels whichever one is in flight.
async fn get_quote(State(state): State<AppState>) -> Result<Json<QuoteResponse>, ServiceError> {
    let fetch_deadline = Deadline::after(state.fetch_timeout);
    let quote = state
        .provider
        .fetch_quote(fetch_deadline)
        .await
        .inspect_err(|e| error!(error = %e, "Error fetching quote"))?;
    debug!(bid = %quote.bid, "Fetched quote");

    let store_deadline = Deadline::after(state.store_timeout);
    state
        .store
        .append(store_deadline, &quote)
        .await
        .inspect_err(|e| error!(error = %e, "Error saving quote"))?;

    Ok(Json(quote.into()))
}

/// Serves requests on `listener` until a shutdown signal arrives.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("Server started at {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated unexpectedly")
}

/// Initialises storage, the upstream client and the listener, then serves.
///
/// Nothing is served if any initialisation step fails.
pub async fn start(config: &AppConfig) -> Result<()> {
    let store = SqliteQuoteStore::open(&config.server.database_url)
        .await
        .with_context(|| format!("Failed to set up database {}", config.server.database_url))?;
    let provider = AwesomeApiProvider::new(&config.upstream.base_url, &config.upstream.pair)
        .context("Failed to create upstream client")?;

    let listener = TcpListener::bind(&config.server.address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.address))?;

    let state = AppState::new(Arc::new(provider), Arc::new(store), &config.timeouts);
    serve(listener, state).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
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
    info!("Shutting down");
}
