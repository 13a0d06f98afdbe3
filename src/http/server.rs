//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with operational handlers plus caller routes
//! - Wire up middleware (request ID, tracing, timeout, limits, actor scope)
//! - Serve on a bound listener, plain or TLS
//! - Drain on shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{header::InvalidHeaderName, HeaderName, Request},
    middleware,
    routing::get,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::context::{ApplicationContext, ContextError};
use crate::http::handlers::{get_health, get_info, not_found};
use crate::http::middleware::{scope_request_actor, track_requests};
use crate::lifecycle::shutdown::wait_requested;
use crate::lifecycle::state::Lifecycle;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<ApplicationContext>,
    pub config: Arc<AppConfig>,
    pub lifecycle: Lifecycle,
    pub actor_header: HeaderName,
    pub started_at: Instant,
}

/// Failure to assemble [`AppState`] from a context.
#[derive(Debug, Error)]
pub enum AppStateError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("invalid actor header `{header}`: {source}")]
    ActorHeader {
        header: String,
        #[source]
        source: InvalidHeaderName,
    },
}

impl AppState {
    pub fn new(
        context: Arc<ApplicationContext>,
        lifecycle: Lifecycle,
    ) -> Result<Self, AppStateError> {
        let config = context.config()?;
        let actor_header = HeaderName::try_from(config.auditing.actor_header.as_str())
            .map_err(|source| AppStateError::ActorHeader {
                header: config.auditing.actor_header.clone(),
                source,
            })?;

        Ok(Self {
            context,
            config,
            lifecycle,
            actor_header,
            started_at: Instant::now(),
        })
    }
}

/// HTTP server for the application host.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
}

impl HttpServer {
    /// Create a new HTTP server serving the operational routes and `routes`.
    pub fn new(state: AppState, routes: Router<AppState>) -> Self {
        let config = Arc::clone(&state.config);
        let router = Self::build_router(&config, state, routes);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState, routes: Router<AppState>) -> Router {
        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(RequestBodyLimitLayer::new(config.server.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )));

        Router::new()
            .route("/health", get(get_health))
            .route("/info", get(get_info))
            .merge(routes)
            .fallback(not_found)
            .layer(middleware::from_fn_with_state(state.clone(), scope_request_actor))
            .layer(middleware::from_fn(track_requests))
            .with_state(state)
            .layer(layers)
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    ///
    /// In-flight requests are drained; the caller bounds how long it waits.
    pub async fn run(
        self,
        listener: TcpListener,
        tls: Option<RustlsConfig>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;

        match tls {
            None => {
                tracing::info!(address = %addr, "HTTP server starting");
                axum::serve(listener, self.router.into_make_service())
                    .with_graceful_shutdown(wait_requested(shutdown))
                    .await?;
            }
            Some(tls) => {
                tracing::info!(address = %addr, "HTTPS server starting");
                let handle = axum_server::Handle::new();
                let drain = Duration::from_secs(self.config.server.shutdown_timeout_secs);

                let shutdown_handle = handle.clone();
                tokio::spawn(async move {
                    wait_requested(shutdown).await;
                    shutdown_handle.graceful_shutdown(Some(drain));
                });

                axum_server::from_tcp_rustls(listener.into_std()?, tls)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
