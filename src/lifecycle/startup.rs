//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Assemble the application context in dependency order
//! - Bind listeners and begin accepting traffic
//! - Tear everything down again on shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and leaves nothing running
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::validation::{validate_config, ValidationError};
use crate::config::AppConfig;
use crate::context::{compose, ApplicationContext, Registration, WiringError};
use crate::http::{AppState, AppStateError, HttpServer};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::state::{HostState, InvalidTransition, Lifecycle};
use crate::net::listener::{self, ListenerError};
use crate::net::tls::{load_tls_config, TlsError};
use crate::observability::metrics::{self, MetricsError};

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("host was already started")]
    AlreadyStarted,

    #[error("invalid configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Config(Vec<ValidationError>),

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error("component wiring failed: {0}")]
    Wiring(#[from] WiringError),

    #[error("application state could not be assembled: {0}")]
    AppState(#[from] AppStateError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    State(#[from] InvalidTransition),
}

/// Errors after the host reached `Running`.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("server failed: {0}")]
    Server(#[from] std::io::Error),

    #[error("server task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    State(#[from] InvalidTransition),
}

/// A fluent builder for the [`Host`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Default)]
pub struct HostBuilder {
    config: AppConfig,
    components: Vec<Registration>,
    routes: Option<Router<AppState>>,
}

impl HostBuilder {
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an extra component after the built-ins.
    pub fn component(mut self, registration: Registration) -> Self {
        self.components.push(registration);
        self
    }

    /// Routes served next to the operational endpoints.
    pub fn routes(mut self, routes: Router<AppState>) -> Self {
        self.routes = Some(routes);
        self
    }

    pub fn build(self) -> Host {
        Host {
            config: self.config,
            components: self.components,
            routes: self.routes.unwrap_or_default(),
            lifecycle: Lifecycle::new(),
            shutdown: Shutdown::new(),
        }
    }
}

/// The application host: owns configuration until `start` turns it into a
/// running context and listener.
pub struct Host {
    config: AppConfig,
    components: Vec<Registration>,
    routes: Router<AppState>,
    lifecycle: Lifecycle,
    shutdown: Shutdown,
}

impl Host {
    pub fn new(config: AppConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> HostBuilder {
        HostBuilder::default()
    }

    pub fn state(&self) -> HostState {
        self.lifecycle.current()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    /// Handle that requests shutdown; usable before and after `start`.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Wire the context, bind the listener and start serving.
    ///
    /// Returns once the host is `Running`, or after rolling back to `Stopped`
    /// on the first error.
    pub async fn start(&mut self) -> Result<RunningHost, StartupError> {
        self.lifecycle
            .transition(HostState::Starting)
            .map_err(|_| StartupError::AlreadyStarted)?;

        tracing::info!(application = %self.config.application.name, "Host starting");

        let mut context = None;
        match self.start_inner(&mut context).await {
            Ok(running) => Ok(running),
            Err(e) => {
                if let Some(context) = context {
                    context.close();
                }
                self.lifecycle.transition(HostState::Stopped)?;
                tracing::error!(error = %e, "Host startup failed");
                Err(e)
            }
        }
    }

    async fn start_inner(
        &mut self,
        built: &mut Option<Arc<ApplicationContext>>,
    ) -> Result<RunningHost, StartupError> {
        // 1. Configuration
        validate_config(&self.config).map_err(StartupError::Config)?;
        let config = Arc::new(self.config.clone());

        // 2. Metrics exporter
        if let Some(address) = metrics_address(&config)? {
            metrics::init_metrics(address)?;
        }

        // 3. Application context
        let context = Arc::new(compose(
            Arc::clone(&config),
            std::mem::take(&mut self.components),
        )?);
        *built = Some(Arc::clone(&context));

        // 4. TLS material
        let tls = match &config.server.tls {
            Some(tls) => {
                Some(load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?)
            }
            None => None,
        };

        // 5. Listener, last
        let address: SocketAddr = config.server.bind_address.parse().map_err(|source| {
            ListenerError::Address {
                address: config.server.bind_address.clone(),
                source,
            }
        })?;
        let listener = listener::bind(&config.server.bind_address).await?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::Bind { address, source })?;

        let state = AppState::new(Arc::clone(&context), self.lifecycle.clone())?;
        let server = HttpServer::new(state, std::mem::take(&mut self.routes));
        let server_task =
            tokio::spawn(server.run(listener, tls.clone(), self.shutdown.subscribe()));

        self.lifecycle.transition(HostState::Running)?;
        tracing::info!(
            address = %local_addr,
            tls = tls.is_some(),
            components = context.component_names().len(),
            "Host running"
        );

        Ok(RunningHost {
            context: Some(context),
            local_addr,
            server_task: Some(server_task),
            lifecycle: self.lifecycle.clone(),
            shutdown: self.shutdown.clone(),
            drain_timeout: Duration::from_secs(config.server.shutdown_timeout_secs),
        })
    }
}

/// Scrape address of the metrics exporter, when it is enabled.
fn metrics_address(config: &AppConfig) -> Result<Option<SocketAddr>, StartupError> {
    if !config.observability.metrics_enabled {
        return Ok(None);
    }
    config
        .observability
        .metrics_address
        .parse()
        .map(Some)
        .map_err(|e: std::net::AddrParseError| {
            StartupError::Config(vec![ValidationError::Invalid {
                field: "observability.metrics_address",
                reason: e.to_string(),
            }])
        })
}

/// A host that reached `Running`.
pub struct RunningHost {
    context: Option<Arc<ApplicationContext>>,
    local_addr: SocketAddr,
    server_task: Option<JoinHandle<std::io::Result<()>>>,
    lifecycle: Lifecycle,
    shutdown: Shutdown,
    drain_timeout: Duration,
}

impl RunningHost {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The live context, until the host stops.
    pub fn context(&self) -> Option<&Arc<ApplicationContext>> {
        self.context.as_ref()
    }

    pub fn state(&self) -> HostState {
        self.lifecycle.current()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Block until shutdown is requested, then stop.
    pub async fn wait(&mut self) -> Result<(), HostError> {
        self.shutdown.requested().await;
        self.stop().await
    }

    /// Stop accepting, drain, close the context. Safe to call repeatedly.
    pub async fn stop(&mut self) -> Result<(), HostError> {
        self.shutdown.trigger();

        let Some(mut server_task) = self.server_task.take() else {
            tracing::debug!(state = %self.state(), "Host already stopped");
            return Ok(());
        };

        self.lifecycle.transition(HostState::ShuttingDown)?;

        let served = match tokio::time::timeout(self.drain_timeout, &mut server_task).await {
            Ok(joined) => joined
                .map_err(HostError::from)
                .and_then(|served| served.map_err(HostError::from)),
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.drain_timeout.as_secs(),
                    "Drain deadline passed, aborting server"
                );
                server_task.abort();
                Ok(())
            }
        };

        if let Some(context) = self.context.take() {
            context.close();
        }
        self.lifecycle.transition(HostState::Stopped)?;
        tracing::info!("Shutdown complete");

        served
    }
}

impl fmt::Debug for RunningHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningHost")
            .field("local_addr", &self.local_addr)
            .field("state", &self.state())
            .field("context", &self.context)
            .finish()
    }
}

impl Drop for RunningHost {
    fn drop(&mut self) {
        let Some(task) = self.server_task.take() else {
            return;
        };

        tracing::warn!("Running host dropped without stop, aborting server");
        self.shutdown.trigger();
        let _ = self.lifecycle.transition(HostState::ShuttingDown);
        task.abort();
        if let Some(context) = self.context.take() {
            context.close();
        }
        let _ = self.lifecycle.transition(HostState::Stopped);
    }
}
