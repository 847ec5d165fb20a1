//! Runtime orchestration.
//!
//! [`CourierRuntime`] turns a validated [`CourierConfig`] and a handler
//! registry into running parts: the reply router with one sender per enabled
//! platform, the work pool and dispatcher, the webhook listener and the RTM
//! connection loop.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use courier_runtime::CourierRuntime;
//! use courier_framework::{EchoHandler, PingHandler};
//!
//! let runtime = CourierRuntime::builder()
//!     .config_file("courier.toml")
//!     .handler(PingHandler::new()?)
//!     .handler(EchoHandler::new()?)
//!     .build()?;
//!
//! // Runs until Ctrl+C or SIGTERM.
//! runtime.run().await?;
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use courier_adapter_line::LineAdapter;
use courier_adapter_slack::{ConnectionState, RtmHandle, SlackRtmAdapter};
use courier_core::{
    EventSink, Handler, HandlerRegistry, HandlerRegistryBuilder, HandlerSpec, Platform,
};
use courier_framework::{AckMode, Dispatcher, ReplyRouter, WorkPool, egress_service};
use courier_transport::{HttpServer, ListenerHandle};
use tokio::signal;
use tracing::{error, info};

use crate::config::{ConfigLoader, CourierConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;

/// The Courier gateway runtime.
pub struct CourierRuntime {
    config: CourierConfig,
    registry: HandlerRegistry,
}

impl CourierRuntime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// Validates the configuration but does not initialize logging.
    pub fn from_config(config: CourierConfig, registry: HandlerRegistry) -> RuntimeResult<Self> {
        validate_config(&config)?;
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &CourierConfig {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Builds and starts every enabled part.
    pub async fn start(&self) -> RuntimeResult<RunningRuntime> {
        let executor = &self.config.executor;
        let timeout = executor.reply_timeout();
        let mut router = ReplyRouter::new();

        let line = self
            .config
            .providers
            .line
            .enabled
            .then(|| LineAdapter::new(self.config.providers.line.clone()));
        if let Some(line) = &line {
            router = router.with_sender(Platform::Line, line.reply_client(timeout)?);
        }

        let rtm = if self.config.rtm.enabled {
            let adapter = SlackRtmAdapter::new(
                &self.config.providers.slack,
                self.config.rtm.clone(),
                timeout,
            )?;
            router = router.with_sender(Platform::Slack, adapter.reply_sender());
            Some(adapter)
        } else {
            None
        };

        let dispatcher = Dispatcher::builder()
            .registry(self.registry.clone())
            .egress(egress_service(router, timeout))
            .pool(WorkPool::with_capacity(
                executor.workers,
                executor.queue_capacity,
            ))
            .ack_mode(executor.ack_mode)
            .build();
        let sink: Arc<dyn EventSink> = Arc::new(dispatcher.clone());

        let listener = match &line {
            Some(line) => {
                let addr = self.config.server.bind_addr();
                Some(HttpServer::serve(&addr, line.router(Arc::clone(&sink))).await?)
            }
            None => None,
        };

        // the RTM reader must never wait on the pool
        let rtm_sink: Arc<dyn EventSink> =
            Arc::new(dispatcher.with_ack_mode(AckMode::FireAndReturn));
        let rtm = rtm.map(|adapter| adapter.start(rtm_sink));

        info!(
            handlers = self.registry.len(),
            workers = executor.workers,
            queue_capacity = executor.queue_capacity,
            ack_mode = ?executor.ack_mode,
            webhook = ?listener.as_ref().map(ListenerHandle::local_addr),
            rtm = rtm.is_some(),
            "Courier runtime started"
        );

        Ok(RunningRuntime {
            listener,
            dispatcher,
            rtm,
        })
    }

    /// Runs until Ctrl+C or SIGTERM, then shuts down.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.run_until(wait_for_shutdown()).await
    }

    /// Runs until `shutdown` resolves, then shuts down.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let running = self.start().await?;
        info!("Courier is now running");
        shutdown.await;
        running.shutdown().await;
        Ok(())
    }
}

/// The started parts of a [`CourierRuntime`].
pub struct RunningRuntime {
    listener: Option<ListenerHandle>,
    dispatcher: Dispatcher,
    rtm: Option<RtmHandle>,
}

impl RunningRuntime {
    /// Address of the webhook listener, if LINE is enabled.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(ListenerHandle::local_addr)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Current RTM connection state, if RTM is enabled.
    pub fn rtm_state(&self) -> Option<ConnectionState> {
        self.rtm.as_ref().map(RtmHandle::state)
    }

    /// Stops accepting webhooks, drains the work pool, then closes the RTM
    /// socket with a normal close.
    pub async fn shutdown(self) {
        info!("Stopping Courier runtime");
        if let Some(listener) = self.listener {
            listener.shutdown().await;
        }
        self.dispatcher.shutdown().await;
        if let Some(rtm) = self.rtm {
            rtm.shutdown().await;
        }
        info!("Courier runtime stopped");
    }
}

/// Waits for Ctrl+C or, on Unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => error!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`CourierRuntime`].
///
/// ```rust,ignore
/// let runtime = CourierRuntime::builder()
///     .config_file("config/courier.toml")
///     .profile("production")
///     .handler(PingHandler::new()?)
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    config: Option<CourierConfig>,
    registry: HandlerRegistryBuilder,
    init_logging: bool,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            config: None,
            registry: HandlerRegistry::builder(),
            init_logging: true,
        }
    }

    /// Loads exactly this configuration file.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration above every loaded source.
    pub fn merge(mut self, config: CourierConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Uses this configuration as is, skipping file and environment loading.
    pub fn config(mut self, config: CourierConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Appends a handler; handlers run in the order they are added.
    pub fn handler<H: Handler>(mut self, handler: H) -> Self {
        self.registry = self.registry.handler(handler);
        self
    }

    pub fn spec(mut self, spec: HandlerSpec) -> Self {
        self.registry = self.registry.spec(spec);
        self
    }

    /// Leaves the global tracing subscriber alone.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    /// Loads and validates the configuration, initializes logging and
    /// freezes the handler registry.
    pub fn build(self) -> RuntimeResult<CourierRuntime> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_loader.load()?,
        };
        validate_config(&config)?;

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let registry = self.registry.build();
        info!(
            handlers = registry.len(),
            line = config.providers.line.enabled,
            rtm = config.rtm.enabled,
            "Runtime initialized"
        );

        Ok(CourierRuntime { config, registry })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::error::RuntimeError;

    #[test]
    fn test_build_rejects_invalid_config() {
        let err = CourierRuntime::builder()
            .config(CourierConfig::default())
            .without_logging()
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::MissingField { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_without_providers() {
        let mut config = CourierConfig::default();
        config.providers.line.enabled = false;
        let runtime = CourierRuntime::from_config(config, HandlerRegistry::default()).unwrap();

        let running = runtime.start().await.unwrap();
        assert!(running.local_addr().is_none());
        assert!(running.rtm_state().is_none());
        running.shutdown().await;
    }
}
