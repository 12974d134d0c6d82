//! Gateway Server
//!
//! Owns the session registries for the lifetime of the process, builds the
//! routes, binds the listener and tears every session down on shutdown.

use {
    crate::bridge::CustomerDetailsClient,
    crate::config::GatewayConfig,
    crate::engine::McpProtocolEngine,
    crate::handler::McpHandler,
    crate::health::HealthChecker,
    crate::http::{gateway_routes, GatewayState},
    crate::logging,
    crate::session::SessionRegistries,
    crate::tools::CustomerTools,
    anyhow::{Context, Result},
    std::future::Future,
    std::net::SocketAddr,
    std::sync::Arc,
    tokio::net::TcpListener,
    tokio::sync::oneshot,
    tokio::task::JoinHandle,
    tokio_stream::wrappers::TcpListenerStream,
    tracing::{debug, info},
    warp::reply::Response,
    warp::{Filter, Rejection},
};

pub struct GatewayServer {
    config: GatewayConfig,
    registries: Arc<SessionRegistries>,
    engine: Arc<McpProtocolEngine>,
    health: Arc<HealthChecker>,
}

impl GatewayServer {
    /// Create a gateway serving the customer tools against the configured
    /// upstream.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = CustomerDetailsClient::new(&config.upstream)
            .context("Failed to build customer details client")?;
        Ok(Self::with_handler(config, Arc::new(CustomerTools::new(client))))
    }

    /// Create a gateway with a custom tool handler.
    pub fn with_handler(config: GatewayConfig, handler: Arc<dyn McpHandler>) -> Self {
        debug!("Initializing MCP gateway");
        Self {
            registries: Arc::new(SessionRegistries::new(&config.limits)),
            engine: Arc::new(McpProtocolEngine::new(handler)),
            health: Arc::new(HealthChecker::default()),
            config,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn registries(&self) -> &Arc<SessionRegistries> {
        &self.registries
    }

    pub fn routes(&self) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
        gateway_routes(GatewayState {
            registries: self.registries.clone(),
            engine: self.engine.clone(),
            health: self.health.clone(),
            sse_keep_alive: self.config.sse_keep_alive,
            max_message_size: self.config.limits.max_message_size,
        })
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn start(&self) -> Result<()> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Could not bind to {addr}"))?;

        self.start_with_shutdown(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                // Without a signal handler there is nothing to wait for
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl-C");
        })
        .await
    }

    /// Serve on an already bound listener until `signal` resolves, then close
    /// every live session.
    pub async fn start_with_shutdown<F>(&self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .context("Failed to read listener address")?;
        log_endpoints(addr);

        let registries = self.registries.clone();
        let signal = async move {
            signal.await;
            // Ends every SSE stream so graceful shutdown does not wait on them
            let closed = registries.close_all();
            logging::log_server_shutdown(closed);
        };

        warp::serve(self.routes())
            .serve_incoming_with_graceful_shutdown(TcpListenerStream::new(listener), signal)
            .await;

        info!("Gateway stopped");
        Ok(())
    }

    /// Serve on an ephemeral port in the background.
    pub async fn start_dynamic(self) -> Result<RunningServer> {
        let listener = TcpListener::bind(SocketAddr::new(self.config.host, 0))
            .await
            .context("Could not bind an ephemeral port")?;
        let addr = listener.local_addr().context("Failed to read listener address")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let registries = self.registries.clone();
        let handle = tokio::spawn(async move {
            let signal = async move {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = self.start_with_shutdown(listener, signal).await {
                tracing::error!(error = %e, "Gateway exited with error");
            }
        });

        Ok(RunningServer {
            addr,
            registries,
            shutdown: Some(shutdown_tx),
            handle,
        })
    }
}

fn log_endpoints(addr: SocketAddr) {
    logging::log_server_ready(&format!("http://{addr}"));
    info!(
        endpoints = ?vec![
            "POST|GET|DELETE /mcp (streamable HTTP)",
            "GET /sse (legacy SSE stream)",
            "POST /messages?sessionId= (legacy SSE messages)",
            "GET /health",
        ],
        "Available endpoints"
    );
}

/// Handle to a gateway started with [`GatewayServer::start_dynamic`]
pub struct RunningServer {
    addr: SocketAddr,
    registries: Arc<SessionRegistries>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl RunningServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn registries(&self) -> &Arc<SessionRegistries> {
        &self.registries
    }

    /// Trigger graceful shutdown and wait for the server task to finish
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = (&mut self.handle).await;
    }
}
