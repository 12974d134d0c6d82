//! Gateway Tests
//!
//! Cross-module tests plus the shared fixtures used by the unit tests.


pub(crate) mod support {
    use crate::engine::McpProtocolEngine;
    use crate::error::{McpError, McpResult};
    use crate::handler::{McpContext, McpHandler, ToolDefinition};
    use crate::session::SessionRegistries;
    use crate::tools::text_result;
    use crate::transport::{SseEventStream, SseFrame, StreamableHttpTransport, TransportAdapter};
    use async_trait::async_trait;
    use futures_util::StreamExt;
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use warp::http::StatusCode;
    use warp::{Filter, Reply};

    /// Handler exposing a single `stub` tool that echoes its arguments
    #[derive(Default)]
    pub struct StubHandler {
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl StubHandler {
        /// Tool calls take `delay` to complete
        pub fn with_delay(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: Some(delay),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl McpHandler for StubHandler {
        async fn list_tools(&self, _context: &McpContext) -> McpResult<Vec<ToolDefinition>> {
            Ok(vec![ToolDefinition {
                name: "stub".to_string(),
                description: "Echo the arguments".to_string(),
                input_schema: json!({"type": "object"}),
            }])
        }

        async fn call_tool(
            &self,
            name: &str,
            arguments: Value,
            _context: &McpContext,
        ) -> McpResult<Value> {
            if name != "stub" {
                return Err(McpError::UnknownTool(name.to_string()));
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(text_result(arguments.to_string()))
        }
    }

    pub fn test_engine() -> Arc<McpProtocolEngine> {
        Arc::new(McpProtocolEngine::new(Arc::new(StubHandler::default())))
    }

    pub fn engine_with(handler: Arc<dyn McpHandler>) -> Arc<McpProtocolEngine> {
        Arc::new(McpProtocolEngine::new(handler))
    }

    pub fn streaming_adapter(
        registries: &Arc<SessionRegistries>,
        engine: Arc<McpProtocolEngine>,
    ) -> TransportAdapter {
        TransportAdapter::Streaming(StreamableHttpTransport::create(registries, engine).unwrap())
    }

    pub fn initialize_message(id: u64) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-06-18",
                "capabilities": {},
                "clientInfo": {"name": "test-client", "version": "1.0.0"}
            }
        })
    }

    pub fn tool_call_message(id: u64, name: &str, arguments: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        })
    }

    /// Next frame from an SSE stream; panics if none arrives in time
    pub async fn next_frame(stream: &mut SseEventStream) -> SseFrame {
        tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for SSE frame")
            .expect("SSE stream ended")
    }

    /// Stand-in for the customer API, served on an ephemeral port.
    ///
    /// - `12345` answers `{"name":"Acme"}`
    /// - `missing` answers 404
    /// - `garbled` answers 200 with a non-JSON body
    /// - anything else echoes the customer number
    pub struct FakeUpstream {
        addr: SocketAddr,
        hits: Arc<AtomicUsize>,
        shutdown: Option<oneshot::Sender<()>>,
    }

    impl FakeUpstream {
        pub fn base_url(&self) -> String {
            format!("http://{}/yis7beta_service", self.addr)
        }

        /// Requests served so far
        pub fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    impl Drop for FakeUpstream {
        fn drop(&mut self) {
            if let Some(shutdown) = self.shutdown.take() {
                let _ = shutdown.send(());
            }
        }
    }

    pub async fn spawn_upstream() -> FakeUpstream {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let route = warp::path!("yis7beta_service" / "api" / "config" / "getCustomerDetails" / String)
            .and(warp::get())
            .map(move |customer_no: String| {
                counter.fetch_add(1, Ordering::SeqCst);
                match customer_no.as_str() {
                    "12345" => warp::reply::json(&json!({"name": "Acme"})).into_response(),
                    "missing" => warp::reply::with_status("not found", StatusCode::NOT_FOUND)
                        .into_response(),
                    "garbled" => "<html>not json</html>".into_response(),
                    other => warp::reply::json(&json!({"customerNo": other})).into_response(),
                }
            });

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (addr, server) =
            warp::serve(route).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
                let _ = shutdown_rx.await;
            });
        tokio::spawn(server);

        FakeUpstream {
            addr,
            hits,
            shutdown: Some(shutdown_tx),
        }
    }
}
