//! MCP Protocol Engine
//!
//! Processes inbound JSON-RPC payloads for one session at a time. Transport
//! adapters own an [`McpSession`] each and hand every inbound payload to the
//! shared engine together with that session state.

use {
    crate::error::{McpError, McpResult},
    crate::handler::{McpContext, McpHandler},
    crate::protocol::{
        message::parse_params, InitializeParams, McpProtocol, MessageKind, ToolCallParams,
    },
    crate::session::{SessionId, TransportKind},
    serde_json::{json, Value},
    std::sync::atomic::{AtomicBool, Ordering},
    std::sync::Arc,
    std::time::Instant,
    tokio::sync::RwLock,
    tracing::{debug, error, info, trace, warn},
};

/// Protocol state of one session
pub struct McpSession {
    id: SessionId,
    transport: TransportKind,
    opened_at: Instant,
    initialized: AtomicBool,
    client_info: RwLock<Option<Value>>,
    protocol_version: RwLock<Option<String>>,
}

impl McpSession {
    pub fn new(id: SessionId, transport: TransportKind) -> Self {
        Self {
            id,
            transport,
            opened_at: Instant::now(),
            initialized: AtomicBool::new(false),
            client_info: RwLock::new(None),
            protocol_version: RwLock::new(None),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub async fn protocol_version(&self) -> Option<String> {
        self.protocol_version.read().await.clone()
    }

    async fn context(&self) -> McpContext {
        McpContext {
            session_id: self.id.clone(),
            transport: self.transport,
            protocol_version: self.protocol_version.read().await.clone(),
            client_info: self.client_info.read().await.clone(),
        }
    }
}

pub struct McpProtocolEngine {
    protocol: McpProtocol,
    handler: Arc<dyn McpHandler>,
}

impl McpProtocolEngine {
    pub fn new(handler: Arc<dyn McpHandler>) -> Self {
        Self {
            protocol: McpProtocol::new(),
            handler,
        }
    }

    pub fn protocol(&self) -> &McpProtocol {
        &self.protocol
    }

    /// Handle one JSON-RPC message on behalf of `session`.
    ///
    /// Returns the reply to send back to the client, or `None` for
    /// notifications and client responses, which get no reply.
    pub async fn handle_message(&self, session: &McpSession, message: Value) -> Option<Value> {
        let kind = match MessageKind::classify(&message) {
            Ok(kind) => kind,
            Err(e) => {
                warn!(session_id = %session.id(), error = %e, "Rejecting malformed message");
                let id = message.get("id").cloned();
                return Some(e.to_json_rpc_error(id));
            }
        };

        match kind {
            MessageKind::Request { id, method, params } => {
                debug!(
                    session_id = %session.id(),
                    method = %method,
                    id = ?id,
                    "Dispatching request"
                );
                let result = self.dispatch_request(session, method, params).await;
                Some(match result {
                    Ok(result) => self.protocol.create_success_response(id.clone(), result),
                    Err(e) => {
                        error!(
                            session_id = %session.id(),
                            method = %method,
                            error = %e,
                            "Request failed"
                        );
                        e.to_json_rpc_error(Some(id.clone()))
                    }
                })
            }
            MessageKind::Notification { method, .. } => {
                self.handle_notification(session, method);
                None
            }
            MessageKind::Response => {
                trace!(session_id = %session.id(), "Ignoring client response");
                None
            }
        }
    }

    async fn dispatch_request(
        &self,
        session: &McpSession,
        method: &str,
        params: Option<&Value>,
    ) -> McpResult<Value> {
        match method {
            "initialize" => self.handle_initialize(session, parse_params(params)?).await,
            "ping" => Ok(json!({})),
            "tools/list" => self.handle_tools_list(session).await,
            "tools/call" => self.handle_tool_call(session, parse_params(params)?).await,
            _ => Err(McpError::UnknownMethod(method.to_string())),
        }
    }

    fn handle_notification(&self, session: &McpSession, method: &str) {
        match method {
            "notifications/initialized" => {
                info!(session_id = %session.id(), "Client sent initialized notification");
            }
            "notifications/cancelled" => {
                debug!(session_id = %session.id(), "Client cancelled a request");
            }
            other => {
                debug!(session_id = %session.id(), method = %other, "Ignoring notification");
            }
        }
    }

    async fn handle_initialize(
        &self,
        session: &McpSession,
        params: InitializeParams,
    ) -> McpResult<Value> {
        // A session is initialized exactly once
        if session.initialized.swap(true, Ordering::SeqCst) {
            warn!(session_id = %session.id(), "Rejecting repeated initialize");
            return Err(McpError::InvalidRequest(
                "Session is already initialized".to_string(),
            ));
        }

        let version = self
            .protocol
            .negotiate_version(params.protocol_version.as_deref());

        *session.client_info.write().await = params.client_info;
        *session.protocol_version.write().await = Some(version.to_string());

        info!(
            session_id = %session.id(),
            transport = %session.transport(),
            protocol_version = %version,
            "Session initialized"
        );
        Ok(self.protocol.create_initialize_result(version))
    }

    async fn handle_tools_list(&self, session: &McpSession) -> McpResult<Value> {
        if !session.is_initialized() {
            return Err(McpError::NotInitialized);
        }

        let context = session.context().await;
        let tools = self.handler.list_tools(&context).await?;
        let tools: Vec<Value> = tools.iter().map(|tool| tool.to_json()).collect();
        Ok(json!({ "tools": tools }))
    }

    async fn handle_tool_call(
        &self,
        session: &McpSession,
        params: ToolCallParams,
    ) -> McpResult<Value> {
        if !session.is_initialized() {
            return Err(McpError::NotInitialized);
        }

        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        if !arguments.is_object() {
            return Err(McpError::InvalidParams(
                "Arguments must be an object".to_string(),
            ));
        }

        let context = session.context().await;
        let started = Instant::now();
        let result = self
            .handler
            .call_tool(&params.name, arguments, &context)
            .await;
        debug!(
            session_id = %session.id(),
            tool = %params.name,
            duration_ms = started.elapsed().as_millis(),
            ok = result.is_ok(),
            "Tool call finished"
        );
        result
    }
}
