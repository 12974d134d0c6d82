//! Streamable HTTP transport
//!
//! Sessions live on `/mcp`. The session is created by a POST carrying an
//! `initialize` request, its id travels in the `Mcp-Session-Id` header, and
//! every later POST is answered in-line. A DELETE terminates it.

use {
    super::{InboundAck, TransportAdapter},
    crate::engine::{McpProtocolEngine, McpSession},
    crate::error::{SessionError, TransportError},
    crate::logging,
    crate::session::{SessionId, SessionRegistries, TransportKind},
    futures_util::future::join_all,
    serde_json::Value,
    std::sync::atomic::{AtomicBool, Ordering},
    std::sync::{Arc, Weak},
    tokio::sync::Mutex,
    tracing::{debug, Instrument},
};

pub struct StreamableHttpTransport {
    session: McpSession,
    engine: Arc<McpProtocolEngine>,
    closed: AtomicBool,
    registries: Weak<SessionRegistries>,
    // Serializes requests of one session so they are handled in arrival order
    in_flight: Mutex<()>,
}

impl StreamableHttpTransport {
    /// Allocate a session id and register the new session
    pub fn create(
        registries: &Arc<SessionRegistries>,
        engine: Arc<McpProtocolEngine>,
    ) -> Result<Arc<Self>, SessionError> {
        let session_id = SessionId::generate();
        let transport = Arc::new(Self {
            session: McpSession::new(session_id.clone(), TransportKind::Streaming),
            engine,
            closed: AtomicBool::new(false),
            registries: Arc::downgrade(registries),
            in_flight: Mutex::new(()),
        });

        registries.register(
            TransportKind::Streaming,
            session_id.clone(),
            TransportAdapter::Streaming(transport.clone()),
        )?;

        logging::log_session_opened(TransportKind::Streaming, &session_id);
        Ok(transport)
    }

    pub fn session_id(&self) -> &SessionId {
        self.session.id()
    }

    pub fn session(&self) -> &McpSession {
        &self.session
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Process a single message or a batch and collect the replies.
    ///
    /// `Accepted` means nothing in the payload expected a reply.
    pub async fn deliver_inbound(&self, payload: Value) -> Result<InboundAck, TransportError> {
        if self.is_closed() {
            return Err(TransportError::ConnectionClosed);
        }

        let span = logging::session_span(TransportKind::Streaming, self.session_id());
        async {
            let _guard = self.in_flight.lock().await;
            // Terminated while waiting behind another request
            if self.is_closed() {
                return Err(TransportError::ConnectionClosed);
            }

            match payload {
                Value::Array(batch) => {
                    debug!(batch_size = batch.len(), "Processing batch");
                    let replies: Vec<Value> = join_all(
                        batch
                            .into_iter()
                            .map(|message| self.engine.handle_message(&self.session, message)),
                    )
                    .await
                    .into_iter()
                    .flatten()
                    .collect();

                    if replies.is_empty() {
                        Ok(InboundAck::Accepted)
                    } else {
                        Ok(InboundAck::Reply(Value::Array(replies)))
                    }
                }
                message => Ok(match self.engine.handle_message(&self.session, message).await {
                    Some(reply) => InboundAck::Reply(reply),
                    None => InboundAck::Accepted,
                }),
            }
        }
        .instrument(span)
        .await
    }

    /// Terminate the session. Safe to call any number of times.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(registries) = self.registries.upgrade() {
            registries.unregister(TransportKind::Streaming, self.session_id());
        }
        logging::log_session_closed(
            TransportKind::Streaming,
            self.session_id(),
            self.session.opened_at().elapsed(),
        );
    }
}
