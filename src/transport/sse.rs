//! Legacy SSE transport
//!
//! One session is a long-lived `GET /sse` event stream for server-to-client
//! traffic plus `POST /messages?sessionId=...` for client-to-server traffic.
//! Inbound payloads are queued and processed in order by a per-session worker;
//! replies are written to the event stream.

use {
    super::{InboundAck, TransportAdapter},
    crate::engine::{McpProtocolEngine, McpSession},
    crate::error::{SessionError, TransportError},
    crate::logging,
    crate::session::{SessionId, SessionRegistries, TransportKind},
    futures_util::Stream,
    serde_json::Value,
    std::pin::Pin,
    std::sync::atomic::{AtomicBool, Ordering},
    std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    std::task::{Context, Poll},
    tokio::sync::mpsc::{self, error::TrySendError},
    tokio_stream::wrappers::ReceiverStream,
    tracing::{trace, warn, Instrument},
    warp::sse::Event,
};

/// Replies buffered for a slow event-stream reader
const OUTBOUND_BUFFER: usize = 64;

/// Payloads waiting for the session worker before new POSTs are refused
pub const INBOUND_QUEUE_CAPACITY: usize = 256;

pub struct SseTransport {
    session: McpSession,
    outbound: Mutex<Option<mpsc::Sender<Value>>>,
    inbound: Mutex<Option<mpsc::Sender<Value>>>,
    closed: AtomicBool,
    registries: Weak<SessionRegistries>,
}

impl SseTransport {
    /// Open a new session: allocate an identifier, register it, and return the
    /// event stream the client will read. The session is registered before the
    /// stream, and with it the identifier, reaches the client.
    pub fn open(
        registries: &Arc<SessionRegistries>,
        engine: Arc<McpProtocolEngine>,
        messages_path: &str,
    ) -> Result<SseEventStream, SessionError> {
        Self::open_with_id(registries, engine, messages_path, SessionId::generate())
    }

    pub(crate) fn open_with_id(
        registries: &Arc<SessionRegistries>,
        engine: Arc<McpProtocolEngine>,
        messages_path: &str,
        session_id: SessionId,
    ) -> Result<SseEventStream, SessionError> {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_CAPACITY);

        let transport = Arc::new(Self {
            session: McpSession::new(session_id.clone(), TransportKind::Sse),
            outbound: Mutex::new(Some(outbound_tx)),
            inbound: Mutex::new(Some(inbound_tx)),
            closed: AtomicBool::new(false),
            registries: Arc::downgrade(registries),
        });

        if let Err(e) = registries.register(
            TransportKind::Sse,
            session_id.clone(),
            TransportAdapter::Sse(transport.clone()),
        ) {
            // Never registered, so only the channels need closing; the entry
            // under this id (if any) belongs to another adapter.
            transport.closed.store(true, Ordering::SeqCst);
            transport.shutdown_channels();
            warn!(session_id = %session_id, error = %e, "Failed to register SSE session");
            return Err(e);
        }

        logging::log_session_opened(TransportKind::Sse, &session_id);

        let span = logging::session_span(TransportKind::Sse, &session_id);
        tokio::spawn(run_inbound_worker(transport.clone(), inbound_rx, engine).instrument(span));

        Ok(SseEventStream {
            endpoint: Some(format!("{messages_path}?sessionId={session_id}")),
            outbound: ReceiverStream::new(outbound_rx),
            transport,
        })
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

    /// Queue a payload for this session's worker. Replies, if any, are sent
    /// on the event stream, so the acknowledgement is always `Accepted`.
    /// Fails with `QueueFull` while the worker is behind by
    /// [`INBOUND_QUEUE_CAPACITY`] payloads.
    pub fn deliver_inbound(&self, payload: Value) -> Result<InboundAck, TransportError> {
        if self.is_closed() {
            return Err(TransportError::ConnectionClosed);
        }

        let inbound = lock(&self.inbound);
        let sender = inbound.as_ref().ok_or(TransportError::ConnectionClosed)?;
        sender.try_send(payload).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::QueueFull {
                capacity: INBOUND_QUEUE_CAPACITY,
            },
            TrySendError::Closed(_) => TransportError::ConnectionClosed,
        })?;
        Ok(InboundAck::Accepted)
    }

    /// Write a message to the event stream. A vanished reader counts as the
    /// client closing the session.
    pub async fn send(&self, message: Value) -> Result<(), TransportError> {
        let sender = lock(&self.outbound)
            .clone()
            .ok_or(TransportError::ConnectionClosed)?;

        if sender.send(message).await.is_err() {
            self.close();
            return Err(TransportError::ConnectionClosed);
        }
        Ok(())
    }

    /// Tear down the session. Safe to call any number of times.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.shutdown_channels();
        if let Some(registries) = self.registries.upgrade() {
            registries.unregister(TransportKind::Sse, self.session_id());
        }
        logging::log_session_closed(
            TransportKind::Sse,
            self.session_id(),
            self.session.opened_at().elapsed(),
        );
    }

    fn shutdown_channels(&self) {
        lock(&self.outbound).take();
        lock(&self.inbound).take();
    }
}

/// Process queued payloads one at a time, in arrival order.
async fn run_inbound_worker(
    transport: Arc<SseTransport>,
    mut inbound: mpsc::Receiver<Value>,
    engine: Arc<McpProtocolEngine>,
) {
    while let Some(message) = inbound.recv().await {
        if transport.is_closed() {
            break;
        }

        let Some(reply) = engine.handle_message(transport.session(), message).await else {
            continue;
        };

        // The session may have closed while the message was being handled
        if transport.send(reply).await.is_err() {
            logging::log_reply_discarded(TransportKind::Sse, transport.session_id());
        }
    }
    trace!(session_id = %transport.session_id(), "SSE inbound worker finished");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One frame on the legacy event stream
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    /// First frame: where to POST inbound messages
    Endpoint(String),
    /// A protocol payload for the client
    Message(Value),
}

impl SseFrame {
    pub fn into_event(self) -> Event {
        match self {
            SseFrame::Endpoint(uri) => Event::default().event("endpoint").data(uri),
            SseFrame::Message(message) => Event::default().event("message").data(message.to_string()),
        }
    }
}

/// The outbound half of an SSE session.
///
/// Dropping the stream, which is what the HTTP server does when the client
/// disconnects or a write fails, closes the session.
pub struct SseEventStream {
    endpoint: Option<String>,
    outbound: ReceiverStream<Value>,
    transport: Arc<SseTransport>,
}

impl SseEventStream {
    pub fn session_id(&self) -> &SessionId {
        self.transport.session_id()
    }

    pub fn transport(&self) -> &Arc<SseTransport> {
        &self.transport
    }
}

impl Stream for SseEventStream {
    type Item = SseFrame;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(endpoint) = this.endpoint.take() {
            return Poll::Ready(Some(SseFrame::Endpoint(endpoint)));
        }
        Pin::new(&mut this.outbound)
            .poll_next(cx)
            .map(|message| message.map(SseFrame::Message))
    }
}

impl Drop for SseEventStream {
    fn drop(&mut self) {
        self.transport.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::{initialize_message, next_frame, test_engine};
    use futures_util::StreamExt;
    use serde_json::json;

    fn open(registries: &Arc<SessionRegistries>) -> SseEventStream {
        SseTransport::open(registries, test_engine(), "/messages").unwrap()
    }

    #[tokio::test]
    async fn test_open_registers_and_announces_endpoint() {
        let registries = Arc::new(SessionRegistries::default());
        let mut stream = open(&registries);
        let id = stream.session_id().clone();

        assert!(registries.lookup(TransportKind::Sse, &id).is_ok());
        assert_eq!(
            stream.next().await,
            Some(SseFrame::Endpoint(format!("/messages?sessionId={id}")))
        );
    }

    #[tokio::test]
    async fn test_dropping_stream_unregisters() {
        let registries = Arc::new(SessionRegistries::default());
        let stream = open(&registries);
        let id = stream.session_id().clone();
        let transport = stream.transport().clone();

        drop(stream);

        assert!(transport.is_closed());
        assert!(matches!(
            registries.lookup(TransportKind::Sse, &id),
            Err(SessionError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_close_twice_is_noop() {
        let registries = Arc::new(SessionRegistries::default());
        let stream = open(&registries);
        let id = stream.session_id().clone();

        stream.transport().close();
        stream.transport().close();
        drop(stream);

        assert!(registries.lookup(TransportKind::Sse, &id).is_err());
        assert!(registries.for_kind(TransportKind::Sse).is_empty());
    }

    #[tokio::test]
    async fn test_replies_arrive_in_inbound_order() {
        let registries = Arc::new(SessionRegistries::default());
        let mut stream = open(&registries);
        let transport = stream.transport().clone();
        next_frame(&mut stream).await;

        transport.deliver_inbound(initialize_message(1)).unwrap();
        for id in 2..=5 {
            let ack = transport
                .deliver_inbound(json!({"jsonrpc": "2.0", "id": id, "method": "ping"}))
                .unwrap();
            assert_eq!(ack, InboundAck::Accepted);
        }

        for expected in 1..=5 {
            match next_frame(&mut stream).await {
                SseFrame::Message(reply) => assert_eq!(reply["id"], expected),
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_notifications_produce_no_frames() {
        let registries = Arc::new(SessionRegistries::default());
        let mut stream = open(&registries);
        let transport = stream.transport().clone();
        next_frame(&mut stream).await;

        transport
            .deliver_inbound(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .unwrap();
        transport
            .deliver_inbound(json!({"jsonrpc": "2.0", "id": 7, "method": "ping"}))
            .unwrap();

        match next_frame(&mut stream).await {
            SseFrame::Message(reply) => assert_eq!(reply["id"], 7),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_deliver_after_close_fails() {
        let registries = Arc::new(SessionRegistries::default());
        let stream = open(&registries);
        let transport = stream.transport().clone();
        drop(stream);

        let err = transport
            .deliver_inbound(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))
            .unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_full_inbound_queue_rejects_then_recovers() {
        let registries = Arc::new(SessionRegistries::default());
        let mut stream = open(&registries);
        let transport = stream.transport().clone();
        next_frame(&mut stream).await;

        // Nothing yields in between, so the worker cannot drain the queue
        for id in 0..INBOUND_QUEUE_CAPACITY {
            transport
                .deliver_inbound(json!({"jsonrpc": "2.0", "id": id, "method": "ping"}))
                .unwrap();
        }
        let err = transport
            .deliver_inbound(json!({"jsonrpc": "2.0", "id": "over", "method": "ping"}))
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::QueueFull { capacity } if capacity == INBOUND_QUEUE_CAPACITY
        ));
        assert!(!transport.is_closed());

        // Draining one reply frees a slot
        assert!(matches!(next_frame(&mut stream).await, SseFrame::Message(_)));
        assert_eq!(
            transport
                .deliver_inbound(json!({"jsonrpc": "2.0", "id": "late", "method": "ping"}))
                .unwrap(),
            InboundAck::Accepted
        );
    }

    #[tokio::test]
    async fn test_close_ends_the_event_stream() {
        let registries = Arc::new(SessionRegistries::default());
        let mut stream = open(&registries);
        next_frame(&mut stream).await;

        stream.transport().close();
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_duplicate_id_fails_and_leaves_existing_session() {
        let registries = Arc::new(SessionRegistries::default());
        let existing = open(&registries);
        let id = existing.session_id().clone();

        let result =
            SseTransport::open_with_id(&registries, test_engine(), "/messages", id.clone());
        assert!(matches!(result, Err(SessionError::Duplicate { .. })));

        let found = registries.lookup(TransportKind::Sse, &id).unwrap();
        assert!(!found.is_closed());
        assert!(!existing.transport().is_closed());
    }

    #[test]
    fn test_frames_convert_to_events() {
        // Event has no accessors; just make sure both variants build
        let _ = SseFrame::Endpoint("/messages?sessionId=x".into()).into_event();
        let _ = SseFrame::Message(json!({"jsonrpc": "2.0"})).into_event();
    }
}
