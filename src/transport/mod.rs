//! Transport adapters
//!
//! A transport adapter owns one session: its identifier, its protocol state
//! and the channel replies travel back on. Both transports satisfy the same
//! registry contract: they register on construction and unregister on close,
//! and close is idempotent.

pub mod sse;
pub mod streaming;

pub use sse::{SseFrame, SseEventStream, SseTransport};
pub use streaming::StreamableHttpTransport;

use {
    crate::error::TransportError,
    crate::session::{SessionId, TransportKind},
    serde_json::Value,
    std::sync::Arc,
};

/// What the transport made of an inbound payload
#[derive(Debug, Clone, PartialEq)]
pub enum InboundAck {
    /// Queued; any reply travels on the session's own outbound channel
    Accepted,
    /// Processed in-line; reply goes in the HTTP response
    Reply(Value),
}

/// A live session adapter of either transport kind
#[derive(Clone)]
pub enum TransportAdapter {
    Streaming(Arc<StreamableHttpTransport>),
    Sse(Arc<SseTransport>),
}

impl TransportAdapter {
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Streaming(_) => TransportKind::Streaming,
            Self::Sse(_) => TransportKind::Sse,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Streaming(t) => t.session_id(),
            Self::Sse(t) => t.session_id(),
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            Self::Streaming(t) => t.is_closed(),
            Self::Sse(t) => t.is_closed(),
        }
    }

    /// Tear the session down and drop it from its registry
    pub fn close(&self) {
        match self {
            Self::Streaming(t) => t.close(),
            Self::Sse(t) => t.close(),
        }
    }

    /// Hand a protocol payload to the session
    pub async fn deliver_inbound(&self, payload: Value) -> Result<InboundAck, TransportError> {
        match self {
            Self::Streaming(t) => t.deliver_inbound(payload).await,
            Self::Sse(t) => t.deliver_inbound(payload),
        }
    }
}

impl std::fmt::Debug for TransportAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportAdapter")
            .field("kind", &self.kind())
            .field("session_id", self.session_id())
            .field("closed", &self.is_closed())
            .finish()
    }
}
