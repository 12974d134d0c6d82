//! Session Registry
//!
//! One registry per transport kind, mapping a session identifier to the live
//! transport adapter that owns it. Entries are inserted by adapter
//! construction and removed by adapter teardown; the router only reads.

use {
    super::{SessionId, TransportKind},
    crate::error::SessionError,
    crate::limits::ResourceLimits,
    crate::transport::TransportAdapter,
    dashmap::{mapref::entry::Entry, DashMap},
    tracing::{debug, trace},
};

/// Session table for a single transport kind
pub struct SessionRegistry {
    kind: TransportKind,
    entries: DashMap<SessionId, TransportAdapter>,
    max_sessions: Option<usize>,
}

impl SessionRegistry {
    pub fn new(kind: TransportKind, max_sessions: Option<usize>) -> Self {
        Self {
            kind,
            entries: DashMap::new(),
            max_sessions,
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Insert a new session. Fails if the identifier is already live or the
    /// registry is full.
    pub fn register(
        &self,
        session_id: SessionId,
        adapter: TransportAdapter,
    ) -> Result<(), SessionError> {
        // len() must not run while an entry guard is held
        if let Some(max) = self.max_sessions {
            if self.entries.len() >= max {
                return Err(SessionError::TooManySessions {
                    kind: self.kind,
                    max,
                });
            }
        }

        match self.entries.entry(session_id) {
            Entry::Occupied(entry) => Err(SessionError::Duplicate {
                kind: self.kind,
                id: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                trace!(transport = %self.kind, session_id = %entry.key(), "Registering session");
                entry.insert(adapter);
                Ok(())
            }
        }
    }

    /// Resolve a session identifier to its adapter
    pub fn lookup(&self, session_id: &SessionId) -> Result<TransportAdapter, SessionError> {
        self.entries
            .get(session_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SessionError::NotFound {
                kind: self.kind,
                id: session_id.clone(),
            })
    }

    /// Remove a session. Returns the removed adapter, or `None` when the
    /// session was already gone.
    pub fn unregister(&self, session_id: &SessionId) -> Option<TransportAdapter> {
        let removed = self.entries.remove(session_id).map(|(_, adapter)| adapter);
        if removed.is_none() {
            trace!(transport = %self.kind, session_id = %session_id, "Session already unregistered");
        }
        removed
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.entries.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Close and remove every session. Returns how many were closed.
    pub fn close_all(&self) -> usize {
        // Collect first: closing an adapter re-enters unregister on this map
        let ids = self.session_ids();
        let mut closed = 0;
        for id in ids {
            if let Some(adapter) = self.unregister(&id) {
                adapter.close();
                closed += 1;
            }
        }
        debug!(transport = %self.kind, closed = closed, "Closed all sessions");
        closed
    }
}

/// The registries of every transport kind.
///
/// Created once at server startup and shared by reference with the router and
/// the transport adapters; cleared at shutdown.
pub struct SessionRegistries {
    streaming: SessionRegistry,
    sse: SessionRegistry,
}

impl SessionRegistries {
    pub fn new(limits: &ResourceLimits) -> Self {
        Self {
            streaming: SessionRegistry::new(TransportKind::Streaming, limits.max_sessions),
            sse: SessionRegistry::new(TransportKind::Sse, limits.max_sessions),
        }
    }

    pub fn for_kind(&self, kind: TransportKind) -> &SessionRegistry {
        match kind {
            TransportKind::Streaming => &self.streaming,
            TransportKind::Sse => &self.sse,
        }
    }

    pub fn register(
        &self,
        kind: TransportKind,
        session_id: SessionId,
        adapter: TransportAdapter,
    ) -> Result<(), SessionError> {
        self.for_kind(kind).register(session_id, adapter)
    }

    pub fn lookup(
        &self,
        kind: TransportKind,
        session_id: &SessionId,
    ) -> Result<TransportAdapter, SessionError> {
        self.for_kind(kind).lookup(session_id)
    }

    pub fn unregister(&self, kind: TransportKind, session_id: &SessionId) -> Option<TransportAdapter> {
        self.for_kind(kind).unregister(session_id)
    }

    /// Total live sessions across all kinds
    pub fn session_count(&self) -> usize {
        self.streaming.len() + self.sse.len()
    }

    pub fn close_all(&self) -> usize {
        self.streaming.close_all() + self.sse.close_all()
    }
}

impl Default for SessionRegistries {
    fn default() -> Self {
        Self::new(&ResourceLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::{streaming_adapter, test_engine};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_register_then_lookup() {
        let registries = Arc::new(SessionRegistries::default());
        let adapter = streaming_adapter(&registries, test_engine());
        let id = adapter.session_id().clone();

        let found = registries.lookup(TransportKind::Streaming, &id).unwrap();
        assert_eq!(found.session_id(), &id);
        assert_eq!(found.kind(), TransportKind::Streaming);
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_rejected() {
        let registries = Arc::new(SessionRegistries::default());
        let adapter = streaming_adapter(&registries, test_engine());
        let id = adapter.session_id().clone();

        let err = registries
            .register(TransportKind::Streaming, id.clone(), adapter.clone())
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::Duplicate {
                kind: TransportKind::Streaming,
                id
            }
        );
        assert_eq!(registries.for_kind(TransportKind::Streaming).len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_is_scoped_to_kind() {
        let registries = Arc::new(SessionRegistries::default());
        let adapter = streaming_adapter(&registries, test_engine());

        let err = registries
            .lookup(TransportKind::Sse, adapter.session_id())
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound { kind: TransportKind::Sse, .. }));
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registries = Arc::new(SessionRegistries::default());
        let adapter = streaming_adapter(&registries, test_engine());
        let id = adapter.session_id().clone();

        assert!(registries.unregister(TransportKind::Streaming, &id).is_some());
        assert!(registries.unregister(TransportKind::Streaming, &id).is_none());
        assert!(registries.lookup(TransportKind::Streaming, &id).is_err());
    }

    #[tokio::test]
    async fn test_max_sessions_is_enforced() {
        let limits = ResourceLimits {
            max_sessions: Some(2),
            ..ResourceLimits::default()
        };
        let registries = Arc::new(SessionRegistries::new(&limits));
        let engine = test_engine();
        let _a = streaming_adapter(&registries, engine.clone());
        let _b = streaming_adapter(&registries, engine.clone());

        let result = crate::transport::StreamableHttpTransport::create(&registries, engine);
        assert!(matches!(
            result,
            Err(SessionError::TooManySessions { max: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_close_all_closes_adapters() {
        let registries = Arc::new(SessionRegistries::default());
        let engine = test_engine();
        let a = streaming_adapter(&registries, engine.clone());
        let b = streaming_adapter(&registries, engine);

        assert_eq!(registries.session_count(), 2);
        assert_eq!(registries.close_all(), 2);
        assert_eq!(registries.session_count(), 0);
        assert!(a.is_closed());
        assert!(b.is_closed());
    }
}
