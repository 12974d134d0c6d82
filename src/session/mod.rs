//! Session addressing
//!
//! Session identifiers, transport kinds and the per-kind session registries
//! that map an identifier to its live transport adapter.

pub mod registry;

pub use registry::{SessionRegistries, SessionRegistry};

use {
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

/// Opaque session token handed to clients.
///
/// Unique among the live sessions of one transport kind; generated when the
/// owning transport adapter is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Allocate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Wire transport a session is bound to. Each kind has its own registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Streamable HTTP on `/mcp`
    Streaming,
    /// Legacy `/sse` event stream plus `/messages` POST channel
    Sse,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Streaming => write!(f, "streamable"),
            TransportKind::Sse => write!(f, "sse"),
        }
    }
}
