//! Resource limits for the gateway
//!
//! Bounds on live sessions and inbound message size.

use serde::{Deserialize, Serialize};

/// Configuration for various resource limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum number of concurrent sessions per transport kind
    pub max_sessions: Option<usize>,

    /// Maximum inbound message size in bytes
    pub max_message_size: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_sessions: Some(10_000),
            max_message_size: 4 * 1024 * 1024, // 4MB
        }
    }
}
