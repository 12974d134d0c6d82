//! HTTP Router
//!
//! warp filters mapping the gateway's HTTP surface onto transport adapters,
//! plus response building and body validation.

pub mod response;
pub mod routes;
pub mod validation;

pub use response::{ResponseBuilder, MCP_SESSION_ID_HEADER, NO_TRANSPORT_FOUND};
pub use routes::{gateway_routes, GatewayState, MESSAGES_PATH};
pub use validation::{contains_initialize, parse_payload, PayloadError};
