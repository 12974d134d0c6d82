//! Gateway routes
//!
//! - `GET /sse` opens a legacy SSE session
//! - `POST /messages?sessionId=...` feeds a legacy SSE session
//! - `/mcp` carries the streamable HTTP transport (POST, GET, DELETE)
//! - `GET /health` reports liveness
//!
//! `/messages` only ever reads the registries. New sessions are registered by
//! the transport constructors and removed by their close paths.

use {
    super::response::{
        method_not_allowed, no_valid_session_response, session_error_response, text_response,
        ResponseBuilder, INVALID_OR_MISSING_SESSION, MCP_SESSION_ID_HEADER, NO_TRANSPORT_FOUND,
    },
    super::validation::{contains_initialize, parse_payload, PayloadError},
    crate::engine::McpProtocolEngine,
    crate::error::{McpError, TransportError},
    crate::health::HealthChecker,
    crate::logging,
    crate::session::{SessionId, SessionRegistries, TransportKind},
    crate::transport::{InboundAck, SseTransport, StreamableHttpTransport, TransportAdapter},
    futures_util::StreamExt,
    std::collections::HashMap,
    std::convert::Infallible,
    std::sync::Arc,
    std::time::Duration,
    tracing::{warn, Instrument},
    warp::http::{Method, StatusCode},
    warp::hyper::body::Bytes,
    warp::reply::Response,
    warp::{Filter, Rejection, Reply},
};

/// Where SSE clients POST their messages; announced in the `endpoint` event
pub const MESSAGES_PATH: &str = "/messages";

/// Everything the route handlers share
#[derive(Clone)]
pub struct GatewayState {
    pub registries: Arc<SessionRegistries>,
    pub engine: Arc<McpProtocolEngine>,
    pub health: Arc<HealthChecker>,
    pub sse_keep_alive: Duration,
    pub max_message_size: u64,
}

/// Query parameter naming the SSE session on `/messages`
const SESSION_ID_PARAM: &str = "sessionId";

pub fn gateway_routes(
    state: GatewayState,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let mcp_route = warp::path!("mcp")
        .and(warp::method())
        .and(warp::header::optional::<String>(MCP_SESSION_ID_HEADER))
        .and(warp::body::bytes())
        .and(with_state(state.clone()))
        .and_then(handle_mcp);

    let sse_route = warp::path!("sse")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handle_sse_connect);

    let messages_route = warp::path!("messages")
        .and(warp::post())
        // A map never fails to decode; a repeated parameter keeps its last value
        .and(warp::query::<HashMap<String, String>>())
        .and(warp::body::bytes())
        .and(with_state(state.clone()))
        .and_then(handle_sse_message);

    let health_route = warp::path!("health")
        .and(warp::get())
        .and(with_state(state))
        .map(|state: GatewayState| {
            ResponseBuilder::new().json(&state.health.get_json_status(&state.registries))
        });

    mcp_route
        .or(sse_route)
        .unify()
        .or(messages_route)
        .unify()
        .or(health_route)
        .unify()
}

fn with_state(
    state: GatewayState,
) -> impl Filter<Extract = (GatewayState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Find a live adapter for a client-supplied session id
fn resolve_session(
    registries: &SessionRegistries,
    kind: TransportKind,
    session_id: Option<&str>,
) -> Option<TransportAdapter> {
    let raw = session_id?;
    match registries.lookup(kind, &SessionId::from(raw)) {
        Ok(adapter) if !adapter.is_closed() => Some(adapter),
        _ => {
            logging::log_session_lookup_failed(kind, raw);
            None
        }
    }
}

async fn handle_sse_connect(state: GatewayState) -> Result<Response, Rejection> {
    let stream = match SseTransport::open(&state.registries, state.engine.clone(), MESSAGES_PATH) {
        Ok(stream) => stream,
        Err(e) => return Ok(session_error_response(&e)),
    };

    let events = stream.map(|frame| Ok::<_, Infallible>(frame.into_event()));
    let keep_alive = warp::sse::keep_alive().interval(state.sse_keep_alive);
    Ok(warp::sse::reply(keep_alive.stream(events)).into_response())
}

async fn handle_sse_message(
    query: HashMap<String, String>,
    body: Bytes,
    state: GatewayState,
) -> Result<Response, Rejection> {
    let session_id = query.get(SESSION_ID_PARAM).map(String::as_str);
    let request_id = logging::generate_request_id();
    let span = logging::request_span(MESSAGES_PATH, &request_id, session_id);

    async move {
        let Some(adapter) = resolve_session(&state.registries, TransportKind::Sse, session_id)
        else {
            return Ok(text_response(StatusCode::BAD_REQUEST, NO_TRANSPORT_FOUND));
        };

        let payload = match parse_payload(&body, state.max_message_size) {
            Ok(payload) => payload,
            Err(e @ PayloadError::TooLarge { .. }) => {
                return Ok(text_response(StatusCode::PAYLOAD_TOO_LARGE, e.to_string()))
            }
            Err(PayloadError::InvalidJson(_)) => {
                return Ok(text_response(StatusCode::BAD_REQUEST, "Invalid message"))
            }
        };

        logging::log_message_forwarded(TransportKind::Sse, adapter.session_id(), body.len());
        Ok(match adapter.deliver_inbound(payload).await {
            Ok(InboundAck::Accepted) => text_response(StatusCode::ACCEPTED, "Accepted"),
            Ok(InboundAck::Reply(reply)) => ResponseBuilder::new().json(&reply),
            // Torn down between lookup and delivery
            Err(TransportError::ConnectionClosed) => {
                text_response(StatusCode::BAD_REQUEST, NO_TRANSPORT_FOUND)
            }
            Err(e @ TransportError::QueueFull { .. }) => {
                warn!(error = %e, "Rejecting SSE message");
                text_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
        })
    }
    .instrument(span)
    .await
}

async fn handle_mcp(
    method: Method,
    session_header: Option<String>,
    body: Bytes,
    state: GatewayState,
) -> Result<Response, Rejection> {
    let request_id = logging::generate_request_id();
    let span = logging::request_span("/mcp", &request_id, session_header.as_deref());

    async move {
        let response = match method {
            Method::POST => handle_mcp_post(session_header.as_deref(), &body, &state).await,
            Method::GET => match resolve_session(
                &state.registries,
                TransportKind::Streaming,
                session_header.as_deref(),
            ) {
                // No standalone server-initiated stream is offered
                Some(_) => method_not_allowed("POST, DELETE"),
                None => text_response(StatusCode::BAD_REQUEST, INVALID_OR_MISSING_SESSION),
            },
            Method::DELETE => match resolve_session(
                &state.registries,
                TransportKind::Streaming,
                session_header.as_deref(),
            ) {
                Some(adapter) => {
                    adapter.close();
                    ResponseBuilder::new().empty()
                }
                None => text_response(StatusCode::BAD_REQUEST, INVALID_OR_MISSING_SESSION),
            },
            _ => method_not_allowed("GET, POST, DELETE"),
        };
        Ok(response)
    }
    .instrument(span)
    .await
}

async fn handle_mcp_post(
    session_header: Option<&str>,
    body: &[u8],
    state: &GatewayState,
) -> Response {
    let payload = match parse_payload(body, state.max_message_size) {
        Ok(payload) => payload,
        Err(e @ PayloadError::TooLarge { .. }) => {
            return text_response(StatusCode::PAYLOAD_TOO_LARGE, e.to_string())
        }
        Err(PayloadError::InvalidJson(e)) => {
            return ResponseBuilder::new()
                .with_status(StatusCode::BAD_REQUEST)
                .json(&McpError::from(e).to_json_rpc_error(None))
        }
    };

    let adapter = match session_header {
        Some(raw) => {
            match resolve_session(&state.registries, TransportKind::Streaming, Some(raw)) {
                Some(adapter) => adapter,
                None => return no_valid_session_response(),
            }
        }
        None if contains_initialize(&payload) => {
            match StreamableHttpTransport::create(&state.registries, state.engine.clone()) {
                Ok(transport) => TransportAdapter::Streaming(transport),
                Err(e) => return session_error_response(&e),
            }
        }
        None => return no_valid_session_response(),
    };

    let session_id = adapter.session_id().clone();
    logging::log_message_forwarded(TransportKind::Streaming, &session_id, body.len());

    match adapter.deliver_inbound(payload).await {
        Ok(InboundAck::Reply(reply)) => ResponseBuilder::new().with_session(&session_id).json(&reply),
        Ok(InboundAck::Accepted) => ResponseBuilder::new()
            .with_status(StatusCode::ACCEPTED)
            .with_session(&session_id)
            .empty(),
        Err(TransportError::ConnectionClosed) => no_valid_session_response(),
        Err(e @ TransportError::QueueFull { .. }) => {
            warn!(session_id = %session_id, error = %e, "Rejecting streamable HTTP message");
            text_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    }
}
