//! Health Check Tests
//!
//! Tests for the health check endpoint functionality

use gatewaymcp::HealthStatus;
use serde_json::Value;
use std::time::{Duration, Instant};

use mcp_test_helpers::*;

#[tokio::test]
async fn test_health_endpoint_returns_json() -> TestResult {
    let server = GatewayTestServer::start().await?;

    let response = server.client.get(server.url("/health")).send().await?;
    assert_eq!(response.status(), 200);

    let health_json: Value = response.json().await?;
    assert_eq!(health_json["status"], "healthy");
    assert!(health_json["timestamp"].is_u64());
    assert!(health_json["version"].is_string());
    assert!(health_json["uptime_seconds"].is_u64());
    assert_eq!(health_json["session_count"], 0);
    assert_eq!(health_json["metadata"]["server_name"], "mcp-sse-server");
    assert_eq!(health_json["metadata"]["protocol_version"], "2025-06-18");

    // The body deserializes into the public type
    let _: HealthStatus = serde_json::from_value(health_json)?;

    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_health_counts_live_sessions() -> TestResult {
    let server = GatewayTestServer::start().await?;

    let mut reader = SseReader::connect(&server.client, &server.url("/sse")).await?;
    reader.next_event().await?;
    server
        .client
        .post(server.url("/mcp"))
        .json(&initialize_request(1))
        .send()
        .await?;

    let health: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(health["session_count"], 2);
    assert_eq!(health["metadata"]["sse_sessions"], 1);
    assert_eq!(health["metadata"]["streamable_sessions"], 1);

    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_health_check_performance() -> TestResult {
    let server = GatewayTestServer::start().await?;
    let url = server.url("/health");

    // Warm up
    server.client.get(&url).send().await?;

    let started = Instant::now();
    for _ in 0..20 {
        let response = server.client.get(&url).send().await?;
        assert_eq!(response.status(), 200);
    }
    assert!(started.elapsed() < Duration::from_secs(5));

    server.stop().await;
    Ok(())
}
