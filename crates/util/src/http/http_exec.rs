//! HTTP execution helpers for the Galaxy REST API.
//!
//! Centralizes request logging, status handling and JSON parsing so the
//! individual API operations only describe method, path and payload.

use std::time::Instant;

use anyhow::anyhow;
use glxy_api::GalaxyClient;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use crate::http::{parse_response_json_strict, status_error_message};

/// Execute a JSON-backed HTTP request and parse the response payload.
///
/// # Arguments
/// - `client`: Preconfigured Galaxy client with base URL and headers.
/// - `method`: HTTP method to execute.
/// - `request_path`: API-relative path (`/api/libraries`).
/// - `query_parameters`: Query string pairs.
/// - `body`: Optional JSON body, sent for any method when present.
///
/// # Returns
/// The parsed JSON payload for a successful response, `Value::Null` for empty
/// bodies, or an error describing the HTTP or parse failure.
pub async fn execute_http_json_request(
    client: &GalaxyClient,
    method: Method,
    request_path: &str,
    query_parameters: &[(&str, String)],
    body: Option<&Value>,
) -> anyhow::Result<Value> {
    let start = Instant::now();
    debug!(
        method = %method,
        path = %request_path,
        query_parameter_count = query_parameters.len(),
        has_body = body.is_some(),
        "http request started"
    );
    let mut request_builder = client.request(method.clone(), request_path);
    if !query_parameters.is_empty() {
        request_builder = request_builder.query(query_parameters);
    }
    if let Some(body) = body {
        request_builder = request_builder.json(body);
    }

    let response = request_builder
        .send()
        .await
        .map_err(|error| anyhow!("Network error: {}. Hint: check the Galaxy URL and your connection.", error))?;
    let status = response.status();
    let body_text = response.text().await.map_err(|error| anyhow!(error))?;

    if !status.is_success() {
        let detail = crate::redact_sensitive(body_text.trim());
        warn!(
            method = %method,
            path = %request_path,
            status = %status,
            duration_ms = start.elapsed().as_millis(),
            "http request failed"
        );
        let hint = status_error_message(status.as_u16())
            .map(|hint| format!(" {hint}"))
            .unwrap_or_default();
        return Err(anyhow!("{} {} failed with {}:{} {}", method, request_path, status, hint, detail));
    }

    if body_text.trim().is_empty() {
        debug!(
            method = %method,
            path = %request_path,
            status = %status,
            duration_ms = start.elapsed().as_millis(),
            "http request completed with empty response"
        );
        return Ok(Value::Null);
    }

    let parsed = parse_response_json_strict(&body_text, Some(status)).map_err(|error| {
        warn!(
            method = %method,
            path = %request_path,
            status = %status,
            body_len = body_text.len(),
            duration_ms = start.elapsed().as_millis(),
            error = %error,
            "http response JSON parse failed"
        );
        anyhow!(error)
    })?;
    debug!(
        method = %method,
        path = %request_path,
        status = %status,
        duration_ms = start.elapsed().as_millis(),
        "http request completed"
    );
    Ok(parsed)
}
