//! Shared reqwest-to-gateway error mapping for both gateways.

use taskcal_core::gateway::GatewayError;

/// A request that never produced a response: connect failure, timeout,
/// broken body. Always worth retrying on a later run.
pub fn transport_error(err: reqwest::Error) -> GatewayError {
    GatewayError::Transient(err.to_string())
}

/// Map an error status onto the engine's taxonomy; success passes the
/// response through for body parsing.
pub async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = format!("{status}: {body}");
    match status.as_u16() {
        404 | 410 => Err(GatewayError::NotFound(detail)),
        429 => Err(GatewayError::Transient(detail)),
        s if s >= 500 => Err(GatewayError::Transient(detail)),
        _ => Err(GatewayError::Rejected(detail)),
    }
}
