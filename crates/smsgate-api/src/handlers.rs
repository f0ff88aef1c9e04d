//! API handlers

pub mod campaigns;
pub mod gateways;
pub mod health;
pub mod messages;
pub mod send;
pub mod webhook;

use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;
use smsgate_common::types::AllowedPorts;

/// Error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Map a core error onto its HTTP representation
pub fn core_error(e: smsgate_common::Error) -> (StatusCode, Json<ErrorResponse>) {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorResponse {
            error: e.code().to_lowercase(),
            message: e.to_string(),
        }),
    )
}

/// Standard internal-error response for storage failures
pub fn internal_error(context: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal_error".to_string(),
            message: context.to_string(),
        }),
    )
}

/// Standard validation-error response
pub fn validation_error(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "validation_error".to_string(),
            message: message.to_string(),
        }),
    )
}

/// Standard not-found response
pub fn not_found(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "not_found".to_string(),
            message: message.to_string(),
        }),
    )
}

/// Resolve the port capability set for this request.
///
/// An upstream authenticating proxy states the caller's visible ports in
/// the `x-allowed-ports` header (comma separated); no header means
/// unrestricted, an empty value means no access at all.
pub fn allowed_ports(headers: &HeaderMap) -> AllowedPorts {
    let value = headers.get("x-allowed-ports")?.to_str().ok()?;
    Some(
        value
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_allowed_ports_absent_means_unrestricted() {
        assert_eq!(allowed_ports(&HeaderMap::new()), None);
    }

    #[test]
    fn test_allowed_ports_parses_list() {
        let mut headers = HeaderMap::new();
        headers.insert("x-allowed-ports", HeaderValue::from_static("1, gsm-1.2,3"));
        assert_eq!(
            allowed_ports(&headers),
            Some(vec!["1".to_string(), "gsm-1.2".to_string(), "3".to_string()])
        );
    }

    #[test]
    fn test_allowed_ports_empty_header_means_no_access() {
        let mut headers = HeaderMap::new();
        headers.insert("x-allowed-ports", HeaderValue::from_static(""));
        assert_eq!(allowed_ports(&headers), Some(vec![]));
    }
}
