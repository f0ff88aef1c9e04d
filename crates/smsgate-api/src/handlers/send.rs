//! Ad-hoc and bulk send handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use smsgate_common::types::GatewayId;
use smsgate_storage::models::PortMode;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use super::{core_error, validation_error, ErrorResponse};
use crate::AppState;

/// Request body for a single send
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub phone: String,
    pub message: String,
    pub port: Option<i32>,
    pub gateway_id: Option<GatewayId>,
}

/// Response for a single send
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub success: bool,
    pub status: String,
    pub message: String,
    pub outbox_id: Uuid,
    pub gateway_id: GatewayId,
    pub port: Option<String>,
}

/// Send one SMS
///
/// POST /api/v1/send
pub async fn send_sms(
    State(state): State<Arc<AppState>>,
    Json(input): Json<SendRequest>,
) -> Result<Json<SendResponse>, (StatusCode, Json<ErrorResponse>)> {
    if input.message.trim().is_empty() {
        return Err(validation_error("Message is required"));
    }
    if input.phone.trim().is_empty() {
        return Err(validation_error("Phone number is required"));
    }

    let outcome = state
        .dispatch
        .send_one(&input.phone, &input.message, input.port, input.gateway_id)
        .await
        .map_err(core_error)?;

    Ok(Json(SendResponse {
        success: outcome.success(),
        status: outcome.status.to_string(),
        message: outcome.status_message,
        outbox_id: outcome.outbox_id,
        gateway_id: outcome.gateway_id,
        port: outcome.port,
    }))
}

/// Request body for a bulk send
#[derive(Debug, Deserialize)]
pub struct BulkSendRequest {
    pub phones: Vec<String>,
    pub message: String,
    #[serde(default = "default_port_mode")]
    pub port_mode: PortMode,
    pub specific_port: Option<i32>,
    pub gateway_id: Option<GatewayId>,
}

fn default_port_mode() -> PortMode {
    PortMode::Random
}

/// One per-recipient bulk result
#[derive(Debug, Serialize)]
pub struct BulkItemResponse {
    pub phone: String,
    pub success: bool,
    pub status: Option<String>,
    pub error: Option<String>,
}

/// Bulk send response
#[derive(Debug, Serialize)]
pub struct BulkSendResponse {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub results: Vec<BulkItemResponse>,
}

/// Send one message to many recipients
///
/// POST /api/v1/send/bulk
pub async fn send_bulk(
    State(state): State<Arc<AppState>>,
    Json(input): Json<BulkSendRequest>,
) -> Result<Json<BulkSendResponse>, (StatusCode, Json<ErrorResponse>)> {
    if input.message.trim().is_empty() {
        return Err(validation_error("Message is required"));
    }
    if input.phones.is_empty() {
        return Err(validation_error("At least one phone number is required"));
    }

    let items = state
        .dispatch
        .send_bulk(
            &input.phones,
            &input.message,
            input.port_mode,
            input.specific_port,
            input.gateway_id,
        )
        .await
        .map_err(|e| {
            error!("Bulk send failed: {}", e);
            core_error(e)
        })?;

    let results: Vec<BulkItemResponse> = items
        .into_iter()
        .map(|item| match item.outcome {
            Ok(outcome) => BulkItemResponse {
                phone: item.phone,
                success: outcome.success(),
                status: Some(outcome.status.to_string()),
                error: None,
            },
            Err(e) => BulkItemResponse {
                phone: item.phone,
                success: false,
                status: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    let sent = results.iter().filter(|r| r.success).count();

    Ok(Json(BulkSendResponse {
        total: results.len(),
        sent,
        failed: results.len() - sent,
        results,
    }))
}
