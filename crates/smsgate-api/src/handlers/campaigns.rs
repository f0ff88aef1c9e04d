//! Campaign handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smsgate_common::phone;
use smsgate_common::types::{GatewayId, Recipient};
use smsgate_core::{AdvanceOutcome, CampaignError};
use smsgate_storage::models::{Campaign, CreateCampaign, MessageStatus, PortMode};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use super::{internal_error, ErrorResponse};
use crate::AppState;

/// Map a campaign error onto its HTTP representation
fn campaign_error(e: CampaignError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match &e {
        CampaignError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        CampaignError::EmptyMessage | CampaignError::NoRecipients => {
            (StatusCode::UNPROCESSABLE_ENTITY, "validation_error")
        }
        CampaignError::AlreadyCompleted | CampaignError::Cancelled => {
            (StatusCode::CONFLICT, "invalid_state")
        }
        CampaignError::Database(inner) => {
            error!("Campaign database error: {}", inner);
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
        CampaignError::Internal(inner) => {
            error!("Campaign internal error: {}", inner);
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: e.to_string(),
        }),
    )
}

/// One recipient in a create request
#[derive(Debug, Deserialize)]
pub struct RecipientInput {
    pub phone: String,
    pub name: Option<String>,
}

/// Request body for creating a campaign
#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: Option<String>,
    pub message: String,
    /// Structured recipients
    #[serde(default)]
    pub recipients: Vec<RecipientInput>,
    /// Pasted `phone[,name]` lines, merged with `recipients`
    pub numbers: Option<String>,
    pub gateway_id: Option<GatewayId>,
    #[serde(default = "default_port_mode")]
    pub port_mode: PortMode,
    pub specific_port: Option<i32>,
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: i32,
    pub created_by: Option<String>,
}

fn default_port_mode() -> PortMode {
    PortMode::Random
}

fn default_send_delay_ms() -> i32 {
    1000
}

/// Campaign response
#[derive(Debug, Serialize)]
pub struct CampaignResponse {
    pub id: Uuid,
    pub name: String,
    pub message: String,
    pub status: String,
    pub total_count: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub delivered_count: i32,
    pub gateway_id: Option<GatewayId>,
    pub port_mode: String,
    pub specific_port: Option<i32>,
    pub send_delay_ms: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Campaign> for CampaignResponse {
    fn from(c: Campaign) -> Self {
        Self {
            id: c.id,
            name: c.name,
            message: c.message,
            status: c.status,
            total_count: c.total_count,
            sent_count: c.sent_count,
            failed_count: c.failed_count,
            delivered_count: c.delivered_count,
            gateway_id: c.gateway_id,
            port_mode: c.port_mode,
            specific_port: c.specific_port,
            send_delay_ms: c.send_delay_ms,
            started_at: c.started_at,
            completed_at: c.completed_at,
            created_at: c.created_at,
        }
    }
}

/// Create a campaign
///
/// POST /api/v1/campaigns
pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<CampaignResponse>), (StatusCode, Json<ErrorResponse>)> {
    let mut recipients: Vec<Recipient> = input
        .recipients
        .into_iter()
        .map(|r| Recipient::new(r.phone, r.name))
        .collect();

    if let Some(numbers) = &input.numbers {
        recipients.extend(phone::parse_recipients(numbers));
    }

    let name = input
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("Campaign {}", Utc::now().format("%Y-%m-%d %H:%M")));

    let create = CreateCampaign {
        name,
        message: input.message,
        gateway_id: input.gateway_id,
        port_mode: input.port_mode,
        specific_port: input.specific_port,
        send_delay_ms: input.send_delay_ms,
        created_by: input.created_by,
    };

    let campaign = state
        .campaigns
        .create(create, recipients)
        .await
        .map_err(campaign_error)?;

    Ok((StatusCode::CREATED, Json(campaign.into())))
}

/// Query parameters for listing campaigns
#[derive(Debug, Deserialize)]
pub struct ListCampaignsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Campaign list response
#[derive(Debug, Serialize)]
pub struct CampaignListResponse {
    pub data: Vec<CampaignResponse>,
    pub total: i64,
}

/// List campaigns
///
/// GET /api/v1/campaigns
pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListCampaignsQuery>,
) -> Result<Json<CampaignListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let repo = state.campaigns.campaigns();

    let campaigns = repo.list(query.limit, query.offset).await.map_err(|e| {
        error!("Failed to list campaigns: {}", e);
        internal_error("Failed to list campaigns")
    })?;

    let total = repo.count().await.unwrap_or(0);

    Ok(Json(CampaignListResponse {
        data: campaigns.into_iter().map(CampaignResponse::from).collect(),
        total,
    }))
}

/// Get one campaign
///
/// GET /api/v1/campaigns/:campaign_id
pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, (StatusCode, Json<ErrorResponse>)> {
    let campaign = state
        .campaigns
        .campaigns()
        .get(campaign_id)
        .await
        .map_err(|e| {
            error!("Failed to load campaign: {}", e);
            internal_error("Failed to load campaign")
        })?
        .ok_or_else(|| campaign_error(CampaignError::NotFound))?;

    Ok(Json(campaign.into()))
}

/// Query parameters for listing campaign messages
#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

/// List messages of a campaign
///
/// GET /api/v1/campaigns/:campaign_id/messages
pub async fn list_campaign_messages(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let status = query.status.and_then(|s| s.parse::<MessageStatus>().ok());

    let messages = state
        .campaigns
        .messages()
        .list_by_campaign(campaign_id, status, query.limit, query.offset)
        .await
        .map_err(|e| {
            error!("Failed to list campaign messages: {}", e);
            internal_error("Failed to list campaign messages")
        })?;

    Ok(Json(serde_json::json!({ "data": messages })))
}

/// Campaign stats response, derived from the message rows
#[derive(Debug, Serialize)]
pub struct CampaignStatsResponse {
    pub campaign_id: Uuid,
    pub total: i64,
    pub pending: i64,
    pub sending: i64,
    pub sent: i64,
    pub failed: i64,
    pub delivered: i64,
}

/// Get campaign statistics
///
/// GET /api/v1/campaigns/:campaign_id/stats
pub async fn get_campaign_stats(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignStatsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let counts = state
        .campaigns
        .messages()
        .counts(campaign_id)
        .await
        .map_err(|e| {
            error!("Failed to load campaign stats: {}", e);
            internal_error("Failed to load campaign stats")
        })?;

    Ok(Json(CampaignStatsResponse {
        campaign_id,
        total: counts.total,
        pending: counts.pending,
        sending: counts.sending,
        sent: counts.sent,
        failed: counts.failed,
        delivered: counts.delivered,
    }))
}

/// Start or resume a campaign
///
/// POST /api/v1/campaigns/:campaign_id/start
pub async fn start_campaign(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, (StatusCode, Json<ErrorResponse>)> {
    let campaign = state
        .campaigns
        .start(campaign_id)
        .await
        .map_err(campaign_error)?;
    Ok(Json(campaign.into()))
}

/// Pause a running campaign
///
/// POST /api/v1/campaigns/:campaign_id/pause
pub async fn pause_campaign(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, (StatusCode, Json<ErrorResponse>)> {
    let campaign = state
        .campaigns
        .pause(campaign_id)
        .await
        .map_err(campaign_error)?;
    Ok(Json(campaign.into()))
}

/// Cancel a campaign
///
/// POST /api/v1/campaigns/:campaign_id/cancel
pub async fn cancel_campaign(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, (StatusCode, Json<ErrorResponse>)> {
    let campaign = state
        .campaigns
        .cancel(campaign_id)
        .await
        .map_err(campaign_error)?;
    Ok(Json(campaign.into()))
}

/// Advance step response
#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    pub completed: bool,
    pub message_id: Option<Uuid>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub port: Option<i32>,
    pub delay_ms: i32,
}

impl From<AdvanceOutcome> for AdvanceResponse {
    fn from(o: AdvanceOutcome) -> Self {
        Self {
            completed: o.completed,
            message_id: o.message_id,
            phone: o.phone,
            status: o.status.map(|s| s.to_string()),
            port: o.port,
            delay_ms: o.delay_ms,
        }
    }
}

/// Advance a campaign by one message, for external drivers. The built-in
/// worker calls the same engine entry point.
///
/// POST /api/v1/campaigns/:campaign_id/advance
pub async fn advance_campaign(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<AdvanceResponse>, (StatusCode, Json<ErrorResponse>)> {
    let outcome = state
        .campaigns
        .advance(campaign_id)
        .await
        .map_err(campaign_error)?;
    Ok(Json(outcome.into()))
}

/// Delete a campaign and its messages
///
/// DELETE /api/v1/campaigns/:campaign_id
pub async fn delete_campaign(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let deleted = state
        .campaigns
        .delete(campaign_id)
        .await
        .map_err(campaign_error)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(campaign_error(CampaignError::NotFound))
    }
}
