//! Gateway, port, statistics and settings handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use smsgate_storage::models::{Gateway, GatewayKind, GatewayPort, MessageStats};
use smsgate_storage::repository::gateways::CreateGateway;
use smsgate_storage::repository::settings::SPAM_INTERVAL_KEY;
use smsgate_storage::repository::{
    GatewayRepository, OutboxRepository, PortRepository, SettingsRepository,
};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use super::{internal_error, not_found, validation_error, ErrorResponse};
use crate::AppState;

/// Query parameters for listing gateways
#[derive(Debug, Deserialize)]
pub struct ListGatewaysQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// List configured gateways
///
/// GET /api/v1/gateways
pub async fn list_gateways(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListGatewaysQuery>,
) -> Result<Json<Vec<Gateway>>, (StatusCode, Json<ErrorResponse>)> {
    let repo = GatewayRepository::new(state.db_pool.pool().clone());

    let gateways = repo.list(query.active_only).await.map_err(|e| {
        error!("Failed to list gateways: {}", e);
        internal_error("Failed to list gateways")
    })?;

    Ok(Json(gateways))
}

/// Request body for registering a gateway
#[derive(Debug, Deserialize)]
pub struct CreateGatewayRequest {
    pub name: String,
    pub kind: GatewayKind,
    pub host: String,
    #[serde(default = "default_gateway_port")]
    pub port: i32,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_channels")]
    pub channels: i32,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub priority: i32,
}

fn default_gateway_port() -> i32 {
    80
}

fn default_channels() -> i32 {
    8
}

/// Register a gateway and generate its port rows
///
/// POST /api/v1/gateways
pub async fn create_gateway(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CreateGatewayRequest>,
) -> Result<(StatusCode, Json<Gateway>), (StatusCode, Json<ErrorResponse>)> {
    if input.name.trim().is_empty() {
        return Err(validation_error("Gateway name is required"));
    }
    if input.host.trim().is_empty() {
        return Err(validation_error("Gateway host is required"));
    }
    if input.channels < 1 {
        return Err(validation_error("Channel count must be at least 1"));
    }

    let gateways = GatewayRepository::new(state.db_pool.pool().clone());
    let ports = PortRepository::new(state.db_pool.pool().clone());

    let gateway = gateways
        .create(CreateGateway {
            name: input.name,
            kind: input.kind,
            host: input.host,
            port: input.port,
            username: input.username,
            password: input.password,
            channels: input.channels,
            is_default: input.is_default,
            priority: input.priority,
        })
        .await
        .map_err(|e| {
            error!("Failed to create gateway: {}", e);
            internal_error("Failed to create gateway")
        })?;

    ports
        .create_for_gateway(gateway.id, gateway.channels)
        .await
        .map_err(|e| {
            error!("Failed to create gateway ports: {}", e);
            internal_error("Failed to create gateway ports")
        })?;

    info!("Gateway {} registered ({})", gateway.name, gateway.kind);
    Ok((StatusCode::CREATED, Json(gateway)))
}

/// Make a gateway the default
///
/// POST /api/v1/gateways/:id/default
pub async fn set_default_gateway(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let repo = GatewayRepository::new(state.db_pool.pool().clone());

    let updated = repo.set_default(id).await.map_err(|e| {
        error!("Failed to set default gateway: {}", e);
        internal_error("Failed to set default gateway")
    })?;

    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Gateway not found"))
    }
}

/// List all gateway ports
///
/// GET /api/v1/ports
pub async fn list_ports(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GatewayPort>>, (StatusCode, Json<ErrorResponse>)> {
    let repo = PortRepository::new(state.db_pool.pool().clone());

    let ports = repo.list_all().await.map_err(|e| {
        error!("Failed to list ports: {}", e);
        internal_error("Failed to list ports")
    })?;

    Ok(Json(ports))
}

/// Request body for updating a port
#[derive(Debug, Deserialize)]
pub struct UpdatePortRequest {
    pub port_name: Option<String>,
    pub sim_number: Option<String>,
    pub is_active: Option<bool>,
}

/// Update port metadata
///
/// PUT /api/v1/gateways/:gateway_id/ports/:port_number
pub async fn update_port(
    State(state): State<Arc<AppState>>,
    Path((gateway_id, port_number)): Path<(Uuid, i32)>,
    Json(input): Json<UpdatePortRequest>,
) -> Result<Json<GatewayPort>, (StatusCode, Json<ErrorResponse>)> {
    let repo = PortRepository::new(state.db_pool.pool().clone());

    let port = repo
        .update(
            gateway_id,
            port_number,
            input.port_name,
            input.sim_number,
            input.is_active,
        )
        .await
        .map_err(|e| {
            error!("Failed to update port: {}", e);
            internal_error("Failed to update port")
        })?
        .ok_or_else(|| not_found("Port not found"))?;

    Ok(Json(port))
}

/// Panel-wide message statistics
///
/// GET /api/v1/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageStats>, (StatusCode, Json<ErrorResponse>)> {
    let repo = OutboxRepository::new(state.db_pool.pool().clone());

    let stats = repo.stats().await.map_err(|e| {
        error!("Failed to load stats: {}", e);
        internal_error("Failed to load stats")
    })?;

    Ok(Json(stats))
}

/// Request body for updating the anti-spam interval
#[derive(Debug, Deserialize)]
pub struct SpamIntervalRequest {
    pub seconds: i64,
}

/// Update the anti-spam interval. Persists the setting and applies it to
/// the live throttle immediately.
///
/// PUT /api/v1/settings/spam-interval
pub async fn set_spam_interval(
    State(state): State<Arc<AppState>>,
    Json(input): Json<SpamIntervalRequest>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    if input.seconds < 0 {
        return Err(validation_error("Interval must not be negative"));
    }

    let repo = SettingsRepository::new(state.db_pool.pool().clone());

    repo.set(SPAM_INTERVAL_KEY, &input.seconds.to_string())
        .await
        .map_err(|e| {
            error!("Failed to save spam interval: {}", e);
            internal_error("Failed to save spam interval")
        })?;

    state.throttle.set_interval_secs(input.seconds);
    info!("Anti-spam interval set to {}s", input.seconds);

    Ok(StatusCode::NO_CONTENT)
}
