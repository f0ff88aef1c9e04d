//! Outbox and inbox handlers

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use smsgate_storage::models::{InboxMessage, MessageStatus, OutboxMessage};
use smsgate_storage::repository::{InboxRepository, OutboxRepository};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use super::{allowed_ports, internal_error, not_found, ErrorResponse};
use crate::AppState;

/// Query parameters for listing the outbox
#[derive(Debug, Deserialize)]
pub struct OutboxQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

/// Paged listing response
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
}

/// List outbox records
///
/// GET /api/v1/outbox
pub async fn list_outbox(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<OutboxQuery>,
) -> Result<Json<ListResponse<OutboxMessage>>, (StatusCode, Json<ErrorResponse>)> {
    let repo = OutboxRepository::new(state.db_pool.pool().clone());
    let ports = allowed_ports(&headers);
    let status = query.status.and_then(|s| s.parse::<MessageStatus>().ok());

    let (data, total) = repo
        .list(
            query.search.as_deref(),
            status,
            &ports,
            query.limit,
            query.offset,
        )
        .await
        .map_err(|e| {
            error!("Failed to list outbox: {}", e);
            internal_error("Failed to list outbox")
        })?;

    Ok(Json(ListResponse { data, total }))
}

/// Delete an outbox record
///
/// DELETE /api/v1/outbox/:id
pub async fn delete_outbox(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let repo = OutboxRepository::new(state.db_pool.pool().clone());

    let deleted = repo.delete(id).await.map_err(|e| {
        error!("Failed to delete outbox record: {}", e);
        internal_error("Failed to delete outbox record")
    })?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Outbox record not found"))
    }
}

/// Query parameters for listing the inbox
#[derive(Debug, Deserialize)]
pub struct InboxQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

/// List inbox messages
///
/// GET /api/v1/inbox
pub async fn list_inbox(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<InboxQuery>,
) -> Result<Json<ListResponse<InboxMessage>>, (StatusCode, Json<ErrorResponse>)> {
    let repo = InboxRepository::new(state.db_pool.pool().clone());
    let ports = allowed_ports(&headers);

    let (data, total) = repo
        .list(
            query.search.as_deref(),
            query.unread_only,
            &ports,
            query.limit,
            query.offset,
        )
        .await
        .map_err(|e| {
            error!("Failed to list inbox: {}", e);
            internal_error("Failed to list inbox")
        })?;

    Ok(Json(ListResponse { data, total }))
}

/// Unread count response
#[derive(Debug, Serialize)]
pub struct UnreadResponse {
    pub unread: i64,
}

/// Unread message count
///
/// GET /api/v1/inbox/unread
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UnreadResponse>, (StatusCode, Json<ErrorResponse>)> {
    let repo = InboxRepository::new(state.db_pool.pool().clone());

    let unread = repo.unread_count().await.map_err(|e| {
        error!("Failed to count unread: {}", e);
        internal_error("Failed to count unread")
    })?;

    Ok(Json(UnreadResponse { unread }))
}

/// Mark one message as read
///
/// POST /api/v1/inbox/:id/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let repo = InboxRepository::new(state.db_pool.pool().clone());

    let updated = repo.mark_read(id).await.map_err(|e| {
        error!("Failed to mark message read: {}", e);
        internal_error("Failed to mark message read")
    })?;

    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Inbox message not found"))
    }
}

/// Mark all messages as read
///
/// POST /api/v1/inbox/read-all
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let repo = InboxRepository::new(state.db_pool.pool().clone());

    repo.mark_all_read().await.map_err(|e| {
        error!("Failed to mark all read: {}", e);
        internal_error("Failed to mark all read")
    })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete an inbox message
///
/// DELETE /api/v1/inbox/:id
pub async fn delete_inbox(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let repo = InboxRepository::new(state.db_pool.pool().clone());

    let deleted = repo.delete(id).await.map_err(|e| {
        error!("Failed to delete inbox message: {}", e);
        internal_error("Failed to delete inbox message")
    })?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Inbox message not found"))
    }
}
