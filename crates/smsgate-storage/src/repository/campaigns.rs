//! Campaign repository

use chrono::{DateTime, Utc};
use smsgate_common::types::CampaignId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Campaign, CampaignStatus, CreateCampaign};

/// Campaign repository
#[derive(Clone)]
pub struct CampaignRepository {
    pool: PgPool,
}

impl CampaignRepository {
    /// Create a new campaign repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the database pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a draft campaign
    pub async fn create(
        &self,
        input: &CreateCampaign,
        total_count: i32,
    ) -> Result<Campaign, sqlx::Error> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, Campaign>(
            r#"
            INSERT INTO campaigns (
                id, name, message, total_count, gateway_id, port_mode,
                specific_port, send_delay_ms, created_by, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'draft')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.message)
        .bind(total_count)
        .bind(input.gateway_id)
        .bind(input.port_mode.to_string())
        .bind(input.specific_port)
        .bind(input.send_delay_ms)
        .bind(&input.created_by)
        .fetch_one(&self.pool)
        .await
    }

    /// Get a campaign by ID
    pub async fn get(&self, id: CampaignId) -> Result<Option<Campaign>, sqlx::Error> {
        sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// List campaigns, newest first
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Campaign>, sqlx::Error> {
        sqlx::query_as::<_, Campaign>(
            "SELECT * FROM campaigns ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    /// Count campaigns
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM campaigns")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    /// List campaigns currently in the running state
    pub async fn list_running(&self) -> Result<Vec<Campaign>, sqlx::Error> {
        sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns WHERE status = 'running'")
            .fetch_all(&self.pool)
            .await
    }

    /// Update campaign status. The started timestamp is set on the first
    /// transition to running only; terminal states stamp completion.
    pub async fn update_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let now: DateTime<Utc> = Utc::now();

        let started_at = if status == CampaignStatus::Running {
            Some(now)
        } else {
            None
        };

        let completed_at = if status.is_terminal() { Some(now) } else { None };

        sqlx::query_as::<_, Campaign>(
            r#"
            UPDATE campaigns SET
                status = $2,
                started_at = COALESCE(started_at, $3),
                completed_at = COALESCE($4, completed_at)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .bind(started_at)
        .bind(completed_at)
        .fetch_optional(&self.pool)
        .await
    }

    /// Overwrite the derived aggregate counters
    pub async fn set_counts(
        &self,
        id: CampaignId,
        sent: i64,
        failed: i64,
        delivered: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE campaigns SET
                sent_count = $2,
                failed_count = $3,
                delivered_count = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(sent as i32)
        .bind(failed as i32)
        .bind(delivered as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a campaign; message rows cascade
    pub async fn delete(&self, id: CampaignId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
