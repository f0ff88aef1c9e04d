//! Campaign message repository

use chrono::{DateTime, Utc};
use smsgate_common::types::CampaignId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CampaignMessage, CampaignMessageCounts, MessageStatus};

/// Input for one campaign message row
#[derive(Debug, Clone)]
pub struct CreateCampaignMessage {
    pub campaign_id: CampaignId,
    pub phone_number: String,
    pub contact_name: Option<String>,
    pub message: String,
}

/// Campaign message repository
#[derive(Clone)]
pub struct CampaignMessageRepository {
    pool: PgPool,
}

impl CampaignMessageRepository {
    /// Create a new campaign message repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert all recipient rows of a campaign in one transaction
    pub async fn create_batch(
        &self,
        messages: Vec<CreateCampaignMessage>,
    ) -> Result<u64, sqlx::Error> {
        let mut count = 0u64;
        let mut tx = self.pool.begin().await?;

        for input in messages {
            let result = sqlx::query(
                r#"
                INSERT INTO campaign_messages (
                    id, campaign_id, phone_number, contact_name, message, status
                )
                VALUES ($1, $2, $3, $4, $5, 'pending')
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(input.campaign_id)
            .bind(&input.phone_number)
            .bind(&input.contact_name)
            .bind(&input.message)
            .execute(&mut *tx)
            .await?;

            count += result.rows_affected();
        }

        tx.commit().await?;
        Ok(count)
    }

    /// Oldest pending message of a campaign, by insertion order
    pub async fn next_pending(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<CampaignMessage>, sqlx::Error> {
        sqlx::query_as::<_, CampaignMessage>(
            r#"
            SELECT * FROM campaign_messages
            WHERE campaign_id = $1 AND status = 'pending'
            ORDER BY seq ASC
            LIMIT 1
            "#,
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Mark a message as in flight
    pub async fn mark_sending(&self, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE campaign_messages SET status = 'sending' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Record a successful dispatch
    pub async fn mark_sent(
        &self,
        id: Uuid,
        port: i32,
        port_name: &str,
        gateway_response: &str,
        gateway_message_id: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE campaign_messages SET
                status = 'sent',
                port = $2,
                port_name = $3,
                gateway_response = $4,
                gateway_message_id = $5,
                sent_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(port)
        .bind(port_name)
        .bind(gateway_response)
        .bind(gateway_message_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a failed dispatch
    pub async fn mark_failed(
        &self,
        id: Uuid,
        port: i32,
        port_name: &str,
        error_message: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE campaign_messages SET
                status = 'failed',
                port = $2,
                port_name = $3,
                error_message = $4,
                sent_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(port)
        .bind(port_name)
        .bind(error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Derived status counts for a campaign
    pub async fn counts(
        &self,
        campaign_id: CampaignId,
    ) -> Result<CampaignMessageCounts, sqlx::Error> {
        sqlx::query_as::<_, CampaignMessageCounts>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'sending') AS sending,
                COUNT(*) FILTER (WHERE status = 'sent') AS sent,
                COUNT(*) FILTER (WHERE status = 'failed') AS failed,
                COUNT(*) FILTER (WHERE status = 'delivered') AS delivered
            FROM campaign_messages
            WHERE campaign_id = $1
            "#,
        )
        .bind(campaign_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Port of the most recently dispatched message in this campaign,
    /// used by linear allocation.
    pub async fn last_used_port(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<i32>, sqlx::Error> {
        let row: Option<(Option<i32>,)> = sqlx::query_as(
            r#"
            SELECT port FROM campaign_messages
            WHERE campaign_id = $1 AND port IS NOT NULL
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.and_then(|(p,)| p))
    }

    /// List messages of a campaign, optionally filtered by status
    pub async fn list_by_campaign(
        &self,
        campaign_id: CampaignId,
        status: Option<MessageStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CampaignMessage>, sqlx::Error> {
        if let Some(status) = status {
            sqlx::query_as::<_, CampaignMessage>(
                r#"
                SELECT * FROM campaign_messages
                WHERE campaign_id = $1 AND status = $2
                ORDER BY seq ASC
                LIMIT $3 OFFSET $4
                "#,
            )
            .bind(campaign_id)
            .bind(status.to_string())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, CampaignMessage>(
                r#"
                SELECT * FROM campaign_messages
                WHERE campaign_id = $1
                ORDER BY seq ASC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(campaign_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
        }
    }

    /// Apply a delivery report by the gateway-assigned message id.
    /// Returns the owning campaign when a row matched.
    pub async fn update_delivery(
        &self,
        gateway_message_id: &str,
        status: MessageStatus,
        delivered_at: DateTime<Utc>,
    ) -> Result<Option<CampaignId>, sqlx::Error> {
        let row: Option<(CampaignId,)> = sqlx::query_as(
            r#"
            UPDATE campaign_messages SET
                status = $2,
                delivered_at = $3
            WHERE gateway_message_id = $1
            RETURNING campaign_id
            "#,
        )
        .bind(gateway_message_id)
        .bind(status.to_string())
        .bind(delivered_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id,)| id))
    }
}
