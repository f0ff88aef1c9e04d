//! Outbox repository for ad-hoc sends

use chrono::Utc;
use smsgate_common::types::{AllowedPorts, GatewayId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{MessageStats, MessageStatus, OutboxMessage};

/// Outbox repository
#[derive(Clone)]
pub struct OutboxRepository {
    pool: PgPool,
}

impl OutboxRepository {
    /// Create a new outbox repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the pending record written before the gateway is called
    pub async fn create_pending(
        &self,
        phone_number: &str,
        message: &str,
        port: Option<&str>,
        gateway_id: Option<GatewayId>,
    ) -> Result<Uuid, sqlx::Error> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO outbox (id, phone_number, message, port, status, gateway_id)
            VALUES ($1, $2, $3, $4, 'pending', $5)
            "#,
        )
        .bind(id)
        .bind(phone_number)
        .bind(message)
        .bind(port)
        .bind(gateway_id)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Finalize the record once the gateway answered
    pub async fn finalize(
        &self,
        id: Uuid,
        status: MessageStatus,
        status_message: &str,
        port: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let sent_at = if status == MessageStatus::Failed {
            None
        } else {
            Some(Utc::now())
        };

        sqlx::query(
            r#"
            UPDATE outbox SET
                status = $2,
                status_message = $3,
                port = COALESCE($4, port),
                sent_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .bind(status_message)
        .bind(port)
        .bind(sent_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Port token of the most recent dispatched record, for global linear
    /// allocation. Stored in the family's display notation; callers parse.
    pub async fn last_used_port(&self) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(Option<String>,)> = sqlx::query_as(
            "SELECT port FROM outbox WHERE port IS NOT NULL ORDER BY seq DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|(p,)| p))
    }

    /// List outbox records newest first, with optional search, status and
    /// port-capability filters. An empty allowed-port set returns nothing.
    pub async fn list(
        &self,
        search: Option<&str>,
        status: Option<MessageStatus>,
        allowed_ports: &AllowedPorts,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OutboxMessage>, i64), sqlx::Error> {
        if matches!(allowed_ports, Some(ports) if ports.is_empty()) {
            return Ok((Vec::new(), 0));
        }

        let pattern = search.map(|s| format!("%{}%", s));
        let status_str = status.map(|s| s.to_string());

        let rows = sqlx::query_as::<_, OutboxMessage>(
            r#"
            SELECT * FROM outbox
            WHERE ($1::text IS NULL OR phone_number LIKE $1 OR message LIKE $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text[] IS NULL OR port = ANY($3))
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(&pattern)
        .bind(&status_str)
        .bind(allowed_ports.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM outbox
            WHERE ($1::text IS NULL OR phone_number LIKE $1 OR message LIKE $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text[] IS NULL OR port = ANY($3))
            "#,
        )
        .bind(&pattern)
        .bind(&status_str)
        .bind(allowed_ports.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total.0))
    }

    /// Delete one record
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM outbox WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Panel-wide message statistics
    pub async fn stats(&self) -> Result<MessageStats, sqlx::Error> {
        let outbox: (i64, i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'sent' OR status = 'delivered'),
                COUNT(*) FILTER (WHERE status = 'failed'),
                COUNT(*) FILTER (WHERE status = 'pending'),
                COUNT(*) FILTER (WHERE created_at::date = CURRENT_DATE)
            FROM outbox
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let inbox: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE is_read = FALSE),
                COUNT(*) FILTER (WHERE received_at::date = CURRENT_DATE)
            FROM inbox
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(MessageStats {
            inbox_total: inbox.0,
            inbox_unread: inbox.1,
            outbox_total: outbox.0,
            outbox_sent: outbox.1,
            outbox_failed: outbox.2,
            outbox_pending: outbox.3,
            today_sent: outbox.4,
            today_received: inbox.2,
        })
    }
}
