//! Inbox repository for received SMS

use smsgate_common::types::AllowedPorts;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateInboxMessage, InboxMessage};

/// Inbox repository
#[derive(Clone)]
pub struct InboxRepository {
    pool: PgPool,
}

impl InboxRepository {
    /// Create a new inbox repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store an inbound SMS
    pub async fn create(&self, input: CreateInboxMessage) -> Result<InboxMessage, sqlx::Error> {
        sqlx::query_as::<_, InboxMessage>(
            r#"
            INSERT INTO inbox (
                id, phone_number, message, port, port_name, imsi, received_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.phone_number)
        .bind(&input.message)
        .bind(&input.port)
        .bind(&input.port_name)
        .bind(&input.imsi)
        .bind(input.received_at)
        .fetch_one(&self.pool)
        .await
    }

    /// List inbox messages newest first, with optional search, unread and
    /// port-capability filters. An empty allowed-port set returns nothing.
    pub async fn list(
        &self,
        search: Option<&str>,
        unread_only: bool,
        allowed_ports: &AllowedPorts,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<InboxMessage>, i64), sqlx::Error> {
        if matches!(allowed_ports, Some(ports) if ports.is_empty()) {
            return Ok((Vec::new(), 0));
        }

        let pattern = search.map(|s| format!("%{}%", s));

        let rows = sqlx::query_as::<_, InboxMessage>(
            r#"
            SELECT * FROM inbox
            WHERE ($1::text IS NULL OR phone_number LIKE $1 OR message LIKE $1)
              AND (NOT $2 OR is_read = FALSE)
              AND ($3::text[] IS NULL OR port = ANY($3))
            ORDER BY received_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(&pattern)
        .bind(unread_only)
        .bind(allowed_ports.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM inbox
            WHERE ($1::text IS NULL OR phone_number LIKE $1 OR message LIKE $1)
              AND (NOT $2 OR is_read = FALSE)
              AND ($3::text[] IS NULL OR port = ANY($3))
            "#,
        )
        .bind(&pattern)
        .bind(unread_only)
        .bind(allowed_ports.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total.0))
    }

    /// Number of unread messages
    pub async fn unread_count(&self) -> Result<i64, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM inbox WHERE is_read = FALSE")
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }

    /// Mark one message as read
    pub async fn mark_read(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE inbox SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark every unread message as read
    pub async fn mark_all_read(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE inbox SET is_read = TRUE WHERE is_read = FALSE")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete one message
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM inbox WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
