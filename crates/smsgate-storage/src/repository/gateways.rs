//! Gateway repository

use chrono::Utc;
use smsgate_common::types::GatewayId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Gateway, GatewayKind};

/// Input for registering a gateway
#[derive(Debug, Clone)]
pub struct CreateGateway {
    pub name: String,
    pub kind: GatewayKind,
    pub host: String,
    pub port: i32,
    pub username: Option<String>,
    pub password: Option<String>,
    pub channels: i32,
    pub is_default: bool,
    pub priority: i32,
}

/// Gateway repository
#[derive(Clone)]
pub struct GatewayRepository {
    pool: PgPool,
}

impl GatewayRepository {
    /// Create a new gateway repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a gateway. When the default flag is requested every other
    /// gateway loses it, keeping at most one default at any time.
    pub async fn create(&self, input: CreateGateway) -> Result<Gateway, sqlx::Error> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            sqlx::query("UPDATE gateways SET is_default = FALSE")
                .execute(&mut *tx)
                .await?;
        }

        let gateway = sqlx::query_as::<_, Gateway>(
            r#"
            INSERT INTO gateways (
                id, name, kind, host, port, username, password,
                channels, is_default, priority
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.kind.to_string())
        .bind(&input.host)
        .bind(input.port)
        .bind(&input.username)
        .bind(&input.password)
        .bind(input.channels)
        .bind(input.is_default)
        .bind(input.priority)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(gateway)
    }

    /// Get a gateway by ID
    pub async fn get(&self, id: GatewayId) -> Result<Option<Gateway>, sqlx::Error> {
        sqlx::query_as::<_, Gateway>("SELECT * FROM gateways WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// List gateways, default first, then by priority and name
    pub async fn list(&self, active_only: bool) -> Result<Vec<Gateway>, sqlx::Error> {
        if active_only {
            sqlx::query_as::<_, Gateway>(
                r#"
                SELECT * FROM gateways
                WHERE is_active = TRUE
                ORDER BY is_default DESC, priority DESC, name ASC
                "#,
            )
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Gateway>(
                "SELECT * FROM gateways ORDER BY is_default DESC, priority DESC, name ASC",
            )
            .fetch_all(&self.pool)
            .await
        }
    }

    /// Get the default gateway: the flagged one if active, otherwise the
    /// highest-priority active gateway.
    pub async fn get_default(&self) -> Result<Option<Gateway>, sqlx::Error> {
        let flagged = sqlx::query_as::<_, Gateway>(
            "SELECT * FROM gateways WHERE is_default = TRUE AND is_active = TRUE",
        )
        .fetch_optional(&self.pool)
        .await?;

        if flagged.is_some() {
            return Ok(flagged);
        }

        sqlx::query_as::<_, Gateway>(
            "SELECT * FROM gateways WHERE is_active = TRUE ORDER BY priority DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
    }

    /// Make one gateway the default, clearing the flag everywhere else
    pub async fn set_default(&self, id: GatewayId) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE gateways SET is_default = FALSE")
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("UPDATE gateways SET is_default = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Additive usage update after a successful send
    pub async fn record_send(&self, id: GatewayId) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE gateways SET
                messages_sent = messages_sent + 1,
                last_used_at = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
