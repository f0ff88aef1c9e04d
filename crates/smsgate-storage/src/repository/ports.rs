//! Gateway port repository

use chrono::Utc;
use smsgate_common::types::GatewayId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::GatewayPort;

/// Gateway port repository
#[derive(Clone)]
pub struct PortRepository {
    pool: PgPool,
}

impl PortRepository {
    /// Create a new port repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Generate the dense 1..=channels port rows for a new gateway.
    /// Existing rows are left alone so re-running is safe.
    pub async fn create_for_gateway(
        &self,
        gateway_id: GatewayId,
        channels: i32,
    ) -> Result<u64, sqlx::Error> {
        let mut count = 0u64;
        let mut tx = self.pool.begin().await?;

        for number in 1..=channels {
            let result = sqlx::query(
                r#"
                INSERT INTO gateway_ports (id, gateway_id, port_number, port_name)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (gateway_id, port_number) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(gateway_id)
            .bind(number)
            .bind(format!("Port {}", number))
            .execute(&mut *tx)
            .await?;

            count += result.rows_affected();
        }

        tx.commit().await?;
        Ok(count)
    }

    /// List active ports, optionally scoped to one gateway, in port order
    pub async fn list_active(
        &self,
        gateway_id: Option<GatewayId>,
    ) -> Result<Vec<GatewayPort>, sqlx::Error> {
        if let Some(gateway_id) = gateway_id {
            sqlx::query_as::<_, GatewayPort>(
                r#"
                SELECT * FROM gateway_ports
                WHERE is_active = TRUE AND gateway_id = $1
                ORDER BY port_number
                "#,
            )
            .bind(gateway_id)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, GatewayPort>(
                "SELECT * FROM gateway_ports WHERE is_active = TRUE ORDER BY port_number",
            )
            .fetch_all(&self.pool)
            .await
        }
    }

    /// List all ports in port order
    pub async fn list_all(&self) -> Result<Vec<GatewayPort>, sqlx::Error> {
        sqlx::query_as::<_, GatewayPort>(
            "SELECT * FROM gateway_ports ORDER BY gateway_id, port_number",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Update port metadata
    pub async fn update(
        &self,
        gateway_id: GatewayId,
        port_number: i32,
        port_name: Option<String>,
        sim_number: Option<String>,
        is_active: Option<bool>,
    ) -> Result<Option<GatewayPort>, sqlx::Error> {
        sqlx::query_as::<_, GatewayPort>(
            r#"
            UPDATE gateway_ports SET
                port_name = COALESCE($3, port_name),
                sim_number = COALESCE($4, sim_number),
                is_active = COALESCE($5, is_active)
            WHERE gateway_id = $1 AND port_number = $2
            RETURNING *
            "#,
        )
        .bind(gateway_id)
        .bind(port_number)
        .bind(port_name)
        .bind(sim_number)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
    }

    /// Additive usage update after a successful send on a port
    pub async fn record_send(
        &self,
        gateway_id: GatewayId,
        port_number: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE gateway_ports SET
                messages_sent = messages_sent + 1,
                last_used_at = $3
            WHERE gateway_id = $1 AND port_number = $2
            "#,
        )
        .bind(gateway_id)
        .bind(port_number)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
