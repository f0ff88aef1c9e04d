//! Anti-spam log repository

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Anti-spam log repository
#[derive(Clone)]
pub struct SpamLogRepository {
    pool: PgPool,
}

impl SpamLogRepository {
    /// Create a new spam log repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Most recent send to this number at or after the cutoff
    pub async fn latest_since(
        &self,
        phone_number: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
            r#"
            SELECT last_sent FROM spam_log
            WHERE phone_number = $1 AND last_sent > $2
            ORDER BY last_sent DESC
            LIMIT 1
            "#,
        )
        .bind(phone_number)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(t,)| t))
    }

    /// Append a send record. Entries older than one hour are purged in the
    /// same call; the purge horizon is fixed and independent of the
    /// configured throttle interval.
    pub async fn record(
        &self,
        phone_number: &str,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO spam_log (id, phone_number, last_sent) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(phone_number)
            .bind(at)
            .execute(&self.pool)
            .await?;

        sqlx::query("DELETE FROM spam_log WHERE last_sent < $1")
            .bind(at - Duration::hours(1))
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
