//! Runtime settings repository

use sqlx::PgPool;

/// Settings key for the anti-spam interval
pub const SPAM_INTERVAL_KEY: &str = "spam_interval";

/// Settings repository
#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Create a new settings repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a setting value
    pub async fn get(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT setting_value FROM settings WHERE setting_key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|(v,)| v))
    }

    /// Upsert a setting value
    pub async fn set(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO settings (setting_key, setting_value)
            VALUES ($1, $2)
            ON CONFLICT (setting_key) DO UPDATE SET setting_value = EXCLUDED.setting_value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Anti-spam interval in seconds, falling back to the given default
    /// when the row is missing or unparsable
    pub async fn spam_interval(&self, default_secs: i64) -> Result<i64, sqlx::Error> {
        Ok(self
            .get(SPAM_INTERVAL_KEY)
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(default_secs))
    }
}
