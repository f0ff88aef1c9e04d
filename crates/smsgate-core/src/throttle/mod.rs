//! Anti-spam throttle
//!
//! A time-windowed gate over a persistent send log: two successful sends to
//! the same normalized number must be at least the configured interval
//! apart. The interval is runtime-mutable; the log purge horizon (one hour)
//! is fixed. The log is system-wide, shared by every sender.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use smsgate_storage::repository::SpamLogRepository;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Result of a throttle check
#[derive(Debug, Clone, Copy)]
pub struct ThrottleVerdict {
    pub blocked: bool,
    /// Remaining wait in seconds when blocked
    pub wait_seconds: i64,
}

/// Persistent send log behind the throttle
#[async_trait]
pub trait SpamLog: Send + Sync {
    /// Most recent send to this number strictly after the cutoff
    async fn latest_since(
        &self,
        phone: &str,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<Option<DateTime<Utc>>>;

    /// Append a send record, purging entries older than one hour
    async fn record(&self, phone: &str, at: DateTime<Utc>) -> anyhow::Result<()>;
}

/// Database-backed send log
pub struct DbSpamLog {
    repo: SpamLogRepository,
}

impl DbSpamLog {
    /// Create a new database-backed send log
    pub fn new(repo: SpamLogRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl SpamLog for DbSpamLog {
    async fn latest_since(
        &self,
        phone: &str,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        Ok(self.repo.latest_since(phone, cutoff).await?)
    }

    async fn record(&self, phone: &str, at: DateTime<Utc>) -> anyhow::Result<()> {
        Ok(self.repo.record(phone, at).await?)
    }
}

/// In-memory send log for tests and single-shot tooling
#[derive(Default)]
pub struct MemorySpamLog {
    entries: RwLock<Vec<(String, DateTime<Utc>)>>,
}

impl MemorySpamLog {
    /// Create an empty in-memory send log
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of retained entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the log holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SpamLog for MemorySpamLog {
    async fn latest_since(
        &self,
        phone: &str,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|(p, t)| p == phone && *t > cutoff)
            .map(|(_, t)| *t)
            .max())
    }

    async fn record(&self, phone: &str, at: DateTime<Utc>) -> anyhow::Result<()> {
        let mut entries = self.entries.write().await;
        entries.push((phone.to_string(), at));
        let horizon = at - Duration::hours(1);
        entries.retain(|(_, t)| *t >= horizon);
        Ok(())
    }
}

/// Time-windowed gate over the send log
pub struct AntiSpamThrottle {
    store: Arc<dyn SpamLog>,
    interval_secs: AtomicI64,
}

impl AntiSpamThrottle {
    /// Create a throttle with the given interval in seconds
    pub fn new(store: Arc<dyn SpamLog>, interval_secs: i64) -> Self {
        Self {
            store,
            interval_secs: AtomicI64::new(interval_secs),
        }
    }

    /// Current interval in seconds
    pub fn interval_secs(&self) -> i64 {
        self.interval_secs.load(Ordering::Relaxed)
    }

    /// Change the interval at runtime
    pub fn set_interval_secs(&self, secs: i64) {
        self.interval_secs.store(secs, Ordering::Relaxed);
    }

    /// Check whether a send to this number is currently blocked
    pub async fn check(&self, phone: &str) -> anyhow::Result<ThrottleVerdict> {
        let interval = self.interval_secs();
        let now = Utc::now();
        let cutoff = now - Duration::seconds(interval);

        match self.store.latest_since(phone, cutoff).await? {
            Some(last_sent) => {
                let wait_seconds = interval - (now - last_sent).num_seconds();
                debug!("Throttle hit for {}: {}s remaining", phone, wait_seconds);
                Ok(ThrottleVerdict {
                    blocked: true,
                    wait_seconds,
                })
            }
            None => Ok(ThrottleVerdict {
                blocked: false,
                wait_seconds: 0,
            }),
        }
    }

    /// Record a successful send. Only call after the attempt was classified
    /// as sent or delivered, never after a failure.
    pub async fn record(&self, phone: &str) -> anyhow::Result<()> {
        self.store.record(phone, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle_over(store: Arc<MemorySpamLog>) -> AntiSpamThrottle {
        AntiSpamThrottle::new(store, 60)
    }

    #[tokio::test]
    async fn test_blocked_right_after_record() {
        let store = Arc::new(MemorySpamLog::new());
        let throttle = throttle_over(store);

        throttle.record("+79167193249").await.unwrap();

        let verdict = throttle.check("+79167193249").await.unwrap();
        assert!(verdict.blocked);
        assert!(verdict.wait_seconds > 0 && verdict.wait_seconds <= 60);
    }

    #[tokio::test]
    async fn test_unblocked_after_interval_elapsed() {
        let store = Arc::new(MemorySpamLog::new());
        store
            .record("+79167193249", Utc::now() - Duration::seconds(61))
            .await
            .unwrap();

        let throttle = throttle_over(store);
        let verdict = throttle.check("+79167193249").await.unwrap();
        assert!(!verdict.blocked);
        assert_eq!(verdict.wait_seconds, 0);
    }

    #[tokio::test]
    async fn test_other_numbers_unaffected() {
        let store = Arc::new(MemorySpamLog::new());
        let throttle = throttle_over(store);

        throttle.record("+79167193249").await.unwrap();

        let verdict = throttle.check("+79007654321").await.unwrap();
        assert!(!verdict.blocked);
    }

    #[tokio::test]
    async fn test_interval_is_mutable_at_runtime() {
        let store = Arc::new(MemorySpamLog::new());
        store
            .record("+79167193249", Utc::now() - Duration::seconds(30))
            .await
            .unwrap();

        let throttle = throttle_over(store);
        assert!(throttle.check("+79167193249").await.unwrap().blocked);

        throttle.set_interval_secs(10);
        assert!(!throttle.check("+79167193249").await.unwrap().blocked);
    }

    #[tokio::test]
    async fn test_record_purges_entries_older_than_one_hour() {
        let store = Arc::new(MemorySpamLog::new());
        store
            .record("+79001112233", Utc::now() - Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);

        store.record("+79167193249", Utc::now()).await.unwrap();
        assert_eq!(store.len().await, 1);
    }
}
