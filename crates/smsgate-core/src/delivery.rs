//! Delivery report reconciliation
//!
//! The hardware confirms handset delivery out of band, correlated by the
//! gateway-assigned message id captured at send time. Reports for ids this
//! system never issued are silently ignored.

use chrono::{DateTime, Utc};
use smsgate_storage::models::MessageStatus;
use smsgate_storage::repository::{CampaignMessageRepository, CampaignRepository};
use sqlx::PgPool;
use tracing::{debug, info};

/// Map a vendor status token onto the two-value delivery domain. Only the
/// exact recognized delivered tokens count; everything else is a failure.
pub fn map_status_token(token: &str) -> MessageStatus {
    if token == "delivered" || token == "DELIVRD" {
        MessageStatus::Delivered
    } else {
        MessageStatus::Failed
    }
}

/// Delivery report reconciler
pub struct DeliveryReconciler {
    messages: CampaignMessageRepository,
    campaigns: CampaignRepository,
}

impl DeliveryReconciler {
    /// Create a new reconciler
    pub fn new(pool: PgPool) -> Self {
        Self {
            messages: CampaignMessageRepository::new(pool.clone()),
            campaigns: CampaignRepository::new(pool),
        }
    }

    /// Apply one delivery report. A message id with no match is a no-op:
    /// the report may reference a message not created here or one already
    /// purged.
    pub async fn apply(
        &self,
        gateway_message_id: &str,
        status_token: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<(), sqlx::Error> {
        let status = map_status_token(status_token);
        let at = timestamp.unwrap_or_else(Utc::now);

        match self
            .messages
            .update_delivery(gateway_message_id, status, at)
            .await?
        {
            Some(campaign_id) => {
                crate::campaign::recompute_counts(&self.messages, &self.campaigns, campaign_id)
                    .await?;
                info!(
                    "Delivery report applied: id={}, status={}",
                    gateway_message_id, status
                );
            }
            None => {
                debug!(
                    "Delivery report for unknown message id {} ignored",
                    gateway_message_id
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_delivered_tokens() {
        assert_eq!(map_status_token("delivered"), MessageStatus::Delivered);
        assert_eq!(map_status_token("DELIVRD"), MessageStatus::Delivered);
    }

    #[test]
    fn test_everything_else_is_failure() {
        for token in ["DELIVERED", "failed", "expired", "Delivered", ""] {
            assert_eq!(map_status_token(token), MessageStatus::Failed, "{}", token);
        }
    }
}
