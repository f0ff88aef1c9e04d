//! Campaign engine and worker

pub mod engine;
pub mod worker;

pub use engine::{AdvanceOutcome, CampaignEngine, CampaignError};
pub use worker::CampaignWorker;

use smsgate_common::types::CampaignId;
use smsgate_storage::repository::{CampaignMessageRepository, CampaignRepository};

/// Recompute a campaign's aggregate counters from its message rows.
/// Aggregates are always derived, never incremented in place.
pub(crate) async fn recompute_counts(
    messages: &CampaignMessageRepository,
    campaigns: &CampaignRepository,
    campaign_id: CampaignId,
) -> Result<(), sqlx::Error> {
    let counts = messages.counts(campaign_id).await?;
    campaigns
        .set_counts(
            campaign_id,
            counts.sent + counts.delivered,
            counts.failed,
            counts.delivered,
        )
        .await
}
