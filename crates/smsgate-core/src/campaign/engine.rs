//! Campaign engine - single-step state machine for bulk sends
//!
//! Campaigns advance one message per call. Nothing here loops or sleeps;
//! an external driver (the worker, or any client) re-invokes `advance` and
//! paces itself with the returned delay. Concurrent `advance` calls for
//! the same campaign are serialized through a per-campaign lock so exactly
//! one message is ever in the sending state.
//!
//! Campaign sends go straight to the protocol adapter, bypassing the
//! anti-spam throttle: the operator explicitly opted into bulk sending.

use smsgate_common::phone;
use smsgate_common::types::{CampaignId, GatewayId, Recipient};
use smsgate_storage::models::{
    Campaign, CampaignMessage, CampaignStatus, CreateCampaign, Gateway, MessageStatus,
};
use smsgate_storage::repository::campaign_messages::CreateCampaignMessage;
use smsgate_storage::repository::{
    CampaignMessageRepository, CampaignRepository, GatewayRepository, PortRepository,
};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::allocator::PortAllocator;
use crate::gateway::GatewayClient;

/// Campaign engine errors
#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Campaign not found")]
    NotFound,

    #[error("Message is required")]
    EmptyMessage,

    #[error("At least one phone number is required")]
    NoRecipients,

    #[error("Campaign already completed")]
    AlreadyCompleted,

    #[error("Campaign is cancelled")]
    Cancelled,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result of one `advance` step
#[derive(Debug, Clone)]
pub struct AdvanceOutcome {
    /// True when there is nothing left to do: the campaign is not running
    /// or just transitioned to completed
    pub completed: bool,
    pub message_id: Option<Uuid>,
    pub phone: Option<String>,
    pub status: Option<MessageStatus>,
    pub port: Option<i32>,
    /// The campaign's configured inter-message delay for the driver
    pub delay_ms: i32,
}

impl AdvanceOutcome {
    fn done(delay_ms: i32) -> Self {
        Self {
            completed: true,
            message_id: None,
            phone: None,
            status: None,
            port: None,
            delay_ms,
        }
    }
}

/// Campaign engine
pub struct CampaignEngine {
    campaigns: CampaignRepository,
    messages: CampaignMessageRepository,
    gateways: GatewayRepository,
    ports: PortRepository,
    client: GatewayClient,
    /// Per-campaign advance serialization
    locks: Mutex<HashMap<CampaignId, Arc<Mutex<()>>>>,
}

impl CampaignEngine {
    /// Create a new campaign engine
    pub fn new(pool: PgPool, client: GatewayClient) -> Self {
        Self {
            campaigns: CampaignRepository::new(pool.clone()),
            messages: CampaignMessageRepository::new(pool.clone()),
            gateways: GatewayRepository::new(pool.clone()),
            ports: PortRepository::new(pool),
            client,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get the campaign repository
    pub fn campaigns(&self) -> &CampaignRepository {
        &self.campaigns
    }

    /// Get the campaign message repository
    pub fn messages(&self) -> &CampaignMessageRepository {
        &self.messages
    }

    /// Create a draft campaign with one message row per unique recipient.
    /// Recipients are de-duplicated by normalized phone and the `{name}`
    /// placeholder is resolved at creation time.
    pub async fn create(
        &self,
        input: CreateCampaign,
        recipients: Vec<Recipient>,
    ) -> Result<Campaign, CampaignError> {
        if input.message.trim().is_empty() {
            return Err(CampaignError::EmptyMessage);
        }

        let unique = dedupe_recipients(recipients);
        if unique.is_empty() {
            return Err(CampaignError::NoRecipients);
        }

        let campaign = self.campaigns.create(&input, unique.len() as i32).await?;

        let rows: Vec<CreateCampaignMessage> = unique
            .into_iter()
            .map(|r| CreateCampaignMessage {
                campaign_id: campaign.id,
                message: personalize(&input.message, r.name.as_deref()),
                phone_number: r.phone,
                contact_name: r.name,
            })
            .collect();

        self.messages.create_batch(rows).await?;

        info!(
            "Campaign {} created with {} recipients",
            campaign.id, campaign.total_count
        );

        Ok(campaign)
    }

    /// Start or resume a campaign. The started timestamp is only set on
    /// the first transition; terminal campaigns report an error.
    pub async fn start(&self, id: CampaignId) -> Result<Campaign, CampaignError> {
        let campaign = self.campaigns.get(id).await?.ok_or(CampaignError::NotFound)?;

        match campaign.status_enum() {
            Some(CampaignStatus::Completed) => return Err(CampaignError::AlreadyCompleted),
            Some(CampaignStatus::Cancelled) => return Err(CampaignError::Cancelled),
            _ => {}
        }

        let updated = self
            .campaigns
            .update_status(id, CampaignStatus::Running)
            .await?
            .ok_or(CampaignError::NotFound)?;

        info!("Campaign {} running", id);
        Ok(updated)
    }

    /// Pause a running campaign. Observed by the driver at the start of
    /// its next step; an in-flight gateway call is never interrupted.
    pub async fn pause(&self, id: CampaignId) -> Result<Campaign, CampaignError> {
        let campaign = self.campaigns.get(id).await?.ok_or(CampaignError::NotFound)?;

        if campaign.status_enum() != Some(CampaignStatus::Running) {
            return Ok(campaign);
        }

        let updated = self
            .campaigns
            .update_status(id, CampaignStatus::Paused)
            .await?
            .ok_or(CampaignError::NotFound)?;

        info!("Campaign {} paused", id);
        Ok(updated)
    }

    /// Cancel a campaign from any non-terminal state. Terminal campaigns
    /// are left untouched.
    pub async fn cancel(&self, id: CampaignId) -> Result<Campaign, CampaignError> {
        let campaign = self.campaigns.get(id).await?.ok_or(CampaignError::NotFound)?;

        if campaign
            .status_enum()
            .map(|s| s.is_terminal())
            .unwrap_or(false)
        {
            return Ok(campaign);
        }

        let updated = self
            .campaigns
            .update_status(id, CampaignStatus::Cancelled)
            .await?
            .ok_or(CampaignError::NotFound)?;

        info!("Campaign {} cancelled", id);
        Ok(updated)
    }

    /// Delete a campaign and its message rows
    pub async fn delete(&self, id: CampaignId) -> Result<bool, CampaignError> {
        Ok(self.campaigns.delete(id).await?)
    }

    /// Advance the campaign by exactly one message.
    ///
    /// Picks the oldest pending message, allocates a port with the
    /// campaign's policy, calls the protocol adapter directly and records
    /// the per-message outcome. Aggregates are recomputed from rows after
    /// every step. When no pending message is left the campaign
    /// transitions to completed.
    pub async fn advance(&self, id: CampaignId) -> Result<AdvanceOutcome, CampaignError> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let campaign = self.campaigns.get(id).await?.ok_or(CampaignError::NotFound)?;

        if campaign.status_enum() != Some(CampaignStatus::Running) {
            return Ok(AdvanceOutcome::done(campaign.send_delay_ms));
        }

        let Some(message) = self.messages.next_pending(id).await? else {
            self.campaigns
                .update_status(id, CampaignStatus::Completed)
                .await?;
            super::recompute_counts(&self.messages, &self.campaigns, id).await?;
            info!("Campaign {} completed", id);
            return Ok(AdvanceOutcome::done(campaign.send_delay_ms));
        };

        self.messages.mark_sending(message.id).await?;

        let active = self.ports.list_active(campaign.gateway_id).await?;
        let last_used = self.messages.last_used_port(id).await?;
        let choice = PortAllocator::next(
            campaign.port_mode_enum(),
            campaign.specific_port,
            &active,
            last_used,
        );

        let status = match self.resolve_gateway(campaign.gateway_id).await? {
            Some(gateway) => self.send_step(&campaign, &message, &gateway, &choice).await?,
            None => {
                self.messages
                    .mark_failed(
                        message.id,
                        choice.port,
                        &choice.port_name,
                        "No active gateway found",
                    )
                    .await?;
                MessageStatus::Failed
            }
        };

        let counts = self.messages.counts(id).await?;
        self.campaigns
            .set_counts(
                id,
                counts.sent + counts.delivered,
                counts.failed,
                counts.delivered,
            )
            .await?;

        // The step that exhausts the queue completes the campaign in the
        // same call
        if counts.pending == 0 && counts.sending == 0 {
            self.campaigns
                .update_status(id, CampaignStatus::Completed)
                .await?;
            info!("Campaign {} completed", id);
        }

        Ok(AdvanceOutcome {
            completed: false,
            message_id: Some(message.id),
            phone: Some(message.phone_number),
            status: Some(status),
            port: Some(choice.port),
            delay_ms: campaign.send_delay_ms,
        })
    }

    /// Dispatch one message and record its outcome
    async fn send_step(
        &self,
        campaign: &Campaign,
        message: &CampaignMessage,
        gateway: &Gateway,
        choice: &crate::allocator::PortChoice,
    ) -> Result<MessageStatus, CampaignError> {
        let outcome = self
            .client
            .send(gateway, &message.phone_number, &message.message, Some(choice.port))
            .await;

        if outcome.success() {
            self.messages
                .mark_sent(
                    message.id,
                    choice.port,
                    &choice.port_name,
                    &outcome.raw_response,
                    outcome.gateway_message_id.as_deref(),
                )
                .await?;

            let port_gateway = choice.gateway_id.unwrap_or(gateway.id);
            if let Err(e) = self.ports.record_send(port_gateway, choice.port).await {
                warn!("Failed to update port usage: {}", e);
            }
            if let Err(e) = self.gateways.record_send(gateway.id).await {
                warn!("Failed to update gateway usage: {}", e);
            }

            debug!(
                "Campaign {} sent to {} on port {}",
                campaign.id, message.phone_number, choice.port
            );
            Ok(MessageStatus::Sent)
        } else {
            self.messages
                .mark_failed(
                    message.id,
                    choice.port,
                    &choice.port_name,
                    &outcome.raw_response,
                )
                .await?;

            debug!(
                "Campaign {} failed to {}: {}",
                campaign.id, message.phone_number, outcome.raw_response
            );
            Ok(MessageStatus::Failed)
        }
    }

    /// Resolve the gateway for a campaign step: the campaign's target if
    /// still active, otherwise the default chain.
    async fn resolve_gateway(
        &self,
        explicit: Option<GatewayId>,
    ) -> Result<Option<Gateway>, CampaignError> {
        if let Some(id) = explicit {
            if let Some(gateway) = self.gateways.get(id).await? {
                if gateway.is_active {
                    return Ok(Some(gateway));
                }
            }
        }

        Ok(self.gateways.get_default().await?)
    }

    async fn lock_for(&self, id: CampaignId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Normalize and de-duplicate recipients, keeping the first occurrence of
/// each phone. Entries whose phone normalizes to nothing are dropped.
pub fn dedupe_recipients(recipients: Vec<Recipient>) -> Vec<Recipient> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for recipient in recipients {
        let normalized = phone::normalize(&recipient.phone);
        if normalized.is_empty() || !seen.insert(normalized.clone()) {
            continue;
        }
        unique.push(Recipient::new(normalized, recipient.name));
    }

    unique
}

/// Resolve the `{name}` placeholder against a recipient's display name.
/// Without a name the placeholder stays, matching the panel's behavior.
pub fn personalize(template: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => template.replace("{name}", name),
        None => template.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dedupe_by_normalized_phone() {
        let recipients = vec![
            Recipient::new("+79001234567", None),
            Recipient::new("+79001234567", Some("Dup".to_string())),
            Recipient::new("+79007654321", None),
        ];

        let unique = dedupe_recipients(recipients);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].phone, "+79001234567");
        assert_eq!(unique[1].phone, "+79007654321");
    }

    #[test]
    fn test_dedupe_catches_format_variants() {
        // The same number in trunk, bare and canonical form is one recipient
        let recipients = vec![
            Recipient::new("89167193249", None),
            Recipient::new("9167193249", None),
            Recipient::new("+79167193249", None),
        ];

        let unique = dedupe_recipients(recipients);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].phone, "+79167193249");
    }

    #[test]
    fn test_dedupe_drops_empty_phones() {
        let recipients = vec![
            Recipient::new("---", None),
            Recipient::new("9167193249", None),
        ];

        assert_eq!(dedupe_recipients(recipients).len(), 1);
    }

    #[test]
    fn test_personalize_with_name() {
        assert_eq!(
            personalize("Hello {name}, your order is ready", Some("Ivan")),
            "Hello Ivan, your order is ready"
        );
    }

    #[test]
    fn test_personalize_without_name_keeps_placeholder() {
        assert_eq!(personalize("Hello {name}", None), "Hello {name}");
    }
}
