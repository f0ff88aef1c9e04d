//! Campaign worker - server-side driver for campaign progression
//!
//! Polls for running campaigns and drives each through repeated `advance`
//! calls, sleeping the campaign's configured delay between steps. Clients
//! only start, pause, cancel and poll status; progression lives here.

use smsgate_common::types::CampaignId;
use smsgate_storage::repository::CampaignRepository;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::interval;
use tracing::{error, info};

use super::engine::CampaignEngine;

/// Campaign worker
pub struct CampaignWorker {
    engine: Arc<CampaignEngine>,
    campaigns: CampaignRepository,
    poll_interval_secs: u64,
    /// Campaigns currently driven by a spawned task
    active: Arc<Mutex<HashSet<CampaignId>>>,
}

impl CampaignWorker {
    /// Create a new campaign worker
    pub fn new(
        engine: Arc<CampaignEngine>,
        campaigns: CampaignRepository,
        poll_interval_secs: u64,
    ) -> Self {
        Self {
            engine,
            campaigns,
            poll_interval_secs,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Run the worker loop
    pub async fn run(&self) {
        let mut ticker = interval(Duration::from_secs(self.poll_interval_secs));

        info!(
            "Campaign worker started (interval: {}s)",
            self.poll_interval_secs
        );

        loop {
            ticker.tick().await;

            let running = match self.campaigns.list_running().await {
                Ok(campaigns) => campaigns,
                Err(e) => {
                    error!("Error listing running campaigns: {}", e);
                    continue;
                }
            };

            for campaign in running {
                let mut active = self.active.lock().await;
                if !active.insert(campaign.id) {
                    continue;
                }
                drop(active);

                let engine = self.engine.clone();
                let registry = self.active.clone();
                let id = campaign.id;

                tokio::spawn(async move {
                    Self::drive(engine, id).await;
                    registry.lock().await.remove(&id);
                });
            }
        }
    }

    /// Step one campaign until it reports nothing left to do. Pauses and
    /// cancellations surface through `advance` at the next step.
    async fn drive(engine: Arc<CampaignEngine>, id: CampaignId) {
        loop {
            match engine.advance(id).await {
                Ok(step) => {
                    if step.completed {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(step.delay_ms.max(0) as u64)).await;
                }
                Err(e) => {
                    error!("Campaign {} advance failed: {}", id, e);
                    break;
                }
            }
        }
    }
}
