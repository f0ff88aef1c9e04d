//! smsgate API - REST endpoints and the hardware webhook
//!
//! Exposes the panel operations over HTTP: ad-hoc and bulk sends, campaign
//! control (start/pause/cancel plus a manual advance for external
//! drivers), outbox/inbox browsing and the legacy plain-text webhook the
//! gateways call back into.

pub mod handlers;
pub mod routes;

use smsgate_core::{AntiSpamThrottle, CampaignEngine, DeliveryReconciler, DispatchEngine};
use smsgate_storage::DatabasePool;
use std::sync::Arc;

pub use routes::create_router;

/// Shared API state
pub struct AppState {
    pub db_pool: DatabasePool,
    pub dispatch: Arc<DispatchEngine>,
    pub campaigns: Arc<CampaignEngine>,
    pub reconciler: Arc<DeliveryReconciler>,
    pub throttle: Arc<AntiSpamThrottle>,
}
