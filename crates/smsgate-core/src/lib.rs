//! smsgate Core - Outbound dispatch engine and campaign state machine
//!
//! This crate turns queued messages into gateway traffic: protocol adapters
//! for the supported hardware families, port allocation, the anti-spam
//! throttle, the single-step campaign engine with its server-side worker,
//! and reconciliation of out-of-band delivery reports.

pub mod allocator;
pub mod campaign;
pub mod delivery;
pub mod dispatch;
pub mod gateway;
pub mod throttle;

pub use allocator::{PortAllocator, PortChoice};
pub use campaign::{AdvanceOutcome, CampaignEngine, CampaignError, CampaignWorker};
pub use delivery::DeliveryReconciler;
pub use dispatch::{BulkSendItem, DispatchEngine, DispatchOutcome};
pub use gateway::{format_port, parse_port, GatewayClient, SendOutcome, TrafficLog};
pub use throttle::{AntiSpamThrottle, DbSpamLog, MemorySpamLog, SpamLog, ThrottleVerdict};
