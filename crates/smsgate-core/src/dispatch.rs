//! Dispatch engine for ad-hoc sends
//!
//! Orchestrates one send end to end: normalize the recipient, consult the
//! anti-spam throttle, resolve a gateway, call the protocol adapter and
//! persist the outbox record plus usage counters. Bulk sends are a thin
//! paced loop over the same path and are not transactional.

use smsgate_common::types::GatewayId;
use smsgate_common::{phone, Error};
use smsgate_storage::models::{Gateway, GatewayKind, MessageStatus, PortMode};
use smsgate_storage::repository::{
    GatewayRepository, OutboxRepository, PortRepository,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::allocator::PortAllocator;
use crate::gateway::{format_port, parse_port, GatewayClient};
use crate::throttle::AntiSpamThrottle;

/// Outcome of one ad-hoc send
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub outbox_id: Uuid,
    pub status: MessageStatus,
    pub status_message: String,
    pub gateway_id: GatewayId,
    /// Port as stored on the record, in the family's display notation
    pub port: Option<String>,
}

impl DispatchOutcome {
    /// Whether the send counts as successful
    pub fn success(&self) -> bool {
        self.status != MessageStatus::Failed
    }
}

/// One entry of a bulk send result
pub struct BulkSendItem {
    pub phone: String,
    pub outcome: Result<DispatchOutcome, Error>,
}

/// Ad-hoc dispatch engine
pub struct DispatchEngine {
    gateways: GatewayRepository,
    ports: PortRepository,
    outbox: OutboxRepository,
    throttle: Arc<AntiSpamThrottle>,
    client: GatewayClient,
    bulk_delay: Duration,
}

impl DispatchEngine {
    /// Create a new dispatch engine
    pub fn new(
        pool: PgPool,
        throttle: Arc<AntiSpamThrottle>,
        client: GatewayClient,
        bulk_delay_ms: u64,
    ) -> Self {
        Self {
            gateways: GatewayRepository::new(pool.clone()),
            ports: PortRepository::new(pool.clone()),
            outbox: OutboxRepository::new(pool),
            throttle,
            client,
            bulk_delay: Duration::from_millis(bulk_delay_ms),
        }
    }

    /// Send one message. The throttle rejection and the missing-gateway
    /// case surface as typed errors; a gateway-level failure is a normal
    /// outcome with status failed.
    pub async fn send_one(
        &self,
        raw_phone: &str,
        message: &str,
        port: Option<i32>,
        gateway_id: Option<GatewayId>,
    ) -> Result<DispatchOutcome, Error> {
        let phone = phone::normalize(raw_phone);

        let verdict = self
            .throttle
            .check(&phone)
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;
        if verdict.blocked {
            return Err(Error::ThrottleBlocked {
                wait_seconds: verdict.wait_seconds,
            });
        }

        let gateway = self.resolve_gateway(gateway_id).await?;

        let port_for_db = port.map(|p| match gateway.kind_enum() {
            GatewayKind::Openvox => format_port(p),
            GatewayKind::Goip => p.to_string(),
        });

        let outbox_id = self
            .outbox
            .create_pending(&phone, message, port_for_db.as_deref(), Some(gateway.id))
            .await
            .map_err(db_err)?;

        let outcome = self.client.send(&gateway, &phone, message, port).await;

        let used_port = outcome.reported_port.clone().or(port_for_db);
        self.outbox
            .finalize(
                outbox_id,
                outcome.status,
                &outcome.raw_response,
                used_port.as_deref(),
            )
            .await
            .map_err(db_err)?;

        if outcome.success() {
            if let Err(e) = self.throttle.record(&phone).await {
                warn!("Failed to record send in spam log: {}", e);
            }
            if let Err(e) = self.gateways.record_send(gateway.id).await {
                warn!("Failed to update gateway usage: {}", e);
            }
            if let Some(p) = port {
                if let Err(e) = self.ports.record_send(gateway.id, p).await {
                    warn!("Failed to update port usage: {}", e);
                }
            }
        }

        debug!(
            "Dispatched to {}: status={}, outbox={}",
            phone, outcome.status, outbox_id
        );

        Ok(DispatchOutcome {
            outbox_id,
            status: outcome.status,
            status_message: outcome.raw_response,
            gateway_id: gateway.id,
            port: used_port,
        })
    }

    /// Send the same message to many recipients, pausing a fixed interval
    /// between calls to avoid hammering the hardware. Partial failure
    /// leaves earlier successes intact.
    pub async fn send_bulk(
        &self,
        phones: &[String],
        message: &str,
        mode: PortMode,
        pinned_port: Option<i32>,
        gateway_id: Option<GatewayId>,
    ) -> Result<Vec<BulkSendItem>, Error> {
        let mut results = Vec::with_capacity(phones.len());

        for (i, raw_phone) in phones.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.bulk_delay).await;
            }

            let active = self
                .ports
                .list_active(gateway_id)
                .await
                .map_err(db_err)?;
            let last_used = self
                .outbox
                .last_used_port()
                .await
                .map_err(db_err)?
                .map(|token| parse_port(&token))
                .filter(|p| *p > 0);
            let choice = PortAllocator::next(mode, pinned_port, &active, last_used);

            let outcome = self
                .send_one(raw_phone, message, Some(choice.port), gateway_id)
                .await;

            results.push(BulkSendItem {
                phone: raw_phone.clone(),
                outcome,
            });
        }

        Ok(results)
    }

    /// Resolve the gateway for a send: an explicitly requested active
    /// gateway wins, then the configured default, then the highest
    /// priority active gateway.
    async fn resolve_gateway(&self, explicit: Option<GatewayId>) -> Result<Gateway, Error> {
        if let Some(id) = explicit {
            if let Some(gateway) = self.gateways.get(id).await.map_err(db_err)? {
                if gateway.is_active {
                    return Ok(gateway);
                }
            }
        }

        self.gateways
            .get_default()
            .await
            .map_err(db_err)?
            .ok_or(Error::NoActiveGateway)
    }
}

pub(crate) fn db_err(e: sqlx::Error) -> Error {
    Error::Database(e.to_string())
}
