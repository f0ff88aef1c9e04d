//! Row models for smsgate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smsgate_common::types::{CampaignId, GatewayId};
use sqlx::FromRow;
use uuid::Uuid;

/// Gateway protocol family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayKind {
    Openvox,
    Goip,
}

impl std::fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayKind::Openvox => write!(f, "openvox"),
            GatewayKind::Goip => write!(f, "goip"),
        }
    }
}

impl std::str::FromStr for GatewayKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openvox" => Ok(GatewayKind::Openvox),
            "goip" => Ok(GatewayKind::Goip),
            _ => Err(format!("Invalid gateway kind: {}", s)),
        }
    }
}

/// Port selection policy for bulk sends and campaigns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortMode {
    Random,
    Linear,
    Specific,
    LeastUsed,
}

impl std::fmt::Display for PortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortMode::Random => write!(f, "random"),
            PortMode::Linear => write!(f, "linear"),
            PortMode::Specific => write!(f, "specific"),
            PortMode::LeastUsed => write!(f, "least_used"),
        }
    }
}

impl std::str::FromStr for PortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(PortMode::Random),
            "linear" => Ok(PortMode::Linear),
            "specific" => Ok(PortMode::Specific),
            "least_used" => Ok(PortMode::LeastUsed),
            _ => Err(format!("Invalid port mode: {}", s)),
        }
    }
}

/// Campaign lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    /// Whether the campaign can never leave this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Cancelled)
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "draft"),
            CampaignStatus::Running => write!(f, "running"),
            CampaignStatus::Paused => write!(f, "paused"),
            CampaignStatus::Completed => write!(f, "completed"),
            CampaignStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CampaignStatus::Draft),
            "running" => Ok(CampaignStatus::Running),
            "paused" => Ok(CampaignStatus::Paused),
            "completed" => Ok(CampaignStatus::Completed),
            "cancelled" => Ok(CampaignStatus::Cancelled),
            _ => Err(format!("Invalid campaign status: {}", s)),
        }
    }
}

/// Per-message dispatch status, shared by campaign messages and the outbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Sending,
    Sent,
    Failed,
    Delivered,
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageStatus::Pending => write!(f, "pending"),
            MessageStatus::Sending => write!(f, "sending"),
            MessageStatus::Sent => write!(f, "sent"),
            MessageStatus::Failed => write!(f, "failed"),
            MessageStatus::Delivered => write!(f, "delivered"),
        }
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MessageStatus::Pending),
            "sending" => Ok(MessageStatus::Sending),
            "sent" => Ok(MessageStatus::Sent),
            "failed" => Ok(MessageStatus::Failed),
            "delivered" => Ok(MessageStatus::Delivered),
            _ => Err(format!("Invalid message status: {}", s)),
        }
    }
}

/// Configured hardware gateway
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Gateway {
    pub id: GatewayId,
    pub name: String,
    pub kind: String,
    pub host: String,
    pub port: i32,
    pub username: Option<String>,
    /// Skipped on serialization so credentials never reach API responses
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    pub channels: i32,
    pub is_active: bool,
    pub is_default: bool,
    pub priority: i32,
    pub messages_sent: i64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Gateway {
    /// Protocol family, defaulting to OpenVox for unrecognized values
    pub fn kind_enum(&self) -> GatewayKind {
        self.kind.parse().unwrap_or(GatewayKind::Openvox)
    }
}

/// One addressable channel on a gateway
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GatewayPort {
    pub id: Uuid,
    pub gateway_id: GatewayId,
    pub port_number: i32,
    pub port_name: String,
    pub sim_number: Option<String>,
    pub is_active: bool,
    pub messages_sent: i64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Bulk-send campaign
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub message: String,
    pub total_count: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub delivered_count: i32,
    pub gateway_id: Option<GatewayId>,
    pub port_mode: String,
    pub specific_port: Option<i32>,
    pub send_delay_ms: i32,
    pub status: String,
    pub created_by: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Status enum
    pub fn status_enum(&self) -> Option<CampaignStatus> {
        self.status.parse().ok()
    }

    /// Port mode enum, defaulting to random for unrecognized values
    pub fn port_mode_enum(&self) -> PortMode {
        self.port_mode.parse().unwrap_or(PortMode::Random)
    }
}

/// Input for creating a campaign
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaign {
    pub name: String,
    pub message: String,
    pub gateway_id: Option<GatewayId>,
    pub port_mode: PortMode,
    pub specific_port: Option<i32>,
    pub send_delay_ms: i32,
    pub created_by: Option<String>,
}

/// One recipient's copy of a campaign message
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CampaignMessage {
    pub id: Uuid,
    pub seq: i64,
    pub campaign_id: CampaignId,
    pub phone_number: String,
    pub contact_name: Option<String>,
    pub message: String,
    pub port: Option<i32>,
    pub port_name: Option<String>,
    pub status: String,
    pub gateway_response: Option<String>,
    pub gateway_message_id: Option<String>,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate counts for one campaign, always derived from message rows
#[derive(Debug, Clone, Copy, Default, FromRow, Serialize)]
pub struct CampaignMessageCounts {
    pub total: i64,
    pub pending: i64,
    pub sending: i64,
    pub sent: i64,
    pub failed: i64,
    pub delivered: i64,
}

/// Ad-hoc send record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub seq: i64,
    pub phone_number: String,
    pub message: String,
    pub port: Option<String>,
    pub status: String,
    pub status_message: Option<String>,
    pub gateway_id: Option<GatewayId>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Inbound SMS stored by the hardware webhook
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InboxMessage {
    pub id: Uuid,
    pub phone_number: String,
    pub message: String,
    pub port: Option<String>,
    pub port_name: Option<String>,
    pub imsi: Option<String>,
    pub received_at: DateTime<Utc>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for storing an inbound SMS
#[derive(Debug, Clone)]
pub struct CreateInboxMessage {
    pub phone_number: String,
    pub message: String,
    pub port: Option<String>,
    pub port_name: Option<String>,
    pub imsi: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// Anti-spam log entry
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SpamLogEntry {
    pub id: Uuid,
    pub phone_number: String,
    pub last_sent: DateTime<Utc>,
}

/// Panel-wide message statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageStats {
    pub inbox_total: i64,
    pub inbox_unread: i64,
    pub outbox_total: i64,
    pub outbox_sent: i64,
    pub outbox_failed: i64,
    pub outbox_pending: i64,
    pub today_sent: i64,
    pub today_received: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campaign_status_roundtrip() {
        for status in [
            CampaignStatus::Draft,
            CampaignStatus::Running,
            CampaignStatus::Paused,
            CampaignStatus::Completed,
            CampaignStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<CampaignStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(CampaignStatus::Completed.is_terminal());
        assert!(CampaignStatus::Cancelled.is_terminal());
        assert!(!CampaignStatus::Paused.is_terminal());
    }

    #[test]
    fn test_port_mode_parse() {
        assert_eq!("least_used".parse::<PortMode>(), Ok(PortMode::LeastUsed));
        assert!("first_free".parse::<PortMode>().is_err());
    }

    #[test]
    fn test_gateway_kind_parse() {
        assert_eq!("goip".parse::<GatewayKind>(), Ok(GatewayKind::Goip));
        assert!("smpp".parse::<GatewayKind>().is_err());
    }
}
