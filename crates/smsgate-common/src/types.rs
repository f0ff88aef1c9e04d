//! Common types for smsgate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for gateways
pub type GatewayId = Uuid;

/// Unique identifier for gateway ports
pub type GatewayPortId = Uuid;

/// Unique identifier for campaigns
pub type CampaignId = Uuid;

/// Unique identifier for campaign messages
pub type CampaignMessageId = Uuid;

/// Unique identifier for outbox records
pub type OutboxId = Uuid;

/// Unique identifier for inbox records
pub type InboxId = Uuid;

/// Timestamp wrapper
pub type Timestamp = DateTime<Utc>;

/// One recipient of a bulk send or campaign: a raw phone number and an
/// optional display name used for `{name}` substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub phone: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Recipient {
    /// Create a new recipient
    pub fn new(phone: impl Into<String>, name: Option<String>) -> Self {
        Self {
            phone: phone.into(),
            name,
        }
    }
}

/// Capability set limiting which ports a caller may see.
///
/// `None` means unrestricted (an administrator); `Some(vec![])` means the
/// caller has no port access and listings must come back empty. Resolved
/// once per request by the caller and passed down explicitly.
pub type AllowedPorts = Option<Vec<String>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_new() {
        let r = Recipient::new("9167193249", Some("Ivan".to_string()));
        assert_eq!(r.phone, "9167193249");
        assert_eq!(r.name.as_deref(), Some("Ivan"));
    }
}
