//! Repository layer for data access

pub mod campaign_messages;
pub mod campaigns;
pub mod gateways;
pub mod inbox;
pub mod outbox;
pub mod ports;
pub mod settings;
pub mod spam_log;

pub use campaign_messages::CampaignMessageRepository;
pub use campaigns::CampaignRepository;
pub use gateways::GatewayRepository;
pub use inbox::InboxRepository;
pub use outbox::OutboxRepository;
pub use ports::PortRepository;
pub use settings::SettingsRepository;
pub use spam_log::SpamLogRepository;
