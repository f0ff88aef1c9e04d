//! smsgate Storage - Database access layer
//!
//! This crate provides the PostgreSQL pool, the row models for the SMS
//! panel (gateways, ports, campaigns, outbox/inbox, spam log, settings) and
//! one repository per aggregate.

pub mod db;
pub mod models;
pub mod repository;

pub use db::{Database, DatabasePool};
pub use models::*;
pub use repository::*;
