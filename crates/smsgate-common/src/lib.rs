//! smsgate Common - Shared types and utilities
//!
//! This crate provides the configuration, error taxonomy, identifier types
//! and phone number handling shared by every other smsgate crate.

pub mod config;
pub mod error;
pub mod phone;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
