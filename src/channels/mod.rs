//! Notification channels module
//!
//! This module provides the channel abstraction, the shared webhook client
//! and the MS Teams channel implementation.

pub mod msteam;
pub mod r#trait;
pub mod webhook;

pub use msteam::MsTeamsChannel;
pub use r#trait::{ChannelResult, NotificationChannel};
pub use webhook::{WebhookClient, WebhookResponse};
