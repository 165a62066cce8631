//! Configuration management module
//!
//! This module handles plugin settings, run parameter extraction and
//! message template rendering.

pub mod loader;
pub mod params;
pub mod schema;
pub mod templates;

pub use loader::{get_config_path, load_config_from_path, resolve_config_path};
pub use params::{extract_config, extract_identifiers, ParamBag};
pub use schema::{
    NotificationConfig, NotifierSettings, RunIdentifiers, RunTimezone, DEFAULT_CHANNEL_URL,
    DEFAULT_TEMPLATE, DEFAULT_WEB_BASE_URL, NOT_AVAILABLE,
};
pub use templates::{TemplateContext, TemplateEngine};
