//! Generic webhook client for sending notifications
//!
//! This module provides the HTTP client used to post JSON payloads to
//! webhook URLs with a fixed timeout and an optional proxy.

use reqwest::{Client, Proxy};
use serde::Serialize;
use std::time::Duration;

use crate::error::{ChannelError, NotifierError};

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Generic webhook client for HTTP-based notifications
pub struct WebhookClient {
    client: Client,
    timeout: Duration,
}

impl WebhookClient {
    /// Create a new webhook client with a custom timeout and optional proxy
    pub fn with_options(timeout_secs: u64, proxy: Option<&str>) -> Result<Self, NotifierError> {
        let timeout = Duration::from_secs(timeout_secs);
        let mut builder = Client::builder().timeout(timeout);

        if let Some(proxy_url) = proxy {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                NotifierError::ConfigError(format!("Invalid proxy URL {}: {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| {
            NotifierError::ConfigError(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self { client, timeout })
    }

    /// Send POST request with a JSON body to the webhook URL
    pub async fn send<T: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<WebhookResponse, ChannelError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChannelError::Timeout
                } else {
                    ChannelError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChannelError::HttpError(format!("Failed to read response body: {}", e)))?;

        if status.is_success() {
            Ok(WebhookResponse::Success(body))
        } else {
            Ok(WebhookResponse::Error(status.as_u16(), body))
        }
    }
}

/// Response from webhook request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookResponse {
    /// Successful response with body
    Success(String),
    /// Error response with status code and body
    Error(u16, String),
}

impl WebhookResponse {
    /// Get error info if error, None otherwise
    pub fn error_info(&self) -> Option<(u16, &str)> {
        match self {
            Self::Error(code, body) => Some((*code, body)),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/support/webhook_stub.rs"]
pub(crate) mod stub;
