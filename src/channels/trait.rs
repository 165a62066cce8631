//! Notification channel trait definition
//!
//! This module defines the seam between the notifier and the transport that
//! delivers a rendered payload.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ChannelError;

/// Result type for channel operations
pub type ChannelResult<T> = std::result::Result<T, ChannelError>;

/// Notification channel trait
///
/// A channel posts an already validated JSON payload to a destination URL.
/// Errors are returned to the caller, which decides whether they matter.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Get the unique identifier for this channel type
    fn channel_type(&self) -> &'static str;

    /// Get the human-readable display name for this channel
    fn display_name(&self) -> &'static str;

    /// Deliver one payload to `url`
    async fn send(&self, url: &str, payload: &Value) -> ChannelResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MockChannel;

    #[async_trait]
    impl NotificationChannel for MockChannel {
        fn channel_type(&self) -> &'static str {
            "mock"
        }

        fn display_name(&self) -> &'static str {
            "Mock Channel"
        }

        async fn send(&self, url: &str, _payload: &Value) -> ChannelResult<()> {
            if url.is_empty() {
                return Err(ChannelError::HttpError("empty url".to_string()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_channel_type() {
        let channel = MockChannel;
        assert_eq!(channel.channel_type(), "mock");
        assert_eq!(channel.display_name(), "Mock Channel");
    }

    #[tokio::test]
    async fn test_send_through_trait_object() {
        let channel: Box<dyn NotificationChannel> = Box::new(MockChannel);
        assert!(channel.send("https://example.com", &json!({})).await.is_ok());
        assert!(matches!(
            channel.send("", &json!({})).await,
            Err(ChannelError::HttpError(_))
        ));
    }
}
