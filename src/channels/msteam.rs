//! MS Teams incoming-webhook channel
//!
//! Posts the rendered message card as-is; the template owns the card shape.

use async_trait::async_trait;
use serde_json::Value;

use crate::channels::r#trait::{ChannelResult, NotificationChannel};
use crate::channels::webhook::WebhookClient;
use crate::config::NotifierSettings;
use crate::error::{ChannelError, NotifierError};

/// MS Teams webhook notification channel
pub struct MsTeamsChannel {
    client: WebhookClient,
}

impl MsTeamsChannel {
    /// Build the channel from plugin settings (timeout and proxy)
    pub fn new(settings: &NotifierSettings) -> Result<Self, NotifierError> {
        Ok(Self {
            client: WebhookClient::with_options(settings.timeout_secs, settings.proxy.as_deref())?,
        })
    }
}

#[async_trait]
impl NotificationChannel for MsTeamsChannel {
    fn channel_type(&self) -> &'static str {
        "msteam"
    }

    fn display_name(&self) -> &'static str {
        "MS Teams"
    }

    async fn send(&self, url: &str, payload: &Value) -> ChannelResult<()> {
        let response = self.client.send(url, payload).await?;
        match response.error_info() {
            None => Ok(()),
            Some((code, body)) => Err(ChannelError::WebhookResponseError(format!(
                "HTTP {}: {}",
                code, body
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::webhook::stub;
    use serde_json::json;
    use std::time::Duration;

    fn channel() -> MsTeamsChannel {
        MsTeamsChannel::new(&NotifierSettings::default()).unwrap()
    }

    #[test]
    fn test_channel_type() {
        let channel = channel();
        assert_eq!(channel.channel_type(), "msteam");
        assert_eq!(channel.display_name(), "MS Teams");
    }

    #[tokio::test]
    async fn test_send_success() {
        let (url, requests) = stub::spawn(200);
        let card = json!({"@type": "MessageCard", "text": "Run successful"});

        channel().send(&url, &card).await.unwrap();

        let request = requests.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(request.contains("\"@type\":\"MessageCard\""));
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let (url, _requests) = stub::spawn(500);

        let result = channel().send(&url, &json!({"text": "x"})).await;
        match result {
            Err(ChannelError::WebhookResponseError(message)) => {
                assert_eq!(message, "HTTP 500: ok")
            }
            other => panic!("Expected webhook response error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_proxy_fails_construction() {
        let settings = NotifierSettings {
            proxy: Some("ftp://proxy.internal:21".to_string()),
            ..Default::default()
        };
        assert!(MsTeamsChannel::new(&settings).is_err());
    }
}
