//! HTTP email provider client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::{EmailMessage, EmailSender};
use crate::config::EmailConfig;
use crate::error::{ErrorCode, MeridianError, Result};

/// Sends mail by POSTing JSON to a provider endpoint.
pub struct HttpEmailSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    from_address: String,
}

impl HttpEmailSender {
    /// Build from config. Returns `None` when no endpoint is configured.
    pub fn from_config(config: &EmailConfig) -> Result<Option<Self>> {
        let Some(endpoint) = config.endpoint.clone() else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                MeridianError::configuration(format!("email client: {}", e))
            })?;

        Ok(Some(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
        }))
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let payload = json!({
            "from": self.from_address,
            "to": message.to,
            "subject": message.subject,
            "text": message.body,
        });

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            MeridianError::with_internal(
                ErrorCode::EmailDispatchFailed,
                "Email provider request failed",
                e.to_string(),
            )
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MeridianError::with_internal(
                ErrorCode::EmailDispatchFailed,
                "Email provider rejected the message",
                format!("status {}: {}", status, body),
            ));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> EmailConfig {
        EmailConfig {
            endpoint: Some(format!("{}/v1/send", server.uri())),
            api_key: Some("test-key".to_string()),
            from_address: "no-reply@meridian.example".to_string(),
            timeout_secs: 5,
        }
    }

    fn message() -> EmailMessage {
        EmailMessage {
            to: vec!["arun@example.com".to_string()],
            subject: "Your home loan application is now In Review".to_string(),
            body: "The status changed.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_posts_payload_with_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/send"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "from": "no-reply@meridian.example",
                "to": ["arun@example.com"],
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sender = HttpEmailSender::from_config(&config_for(&server))
            .unwrap()
            .unwrap();
        sender.send(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn test_provider_error_maps_to_dispatch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let sender = HttpEmailSender::from_config(&config_for(&server))
            .unwrap()
            .unwrap();
        let err = sender.send(&message()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::EmailDispatchFailed);
    }

    #[test]
    fn test_no_endpoint_yields_none() {
        let sender = HttpEmailSender::from_config(&EmailConfig::default()).unwrap();
        assert!(sender.is_none());
    }
}
