use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    clients::Messenger, config::Config, error::DeliveryError, models::reminder::ReminderMessage,
};

/// Error body returned by the mail gateway when it refuses a message.
#[derive(Debug, Deserialize)]
struct GatewayError {
    code: String,
    #[serde(default)]
    details: String,
}

pub struct MailGatewayClient {
    http_client: Client,
    base_url: String,
    token: Option<String>,
}

impl MailGatewayClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        info!(base_url = %config.mail_gateway_url, "Mail gateway client initialized");

        Ok(Self {
            http_client,
            base_url: config.mail_gateway_url.trim_end_matches('/').to_string(),
            token: config.mail_gateway_token.clone(),
        })
    }
}

#[async_trait]
impl Messenger for MailGatewayClient {
    async fn send(&self, message: &ReminderMessage) -> Result<(), DeliveryError> {
        let url = format!("{}/api/v1/messages", self.base_url);

        debug!(
            transaction_id = message.related_records.transaction_id,
            entity_id = message.related_records.entity_id,
            "Sending reminder through mail gateway"
        );

        let mut request = self.http_client.post(&url).json(message);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        let error_text = response.text().await?;

        match serde_json::from_str::<GatewayError>(&error_text) {
            Ok(gateway_error) => Err(DeliveryError::platform(
                gateway_error.code,
                gateway_error.details,
            )),
            Err(_) => Err(DeliveryError::Unexpected(format!(
                "Mail gateway returned status {}: {}",
                status, error_text
            ))),
        }
    }
}
