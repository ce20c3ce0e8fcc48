//! SMS delivery for verification codes.
//!
//! The provider is selected by `sms.provider`: `console` logs the
//! message (development default), `http` posts JSON to a gateway.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::SmsConfig;

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("SMS provider not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to send SMS: {0}")]
    SendFailed(String),

    #[error("SMS gateway error: {0}")]
    Gateway(String),
}

/// Sends SMS messages through the configured provider.
#[derive(Clone)]
pub struct SmsService {
    config: Arc<SmsConfig>,
    client: reqwest::Client,
}

impl SmsService {
    pub fn new(config: SmsConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }

    /// Delivers a verification code with its validity window.
    pub async fn send_verification_code(
        &self,
        phone: &str,
        code: &str,
        ttl_secs: i64,
    ) -> Result<(), SmsError> {
        let message = verification_message(code, ttl_secs);
        self.send(phone, &message).await
    }

    pub async fn send(&self, to: &str, message: &str) -> Result<(), SmsError> {
        match self.config.provider.as_str() {
            "console" => {
                // Development provider: the message (code included) goes
                // to the log instead of a phone.
                info!(to = %to, message = %message, "sms (console provider)");
                Ok(())
            }
            "http" => self.send_http(to, message).await,
            other => {
                error!(provider = %other, "unknown SMS provider");
                Err(SmsError::NotConfigured(other.to_string()))
            }
        }
    }

    async fn send_http(&self, to: &str, message: &str) -> Result<(), SmsError> {
        if self.config.gateway_url.is_empty() {
            return Err(SmsError::NotConfigured("sms.gateway_url is empty".to_string()));
        }

        let payload = serde_json::json!({
            "to": to,
            "message": message,
            "sender_id": self.config.sender_id,
        });

        let response = self
            .client
            .post(&self.config.gateway_url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.gateway_token),
            )
            .json(&payload)
            .send()
            .await
            .map_err(|e| SmsError::SendFailed(e.to_string()))?;

        if response.status().is_success() {
            debug!(to = %to, "sms accepted by gateway");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "sms gateway rejected message");
            Err(SmsError::Gateway(format!("{}: {}", status, body)))
        }
    }
}

fn verification_message(code: &str, ttl_secs: i64) -> String {
    format!(
        "Kode verifikasi Arisan Anda: {}. Berlaku {} menit. Jangan bagikan kode ini.",
        code,
        ttl_secs / 60
    )
}
