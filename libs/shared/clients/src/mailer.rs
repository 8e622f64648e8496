use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Mail request failed: {0}")]
    Request(String),

    #[error("Mail service rejected the message: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub accepted_at: DateTime<Utc>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body_text: &str,
        body_html: Option<&str>,
    ) -> Result<DeliveryReceipt, MailError>;
}

/// HTTP mail API backend.
pub struct RestMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_address: String,
}

impl RestMailer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.mail_api_url.clone(),
            api_key: config.mail_api_key.clone(),
            from_address: config.mail_from_address.clone(),
        }
    }
}

#[async_trait]
impl Mailer for RestMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body_text: &str,
        body_html: Option<&str>,
    ) -> Result<DeliveryReceipt, MailError> {
        debug!("Sending mail to {} ({})", to, subject);

        let payload = json!({
            "from": self.from_address,
            "to": to,
            "subject": subject,
            "text": body_text,
            "html": body_html,
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("Mail service error ({}): {}", status, detail);
            return Err(MailError::Rejected(format!("{}: {}", status, detail)));
        }

        let message_id = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("id").and_then(|id| id.as_str().map(String::from)))
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(DeliveryReceipt {
            message_id,
            accepted_at: Utc::now(),
        })
    }
}

/// Captures outbound mail for assertions in tests.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<CapturedMail>>,
}

#[derive(Debug, Clone)]
pub struct CapturedMail {
    pub to: String,
    pub subject: String,
    pub body_text: String,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<CapturedMail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body_text: &str,
        _body_html: Option<&str>,
    ) -> Result<DeliveryReceipt, MailError> {
        self.sent.lock().await.push(CapturedMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body_text: body_text.to_string(),
        });
        Ok(DeliveryReceipt {
            message_id: Uuid::new_v4().to_string(),
            accepted_at: Utc::now(),
        })
    }
}
