//! Outgoing mail: a `Mailer` seam with a log-only sender for development and
//! an HTTP sender for transactional mail APIs (Resend-style JSON).

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()>;
}

/// Writes a line per message instead of delivering it. Bodies are not
/// logged since they carry reset links.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        info!(to = %email.to, subject = %email.subject, "mail not sent: no MAIL_API_URL configured");
        Ok(())
    }
}

#[derive(Serialize)]
struct MailApiPayload<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: Option<String>, from: String) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("inkwell/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Config(format!("mail client: {}", e)))?;
        Ok(Self {
            client,
            api_url,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        let payload = MailApiPayload {
            from: &self.from,
            to: vec![email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
        };

        let mut req = self.client.post(&self.api_url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let started = Instant::now();
        let res = req
            .send()
            .await
            .map_err(|e| AppError::Mail(format!("send failed: {}", e)))?;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, to = %email.to, "mail API rejected message");
            return Err(AppError::Mail(format!("HTTP {}: {}", status, body)));
        }

        info!(
            to = %email.to,
            subject = %email.subject,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "mail sent"
        );
        Ok(())
    }
}

/// HTTP sender when `MAIL_API_URL` is set, log-only sender otherwise.
pub fn mailer_from_config(config: &Config) -> AppResult<Arc<dyn Mailer>> {
    match &config.mail_api_url {
        Some(url) => Ok(Arc::new(HttpMailer::new(
            url.clone(),
            config.mail_api_key.clone(),
            config.mail_from.clone(),
        )?)),
        None => Ok(Arc::new(LogMailer)),
    }
}
