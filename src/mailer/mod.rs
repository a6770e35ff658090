/// Outbound email seam. Delivery goes through an external HTTP mail relay and
/// is always best-effort: a failed send is logged, never propagated.
// region:    --- Imports
use crate::account::Account;
use crate::config::Config;
use async_trait::async_trait;
use tracing::warn;

// endregion: --- Imports

// region:    --- Mailer Trait

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, subject: &str, body: &str, to: &[String]) -> Result<(), String>;
}

/// Posts messages to the configured HTTP mail relay.
pub struct RelayMailer {
    client: reqwest::Client,
    relay_url: String,
    from: String,
}

impl RelayMailer {
    pub fn new(relay_url: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            relay_url,
            from,
        }
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send(&self, subject: &str, body: &str, to: &[String]) -> Result<(), String> {
        if to.is_empty() {
            return Ok(());
        }
        self.client
            .post(&self.relay_url)
            .json(&serde_json::json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "body": body,
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Used when no relay is configured.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, _subject: &str, _body: &str, _to: &[String]) -> Result<(), String> {
        Ok(())
    }
}

pub fn build(config: &Config) -> Box<dyn Mailer> {
    if config.mail_relay_url.is_empty() {
        Box::new(NoopMailer)
    } else {
        Box::new(RelayMailer::new(
            config.mail_relay_url.clone(),
            config.email_from.clone(),
        ))
    }
}

// endregion: --- Mailer Trait

// region:    --- Helpers

/// Activity email, honoring each recipient's `email_activity` opt-in and
/// appending the settings footer. Failures are swallowed.
pub async fn send_mail_activity(
    mailer: &dyn Mailer,
    config: &Config,
    subject: &str,
    body: &str,
    recipients: &[&Account],
) {
    let to: Vec<String> = recipients
        .iter()
        .filter(|a| a.email_activity)
        .map(|a| a.email.clone())
        .collect();
    let body = format!(
        "{}\n\nYou can change your email notification settings here: {}/account/edit",
        body, config.public_url
    );
    if let Err(e) = mailer.send(subject, &body, &to).await {
        warn!("{:<12} --> mail send failed: {}", "Mailer", e);
    }
}

/// Unconditional send (verification links, admin reports); still best-effort.
pub async fn send_mail(mailer: &dyn Mailer, subject: &str, body: &str, to: &[String]) {
    if let Err(e) = mailer.send(subject, body, to).await {
        warn!("{:<12} --> mail send failed: {}", "Mailer", e);
    }
}

// endregion: --- Helpers
