//! Email alert delivery
//!
//! Renders the summary and sends it once through an authenticated STARTTLS
//! relay. Failures surface as typed errors with no internal retry; the alert
//! is not worth the scheduler's whole-run retry semantics, but it must never
//! fail silently.

mod render;

pub use render::render_summary;

use chrono::NaiveDate;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;
use tracing::info;

use crate::config::EmailConfig;
use crate::error::{Error, Result};

/// One-shot SMTP sender for the alert summary
pub struct AlertNotifier {
    sender: String,
    receiver: String,
    smtp_secret: String,
    relay: String,
    port: u16,
    timeout: Duration,
}

impl AlertNotifier {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            sender: config.sender.clone(),
            receiver: config.receiver.clone(),
            smtp_secret: config.smtp_secret.clone(),
            relay: config.smtp_relay.clone(),
            port: config.smtp_port,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn notify_err(&self, reason: impl ToString) -> Error {
        Error::Notify {
            receiver: self.receiver.clone(),
            reason: reason.to_string(),
        }
    }

    /// Send the rendered summary with subject `{job_name} - {run_date}`.
    pub fn notify(&self, job_name: &str, run_date: NaiveDate, body: String) -> Result<()> {
        let subject = format!("{} - {}", job_name, run_date);

        let from: Mailbox = self
            .sender
            .parse()
            .map_err(|e| self.notify_err(format!("bad sender address: {e}")))?;
        let to: Mailbox = self
            .receiver
            .parse()
            .map_err(|e| self.notify_err(format!("bad receiver address: {e}")))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(&subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| self.notify_err(format!("message build failed: {e}")))?;

        info!(relay = %self.relay, port = self.port, "Connecting to SMTP relay...");
        let mailer = SmtpTransport::starttls_relay(&self.relay)
            .map_err(|e| self.notify_err(format!("relay setup failed: {e}")))?
            .port(self.port)
            .credentials(Credentials::new(
                self.sender.clone(),
                self.smtp_secret.clone(),
            ))
            .timeout(Some(self.timeout))
            .build();

        info!(
            subject = %subject,
            sender = %self.sender,
            receiver = %self.receiver,
            "Sending alert summary"
        );
        mailer
            .send(&message)
            .map_err(|e| self.notify_err(format!("send failed: {e}")))?;

        info!(receiver = %self.receiver, "Alert summary delivered");

        Ok(())
    }
}
