//! Notification email: guest confirmations, internal RSVP notices and
//! failure alerts, sent over SMTP.

use crate::config::SmtpSettings;
use crate::error::{RsvpError, RsvpResult};
use crate::rsvp::RsvpResponse;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::debug;
use secrecy::ExposeSecret;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_GUEST_SENDER: &str = "no-reply@example.com";
pub const GUEST_SUBJECT: &str = "RSVP received — thank you!";
pub const FAILURE_SUBJECT: &str = "RSVP save FAILED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> RsvpResult<()>;
}

/// SMTP delivery. `secure` selects implicit TLS, otherwise STARTTLS is used
/// when the server offers it.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings, timeout: Duration) -> anyhow::Result<Self> {
        let builder = if settings.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
        } else {
            let tls = TlsParameters::new(settings.host.clone())?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host).tls(Tls::Opportunistic(tls))
        };

        let mut builder = builder.port(settings.port).timeout(Some(timeout));
        if let Some(user) = &settings.user {
            let password = settings
                .password
                .as_ref()
                .map(|p| p.expose_secret().to_string())
                .unwrap_or_default();
            builder = builder.credentials(Credentials::new(user.clone(), password));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> RsvpResult<()> {
        let parse = |address: &str| {
            address
                .parse::<Mailbox>()
                .map_err(|e| RsvpError::Notification(format!("Invalid email address '{}': {}", address, e)))
        };

        let email = Message::builder()
            .from(parse(&message.from)?)
            .to(parse(&message.to)?)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)
            .map_err(|e| RsvpError::Notification(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| RsvpError::Notification(format!("SMTP delivery failed: {}", e)))?;
        Ok(())
    }
}

fn optional(label: &str, separator: &str, value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => format!("{}{}{}", separator, label, v),
        None => String::new(),
    }
}

/// One line per response for the document log.
pub fn document_log_lines(responses: &[RsvpResponse], contact_email: Option<&str>, timestamp: &str) -> Vec<String> {
    responses
        .iter()
        .map(|r| {
            format!(
                "RSVP — {} | {} | Attending: {}{}{}{} | {}",
                r.name,
                contact_email.unwrap_or(""),
                r.attending,
                optional("+1: ", " | ", r.plus_one_name.as_deref()),
                optional("Dietary: ", " | ", Some(&r.dietary_restrictions)),
                optional("Staying: ", " | ", Some(&r.staying)),
                timestamp
            )
        })
        .collect()
}

pub fn guest_confirmation(from: &str, to: &str, responses: &[RsvpResponse], received_at: &str) -> EmailMessage {
    let lines: Vec<String> = responses
        .iter()
        .map(|r| {
            format!(
                "• {}: {}{}{}{}",
                r.name,
                r.attending,
                optional("Dietary: ", " — ", Some(&r.dietary_restrictions)),
                optional("Staying: ", " — ", Some(&r.staying)),
                optional("+1: ", " — ", r.plus_one_name.as_deref()),
            )
        })
        .collect();

    EmailMessage {
        from: from.to_string(),
        to: to.to_string(),
        subject: GUEST_SUBJECT.to_string(),
        body: format!(
            "Thank you! We've received your RSVP ({}).\n\n{}\n\nIf you need to make changes, just submit the form again or contact us.",
            received_at,
            lines.join("\n")
        ),
    }
}

/// Summary for the couple. Party submissions get a party subject even with one guest.
pub fn internal_notification(
    from: &str,
    to: &str,
    responses: &[RsvpResponse],
    party_submission: bool,
    timestamp: &str,
) -> EmailMessage {
    let subject = match responses {
        [single] if !party_submission => format!("RSVP ({})", single.name),
        _ => format!("RSVP (party, {} guests)", responses.len()),
    };
    let lines: Vec<String> = responses
        .iter()
        .map(|r| {
            format!(
                "- {} | Attending: {}{}{}{}",
                r.name,
                r.attending,
                optional("Dietary: ", " | ", Some(&r.dietary_restrictions)),
                optional("+1: ", " | ", r.plus_one_name.as_deref()),
                optional("Staying: ", " | ", Some(&r.staying)),
            )
        })
        .collect();

    EmailMessage {
        from: from.to_string(),
        to: to.to_string(),
        subject,
        body: format!("New RSVP received at {}\n{}\n", timestamp, lines.join("\n")),
    }
}

pub fn failure_notification(from: &str, to: &str, payload: &Value, timestamp: &str) -> EmailMessage {
    EmailMessage {
        from: from.to_string(),
        to: to.to_string(),
        subject: FAILURE_SUBJECT.to_string(),
        body: format!("RSVP failed to save at {}\nPayload: {}", timestamp, payload),
    }
}

/// Mailer plus the addresses it sends from and to. Every send is skipped
/// (returning `Ok(false)`) when the needed pieces are not configured.
#[derive(Clone, Default)]
pub struct Notifier {
    mailer: Option<Arc<dyn Mailer>>,
    from: Option<String>,
    notify_to: Option<String>,
}

impl Notifier {
    pub fn new(mailer: Option<Arc<dyn Mailer>>, from: Option<String>, notify_to: Option<String>) -> Self {
        Self {
            mailer,
            from,
            notify_to,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    fn internal_route(&self) -> Option<(&Arc<dyn Mailer>, &str, &str)> {
        let mailer = self.mailer.as_ref()?;
        let to = self.notify_to.as_deref()?;
        Some((mailer, self.from.as_deref().unwrap_or(to), to))
    }

    pub async fn send_guest_confirmation(
        &self,
        to: &str,
        responses: &[RsvpResponse],
        received_at: &str,
    ) -> RsvpResult<bool> {
        let Some(mailer) = self.mailer.as_ref() else {
            debug!("No mail transport configured, skipping guest confirmation");
            return Ok(false);
        };
        let from = self.from.as_deref().unwrap_or(DEFAULT_GUEST_SENDER);
        mailer.send(guest_confirmation(from, to, responses, received_at)).await?;
        Ok(true)
    }

    pub async fn send_internal_notice(
        &self,
        responses: &[RsvpResponse],
        party_submission: bool,
        timestamp: &str,
    ) -> RsvpResult<bool> {
        let Some((mailer, from, to)) = self.internal_route() else {
            debug!("No internal recipient configured, skipping RSVP notice");
            return Ok(false);
        };
        mailer
            .send(internal_notification(from, to, responses, party_submission, timestamp))
            .await?;
        Ok(true)
    }

    pub async fn send_failure_notice(&self, payload: &Value, timestamp: &str) -> RsvpResult<bool> {
        let Some((mailer, from, to)) = self.internal_route() else {
            return Ok(false);
        };
        mailer.send(failure_notification(from, to, payload, timestamp)).await?;
        Ok(true)
    }
}
