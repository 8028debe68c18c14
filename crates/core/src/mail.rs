//! Email delivery of a final artifact.
//!
//! The subject and body are derived from the artifact text, addresses are
//! validated, and the message is submitted once to an authenticated STARTTLS
//! relay. Nothing is retried.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use once_cell::sync::Lazy;
use pl_protocol::config_models::MailSettings;
use pl_protocol::ipc::REDACTED;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[allow(clippy::unwrap_used)]
static ADDRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

const SUBJECT_PREFIX: &str = "subject:";

/// Outcome of a failed send. Success is `Ok(MailReceipt)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    /// The relay host or port is not set.
    #[error("Mail configuration error: {0}")]
    Configuration(String),

    /// A blank field or a malformed address. The relay was not contacted.
    #[error("{0}")]
    Validation(String),

    /// Connection, TLS, authentication or submission failure, verbatim.
    #[error("Failed to send email: {0}")]
    Transport(String),
}

/// Everything needed to email an artifact.
#[derive(Clone)]
pub struct MailRequest {
    pub from: String,
    /// Relay credential, usually an app password.
    pub password: String,
    pub to: String,
    /// Artifact text; may start with a `Subject:` line.
    pub text: String,
    pub default_subject: String,
}

impl fmt::Debug for MailRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailRequest")
            .field("from", &self.from)
            .field("password", &REDACTED)
            .field("to", &self.to)
            .field("text", &self.text)
            .field("default_subject", &self.default_subject)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailReceipt {
    pub to: String,
    pub subject: String,
}

/// A message ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Split an artifact into subject and body.
///
/// The first line starting with `subject:` (any case, leading whitespace
/// ignored) gives the subject; the body is everything after that line. Without
/// such a line the whole text is the body and `default_subject` is used.
///
/// ```
/// use pl_core::mail::extract_subject_and_body;
///
/// let (subject, body) = extract_subject_and_body("Subject: Hello\nBody line 1\nBody line 2", "Default");
/// assert_eq!(subject, "Hello");
/// assert_eq!(body, "Body line 1\nBody line 2");
/// ```
pub fn extract_subject_and_body(text: &str, default_subject: &str) -> (String, String) {
    let lines: Vec<&str> = text.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        let is_subject = trimmed
            .get(..SUBJECT_PREFIX.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(SUBJECT_PREFIX));
        if is_subject {
            let subject = trimmed[SUBJECT_PREFIX.len()..].trim().to_string();
            let body = lines[idx + 1..].join("\n").trim().to_string();
            return (subject, body);
        }
    }
    (default_subject.to_string(), text.to_string())
}

/// Check that `address` looks like `local@domain.tld`.
pub fn validate_address(address: &str) -> Result<(), MailError> {
    if ADDRESS.is_match(address.trim()) {
        Ok(())
    } else {
        Err(MailError::Validation(format!(
            "'{}' is not a valid email address",
            address.trim()
        )))
    }
}

/// Submits one message to a relay.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(
        &self,
        settings: &MailSettings,
        mail: &OutgoingMail,
        password: &str,
    ) -> Result<(), MailError>;
}

/// STARTTLS submission with username/password authentication.
pub struct SmtpRelay;

#[async_trait]
impl MailTransport for SmtpRelay {
    async fn deliver(
        &self,
        settings: &MailSettings,
        mail: &OutgoingMail,
        password: &str,
    ) -> Result<(), MailError> {
        let parse = |address: &str| {
            address
                .parse::<Mailbox>()
                .map_err(|e| MailError::Validation(format!("'{address}': {e}")))
        };

        let message = Message::builder()
            .from(parse(&mail.from)?)
            .to(parse(&mail.to)?)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| MailError::Validation(e.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(settings.smtp_port)
            .credentials(Credentials::new(mail.from.clone(), password.to_string()))
            .build();

        transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| MailError::Transport(e.to_string()))
    }
}

/// Sends artifacts by email.
#[derive(Clone)]
pub struct Mailer {
    settings: MailSettings,
    transport: Arc<dyn MailTransport>,
}

impl Mailer {
    /// Mailer submitting through the relay in `settings`.
    pub fn smtp(settings: MailSettings) -> Self {
        Self::with_transport(settings, Arc::new(SmtpRelay))
    }

    pub fn with_transport(settings: MailSettings, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    /// Validate `request` and submit it.
    ///
    /// Checks run in order: blank fields, address syntax, relay settings. The
    /// relay is only contacted when all of them pass.
    pub async fn send(&self, request: &MailRequest) -> Result<MailReceipt, MailError> {
        for (field, value) in [
            ("sender address", &request.from),
            ("password", &request.password),
            ("recipient address", &request.to),
        ] {
            if value.trim().is_empty() {
                return Err(MailError::Validation(format!("{field} is required")));
            }
        }
        if request.text.trim().is_empty() {
            return Err(MailError::Validation("nothing to send".to_string()));
        }

        validate_address(&request.from)?;
        validate_address(&request.to)?;

        if self.settings.smtp_host.trim().is_empty() {
            return Err(MailError::Configuration("SMTP host is not set".to_string()));
        }
        if self.settings.smtp_port == 0 {
            return Err(MailError::Configuration("SMTP port is not set".to_string()));
        }

        let (subject, body) = extract_subject_and_body(&request.text, &request.default_subject);
        let mail = OutgoingMail {
            from: request.from.trim().to_string(),
            to: request.to.trim().to_string(),
            subject,
            body,
        };

        match self
            .transport
            .deliver(&self.settings, &mail, &request.password)
            .await
        {
            Ok(()) => {
                info!(to = %mail.to, subject = %mail.subject, "email sent");
                Ok(MailReceipt {
                    to: mail.to,
                    subject: mail.subject,
                })
            }
            Err(e) => {
                warn!(to = %mail.to, error = %e, "email delivery failed");
                Err(e)
            }
        }
    }
}
