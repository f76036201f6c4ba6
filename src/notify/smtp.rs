use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use super::templates::{EmailTemplates, RenderedEmail};
use super::{ApprovalNotice, Notifier};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Defaults to `user` when unset.
    pub from: Option<String>,
}

impl SmtpSettings {
    pub fn sender(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.user)
    }
}

/// STARTTLS relay with username/password login.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    templates: EmailTemplates,
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings, templates: EmailTemplates) -> Result<Self, String> {
        let sender = settings
            .sender()
            .parse::<Mailbox>()
            .map_err(|e| format!("Invalid sender address '{}': {e}", settings.sender()))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| format!("Invalid SMTP host '{}': {e}", settings.host))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.user.clone(),
                settings.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            sender,
            templates,
        })
    }

    fn build_message(&self, notice: &ApprovalNotice) -> Result<Message, String> {
        let recipient = notice
            .recipient
            .parse::<Mailbox>()
            .map_err(|e| format!("Invalid recipient '{}': {e}", notice.recipient))?;
        let RenderedEmail {
            subject,
            text,
            html,
        } = self.templates.render_approval(notice)?;
        Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text, html))
            .map_err(|e| format!("Could not build email: {e}"))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_approval(&self, notice: &ApprovalNotice) -> bool {
        let message = match self.build_message(notice) {
            Ok(message) => message,
            Err(err) => {
                warn!("Approval email not sent: {err}");
                return false;
            }
        };
        match self.transport.send(message).await {
            Ok(_) => {
                info!("Approval email sent to {}", notice.recipient);
                true
            }
            Err(err) => {
                warn!("Error sending approval email to {}: {err}", notice.recipient);
                false
            }
        }
    }
}
