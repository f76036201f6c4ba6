pub mod smtp;
pub mod templates;

use async_trait::async_trait;
use tracing::warn;

pub use smtp::{SmtpNotifier, SmtpSettings};
pub use templates::{EmailTemplates, RenderedEmail};

/// Everything the approval email needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalNotice {
    pub recipient: String,
    pub survey_title: String,
    pub form_url: String,
    pub approver: String,
    pub custom_message: Option<String>,
}

/// Delivers approval notices. Never fails: the result only says whether the
/// message went out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_approval(&self, notice: &ApprovalNotice) -> bool;
}

/// Stand-in when SMTP credentials are missing.
pub struct LogOnlyNotifier;

#[async_trait]
impl Notifier for LogOnlyNotifier {
    async fn send_approval(&self, notice: &ApprovalNotice) -> bool {
        warn!(
            "SMTP not configured; approval email for '{}' to {} not sent (form: {})",
            notice.survey_title, notice.recipient, notice.form_url
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::{ApprovalNotice, LogOnlyNotifier, Notifier};

    #[tokio::test]
    async fn log_only_notifier_reports_nothing_sent() {
        let notice = ApprovalNotice {
            recipient: "owner@example.com".to_string(),
            survey_title: "Lunch".to_string(),
            form_url: "https://forms.example/abc".to_string(),
            approver: "Ada".to_string(),
            custom_message: None,
        };
        assert!(!LogOnlyNotifier.send_approval(&notice).await);
    }
}
