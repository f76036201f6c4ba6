use serde::Serialize;
use tera::{Context, Tera};

use super::ApprovalNotice;

const TEXT_TEMPLATE: &str = "approval.txt";
const HTML_TEMPLATE: &str = "approval.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Serialize)]
struct EmailContext<'a> {
    survey_title: &'a str,
    approver: &'a str,
    form_url: &'a str,
    custom_message: Option<&'a str>,
}

/// Approval email bodies. Tera autoescapes `.html` names only, so the plain
/// text part keeps user input as typed.
pub struct EmailTemplates {
    tera: Tera,
}

impl EmailTemplates {
    pub fn load() -> Result<Self, String> {
        let mut tera = Tera::default();
        tera
            .add_raw_templates(vec![
                (TEXT_TEMPLATE, include_str!("../../templates/email/approval.txt.tera")),
                (HTML_TEMPLATE, include_str!("../../templates/email/approval.html.tera")),
            ])
            .map_err(|e| format!("Template load failed: {e}"))?;
        Ok(Self { tera })
    }

    pub fn render_approval(&self, notice: &ApprovalNotice) -> Result<RenderedEmail, String> {
        let ctx = Context::from_serialize(EmailContext {
            survey_title: &notice.survey_title,
            approver: &notice.approver,
            form_url: &notice.form_url,
            custom_message: notice
                .custom_message
                .as_deref()
                .filter(|m| !m.trim().is_empty()),
        })
        .map_err(|e| format!("Template context failed: {e}"))?;

        let text = self
            .tera
            .render(TEXT_TEMPLATE, &ctx)
            .map_err(|e| format!("Render failed for {TEXT_TEMPLATE}: {e}"))?;
        let html = self
            .tera
            .render(HTML_TEMPLATE, &ctx)
            .map_err(|e| format!("Render failed for {HTML_TEMPLATE}: {e}"))?;

        Ok(RenderedEmail {
            subject: format!("Survey Approved: {}", notice.survey_title),
            text,
            html,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::EmailTemplates;
    use crate::notify::ApprovalNotice;

    fn notice(custom_message: Option<&str>) -> ApprovalNotice {
        ApprovalNotice {
            recipient: "owner@example.com".to_string(),
            survey_title: "Lunch <Poll>".to_string(),
            form_url: "https://docs.google.com/forms/d/e/abc/viewform".to_string(),
            approver: "Ada".to_string(),
            custom_message: custom_message.map(str::to_string),
        }
    }

    #[test]
    fn renders_subject_and_both_bodies() {
        let templates = EmailTemplates::load().expect("load");
        let email = templates.render_approval(&notice(Some("Ship it"))).expect("render");

        assert_eq!(email.subject, "Survey Approved: Lunch <Poll>");
        assert!(email.text.contains("The survey \"Lunch <Poll>\" has been approved by Ada."));
        assert!(email.text.contains("https://docs.google.com/forms/d/e/abc/viewform"));
        assert!(email.text.contains("Message from the approver:\nShip it"));
        assert!(email.html.contains("<strong>Ada</strong>"));
        assert!(email.html.contains("Ship it"));
    }

    #[test]
    fn html_body_escapes_user_input() {
        let templates = EmailTemplates::load().expect("load");
        let email = templates
            .render_approval(&notice(Some("<script>alert(1)</script>")))
            .expect("render");

        assert!(email.html.contains("Lunch &lt;Poll&gt;"));
        assert!(!email.html.contains("<script>"));
    }

    #[test]
    fn blank_custom_message_is_omitted() {
        let templates = EmailTemplates::load().expect("load");
        let email = templates.render_approval(&notice(Some("  "))).expect("render");
        assert!(!email.text.contains("Message from the approver"));
        assert!(!email.html.contains("Message from the approver"));
    }
}
