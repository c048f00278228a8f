use contact_relay_core::contract::submission_fingerprint;
use contact_relay_core::delivery::{SendError, SendReceipt};
use contact_relay_core::email::OutboundEmail;
use serde_json::{json, Value};

use crate::logging::log_info;

pub trait EmailSender {
    fn send(&self, email: &OutboundEmail) -> Result<SendReceipt, SendError>;
}

/// Logs a summary of the rendered email instead of sending it; used for local
/// invocations.
pub struct DryRunSender;

impl EmailSender for DryRunSender {
    fn send(&self, email: &OutboundEmail) -> Result<SendReceipt, SendError> {
        log_info("dry_run_sender", "email_rendered", dry_run_details(email));
        Ok(SendReceipt::default())
    }
}

// Bodies and the reply-to address carry submitter text; only sizes and the
// fingerprint are logged.
fn dry_run_details(email: &OutboundEmail) -> Value {
    json!({
        "to": email.to.clone(),
        "subject": email.subject.clone(),
        "submission": submission_fingerprint(&email.reply_to),
        "text_body_bytes": email.text_body.len(),
        "html_body_bytes": email.html_body.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered_email() -> OutboundEmail {
        OutboundEmail {
            from: "noreply@example.com".to_string(),
            to: "owner@example.com".to_string(),
            reply_to: "ada@example.com".to_string(),
            subject: "Portfolio Contact: Message from Ada".to_string(),
            text_body: "Name: Ada\nEmail: ada@example.com\n\nMessage:\nMy private project details".to_string(),
            html_body: "<p>My private project details</p>".to_string(),
        }
    }

    #[test]
    fn dry_run_log_omits_message_and_reply_address() {
        let email = rendered_email();
        let details = dry_run_details(&email).to_string();

        assert!(!details.contains("private project"));
        assert!(!details.contains("ada@example.com"));
        assert!(details.contains("Portfolio Contact: Message from Ada"));
        assert!(details.contains(&submission_fingerprint("ada@example.com")));
    }

    #[test]
    fn dry_run_send_succeeds_without_message_id() {
        let receipt = DryRunSender
            .send(&rendered_email())
            .expect("dry run should succeed");
        assert_eq!(receipt, SendReceipt::default());
    }
}
