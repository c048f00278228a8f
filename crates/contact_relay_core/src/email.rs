use crate::config::EmailRouting;
use crate::contract::ContactSubmission;

pub const SUBJECT_PREFIX: &str = "Portfolio Contact: Message from";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    /// The submitter, so the owner can answer with a plain reply.
    pub reply_to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

pub fn render_email(submission: &ContactSubmission, routing: &EmailRouting) -> OutboundEmail {
    OutboundEmail {
        from: routing.sender.clone(),
        to: routing.receiver.clone(),
        reply_to: submission.email().to_string(),
        subject: format!("{SUBJECT_PREFIX} {}", submission.name()),
        text_body: render_text(submission),
        html_body: render_html(submission),
    }
}

fn render_text(submission: &ContactSubmission) -> String {
    format!(
        "New contact form submission:\n\
         \n\
         Name: {name}\n\
         Email: {email}\n\
         Message:\n\
         {message}\n\
         \n\
         ---\n\
         This message was sent via the portfolio contact form.\n\
         You can reply directly to this email to respond to {name}.",
        name = submission.name(),
        email = submission.email(),
        message = submission.message(),
    )
}

fn render_html(submission: &ContactSubmission) -> String {
    let name = escape_html(submission.name());
    let email = escape_html(submission.email());
    let message = escape_html(submission.message()).replace('\n', "<br>");

    format!(
        r#"<h2>New Contact Form Submission</h2>
<p><strong>Name:</strong> {name}</p>
<p><strong>Email:</strong> <a href="mailto:{email}">{email}</a></p>
<p><strong>Message:</strong></p>
<div style="background-color: #f5f5f5; padding: 15px; border-left: 4px solid #007bff; margin: 10px 0;">
{message}
</div>
<hr>
<p style="color: #666; font-size: 12px;">
This message was sent via the portfolio contact form.<br>
You can reply directly to this email to respond to {name}.
</p>"#
    )
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ContactRequest;
    use crate::validate::validate_request;

    fn routing() -> EmailRouting {
        EmailRouting {
            sender: "noreply@portfolio.example".to_string(),
            receiver: "me@portfolio.example".to_string(),
        }
    }

    fn submission(message: &str) -> ContactSubmission {
        validate_request(ContactRequest {
            name: "Ada & Co".to_string(),
            email: "ada@example.com".to_string(),
            message: message.to_string(),
        })
        .expect("fixture should validate")
    }

    #[test]
    fn routes_reply_to_the_submitter() {
        let email = render_email(&submission("Hello there, nice work!"), &routing());
        assert_eq!(email.from, "noreply@portfolio.example");
        assert_eq!(email.to, "me@portfolio.example");
        assert_eq!(email.reply_to, "ada@example.com");
        assert_eq!(email.subject, "Portfolio Contact: Message from Ada & Co");
    }

    #[test]
    fn text_body_carries_raw_values() {
        let email = render_email(&submission("Line one\nLine two"), &routing());
        assert!(email.text_body.contains("Name: Ada & Co\n"));
        assert!(email.text_body.contains("Message:\nLine one\nLine two\n"));
        assert!(email
            .text_body
            .ends_with("You can reply directly to this email to respond to Ada & Co."));
    }

    #[test]
    fn html_body_escapes_values_and_keeps_line_breaks() {
        let email = render_email(&submission("if a < b then \"yes\"\nbye"), &routing());
        assert!(email.html_body.contains("<strong>Name:</strong> Ada &amp; Co</p>"));
        assert!(email
            .html_body
            .contains("if a &lt; b then &quot;yes&quot;<br>bye"));
        assert!(email
            .html_body
            .contains("<a href=\"mailto:ada@example.com\">ada@example.com</a>"));
    }
}
