/// Outcome of a successful hand-off to the email service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}

/// Why the email service refused or failed to accept a message.
///
/// The `String` payload is internal detail for logs only; clients see
/// [`SendError::public_message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("message rejected: {0}")]
    Rejected(String),
    #[error("sending paused: {0}")]
    Paused(String),
    #[error("sending throttled: {0}")]
    Throttled(String),
    #[error("sender misconfigured: {0}")]
    Configuration(String),
    #[error("email transport failed: {0}")]
    Transport(String),
}

impl SendError {
    /// Maps an SES error code onto the client-facing failure classes.
    pub fn from_service_code(code: Option<&str>, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match code {
            Some("MessageRejected") => Self::Rejected(detail),
            Some("SendingPausedException" | "AccountSuspendedException") => Self::Paused(detail),
            Some("TooManyRequestsException" | "LimitExceededException" | "Throttling") => {
                Self::Throttled(detail)
            }
            Some("MailFromDomainNotVerifiedException" | "NotFoundException") => {
                Self::Configuration(detail)
            }
            _ => Self::Transport(detail),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Rejected(_) => 400,
            Self::Paused(_) | Self::Throttled(_) => 503,
            Self::Configuration(_) | Self::Transport(_) => 500,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "Email was rejected. Please check your email configuration.",
            Self::Paused(_) | Self::Throttled(_) => {
                "Email service temporarily unavailable. Please try again later."
            }
            Self::Configuration(_) | Self::Transport(_) => {
                "Internal server error. Please try again later."
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "rejected",
            Self::Paused(_) => "paused",
            Self::Throttled(_) => "throttled",
            Self::Configuration(_) => "configuration",
            Self::Transport(_) => "transport",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_service_codes_to_statuses() {
        let cases = [
            (Some("MessageRejected"), 400, "rejected"),
            (Some("SendingPausedException"), 503, "paused"),
            (Some("AccountSuspendedException"), 503, "paused"),
            (Some("TooManyRequestsException"), 503, "throttled"),
            (Some("LimitExceededException"), 503, "throttled"),
            (Some("Throttling"), 503, "throttled"),
            (Some("MailFromDomainNotVerifiedException"), 500, "configuration"),
            (Some("NotFoundException"), 500, "configuration"),
            (Some("InternalFailure"), 500, "transport"),
            (None, 500, "transport"),
        ];

        for (code, status, kind) in cases {
            let error = SendError::from_service_code(code, "detail");
            assert_eq!(error.status_code(), status, "code {code:?}");
            assert_eq!(error.kind(), kind, "code {code:?}");
        }
    }

    #[test]
    fn public_message_hides_internal_detail() {
        let error = SendError::from_service_code(None, "dispatch failure: secret-host:443");
        assert!(!error.public_message().contains("secret-host"));
        assert!(error.to_string().contains("secret-host"));
    }
}
