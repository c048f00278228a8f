use std::sync::LazyLock;

use regex::Regex;
use serde_json::error::Category;

use crate::contract::{
    ContactRequest, ContactSubmission, FieldError, EMAIL_MAX_CHARS, MESSAGE_MAX_CHARS,
    MESSAGE_MIN_CHARS, NAME_MAX_CHARS, NAME_MIN_CHARS,
};
use crate::sanitize::{sanitize_message, sanitize_single_line};

static EMAIL_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[^\s@<>()\[\],;:"]+@[^\s@<>()\[\],;:"]+\.[^\s@<>()\[\],;:"]+$"#)
        .expect("email pattern should compile")
});

/// Failure to turn a raw request body into a [`ContactRequest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("request body is required")]
    MissingBody,
    #[error("request body is base64 encoded")]
    EncodedBody,
    #[error("malformed JSON body: {0}")]
    MalformedJson(String),
    #[error("invalid request payload: {0}")]
    InvalidShape(String),
}

impl RequestError {
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingBody => "Request body is required",
            Self::EncodedBody => "Request body must be UTF-8 JSON text",
            Self::MalformedJson(_) => "Invalid JSON in request body",
            Self::InvalidShape(_) => "Invalid request payload",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid contact submission: {}", field_names(.fields))]
pub struct ValidationError {
    fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn fields(&self) -> &[FieldError] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<FieldError> {
        self.fields
    }
}

fn field_names(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|error| error.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn parse_request(body: &str) -> Result<ContactRequest, RequestError> {
    if body.trim().is_empty() {
        return Err(RequestError::MissingBody);
    }

    serde_json::from_str::<ContactRequest>(body).map_err(|error| match error.classify() {
        Category::Syntax | Category::Eof | Category::Io => {
            RequestError::MalformedJson(error.to_string())
        }
        Category::Data => RequestError::InvalidShape(error.to_string()),
    })
}

/// Sanitizes every field and checks it against the submission constraints.
///
/// All failing fields are reported together so the form can highlight each
/// of them at once.
pub fn validate_request(request: ContactRequest) -> Result<ContactSubmission, ValidationError> {
    let mut fields = Vec::new();

    let name = sanitize_single_line(&request.name);
    let name_chars = name.chars().count();
    if name_chars == 0 {
        fields.push(FieldError::new("name", "Name is required"));
    } else if name_chars < NAME_MIN_CHARS {
        fields.push(FieldError::new(
            "name",
            format!("Name must be at least {NAME_MIN_CHARS} characters"),
        ));
    } else if name_chars > NAME_MAX_CHARS {
        fields.push(FieldError::new(
            "name",
            format!("Name must be at most {NAME_MAX_CHARS} characters"),
        ));
    }

    let email = request.email.trim().to_string();
    if email.is_empty() {
        fields.push(FieldError::new("email", "Email is required"));
    } else if email.chars().count() > EMAIL_MAX_CHARS {
        fields.push(FieldError::new(
            "email",
            format!("Email must be at most {EMAIL_MAX_CHARS} characters"),
        ));
    } else if !is_valid_email(&email) {
        fields.push(FieldError::new("email", "Valid email is required"));
    }

    let message = sanitize_message(&request.message);
    let message_chars = message.chars().count();
    if message_chars == 0 {
        fields.push(FieldError::new("message", "Message is required"));
    } else if message_chars < MESSAGE_MIN_CHARS {
        fields.push(FieldError::new(
            "message",
            format!("Message must be at least {MESSAGE_MIN_CHARS} characters"),
        ));
    } else if message_chars > MESSAGE_MAX_CHARS {
        fields.push(FieldError::new(
            "message",
            format!("Message too long (max {MESSAGE_MAX_CHARS} characters)"),
        ));
    }

    if !fields.is_empty() {
        return Err(ValidationError { fields });
    }

    Ok(ContactSubmission::new(name, email, message))
}

pub fn is_valid_email(candidate: &str) -> bool {
    candidate.chars().count() <= EMAIL_MAX_CHARS
        && !candidate.chars().any(char::is_control)
        && EMAIL_FORMAT.is_match(candidate)
}
