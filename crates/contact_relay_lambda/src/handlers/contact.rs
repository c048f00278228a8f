use std::collections::BTreeMap;

use contact_relay_core::config::ContactConfig;
use contact_relay_core::contract::{ErrorBody, SuccessBody};
use contact_relay_core::email::render_email;
use contact_relay_core::spam::SpamFilter;
use contact_relay_core::validate::{parse_request, validate_request, RequestError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::adapters::email_sender::EmailSender;
use crate::logging::{log_error, log_info, log_warn};

const COMPONENT: &str = "contact_handler";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// Request attributes read from an API Gateway proxy event (REST or HTTP API).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub method: Option<String>,
    pub origin: Option<String>,
    pub request_id: Option<String>,
}

impl RequestMeta {
    pub fn from_event(event: &Value) -> Self {
        let method = event
            .get("httpMethod")
            .or_else(|| event.pointer("/requestContext/http/method"))
            .and_then(Value::as_str)
            .map(str::to_ascii_uppercase);

        let origin = event
            .get("headers")
            .and_then(Value::as_object)
            .and_then(|headers| {
                headers
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case("origin"))
                    .and_then(|(_, value)| value.as_str())
            })
            .map(str::to_string);

        let request_id = event
            .pointer("/requestContext/requestId")
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            method,
            origin,
            request_id,
        }
    }

    fn is_proxy_event(event: &Value) -> bool {
        event.get("httpMethod").is_some() || event.get("requestContext").is_some()
    }
}

pub fn handle_contact_event(
    event: Value,
    config: &ContactConfig,
    sender: &dyn EmailSender,
) -> ApiGatewayResponse {
    let meta = RequestMeta::from_event(&event);
    let headers = config.cors.headers_for(meta.origin.as_deref());

    match meta.method.as_deref() {
        Some("OPTIONS") => {
            log_info(
                COMPONENT,
                "preflight",
                json!({"request_id": meta.request_id, "origin": meta.origin}),
            );
            return json_response(
                200,
                headers,
                json!({"message": "CORS preflight successful"}),
            );
        }
        Some("POST") | None => {}
        Some(other) => {
            log_warn(
                COMPONENT,
                "method_not_allowed",
                json!({"request_id": meta.request_id, "method": other}),
            );
            let mut headers = headers;
            headers.insert("Allow".to_string(), "POST, OPTIONS".to_string());
            return error_response(405, headers, ErrorBody::new("Method not allowed"));
        }
    }

    let body = match extract_body(&event) {
        Ok(value) => value,
        Err(error) => return request_rejected(&meta, headers, &error),
    };

    log_info(
        COMPONENT,
        "submission_received",
        json!({
            "request_id": meta.request_id,
            "origin": meta.origin,
            "body_bytes": body.len(),
        }),
    );

    let request = match parse_request(&body) {
        Ok(value) => value,
        Err(error) => return request_rejected(&meta, headers, &error),
    };

    let submission = match validate_request(request) {
        Ok(value) => value,
        Err(error) => {
            log_warn(
                COMPONENT,
                "validation_failed",
                json!({"request_id": meta.request_id, "fields": error.fields()}),
            );
            return error_response(
                400,
                headers,
                ErrorBody::new("Invalid contact submission").with_details(error.into_fields()),
            );
        }
    };

    let fingerprint = submission.fingerprint();
    if let Some(verdict) = SpamFilter::standard().check(&submission) {
        log_warn(
            COMPONENT,
            "spam_detected",
            json!({
                "request_id": meta.request_id,
                "submission": fingerprint,
                "rule": verdict.rule,
            }),
        );
        return error_response(400, headers, ErrorBody::new("Message could not be delivered"));
    }

    let routing = match &config.routing {
        Ok(value) => value,
        Err(error) => {
            log_error(
                COMPONENT,
                "config_missing",
                json!({"request_id": meta.request_id, "message": error.to_string()}),
            );
            return error_response(500, headers, ErrorBody::new("Server configuration error"));
        }
    };

    let email = render_email(&submission, routing);
    match sender.send(&email) {
        Ok(receipt) => {
            log_info(
                COMPONENT,
                "email_sent",
                json!({
                    "request_id": meta.request_id,
                    "submission": fingerprint,
                    "receiver": routing.receiver,
                    "message_id": receipt.message_id,
                }),
            );
            json_response(200, headers, SuccessBody::new("Message sent successfully"))
        }
        Err(error) => {
            log_error(
                COMPONENT,
                "email_send_failed",
                json!({
                    "request_id": meta.request_id,
                    "submission": fingerprint,
                    "kind": error.kind(),
                    "message": error.to_string(),
                }),
            );
            error_response(
                error.status_code(),
                headers,
                ErrorBody::new(error.public_message()),
            )
        }
    }
}

/// Pulls the JSON body text out of a proxy event. Events without proxy
/// markers are treated as direct invocations whose payload is the body.
fn extract_body(event: &Value) -> Result<String, RequestError> {
    let Some(object) = event.as_object() else {
        return Err(RequestError::InvalidShape(
            "event must be a JSON object".to_string(),
        ));
    };

    let Some(body) = object.get("body") else {
        if RequestMeta::is_proxy_event(event) {
            return Err(RequestError::MissingBody);
        }
        return Ok(event.to_string());
    };

    if object
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return Err(RequestError::EncodedBody);
    }

    match body {
        Value::Null => Err(RequestError::MissingBody),
        Value::String(text) if text.trim().is_empty() => Err(RequestError::MissingBody),
        Value::String(text) => Ok(text.clone()),
        Value::Object(_) => Ok(body.to_string()),
        _ => Err(RequestError::InvalidShape(
            "request body must be a JSON object".to_string(),
        )),
    }
}

fn request_rejected(
    meta: &RequestMeta,
    headers: BTreeMap<String, String>,
    error: &RequestError,
) -> ApiGatewayResponse {
    log_warn(
        COMPONENT,
        "request_rejected",
        json!({"request_id": meta.request_id, "reason": error.to_string()}),
    );
    error_response(400, headers, ErrorBody::new(error.public_message()))
}

fn json_response(
    status_code: u16,
    headers: BTreeMap<String, String>,
    payload: impl Serialize,
) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers,
        body: serde_json::to_string(&payload).expect("response payload should serialize"),
    }
}

fn error_response(
    status_code: u16,
    headers: BTreeMap<String, String>,
    payload: ErrorBody,
) -> ApiGatewayResponse {
    json_response(status_code, headers, payload)
}
