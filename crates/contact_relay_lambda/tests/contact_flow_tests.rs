use std::sync::Mutex;

use contact_relay_core::config::ContactConfig;
use contact_relay_core::delivery::{SendError, SendReceipt};
use contact_relay_core::email::OutboundEmail;
use contact_relay_lambda::adapters::email_sender::EmailSender;
use contact_relay_lambda::handlers::contact::{handle_contact_event, ApiGatewayResponse};
use serde_json::{json, Value};

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingSender {
    fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("poisoned mutex").clone()
    }
}

impl EmailSender for RecordingSender {
    fn send(&self, email: &OutboundEmail) -> Result<SendReceipt, SendError> {
        self.sent.lock().expect("poisoned mutex").push(email.clone());
        Ok(SendReceipt {
            message_id: Some("0100018f-test".to_string()),
        })
    }
}

fn deployed_config() -> ContactConfig {
    ContactConfig::from_lookup(|key| match key {
        "SENDER_EMAIL" => Some("noreply@portfolio.example".to_string()),
        "RECEIVER_EMAIL" => Some("owner@portfolio.example".to_string()),
        "CORS_ALLOWED_ORIGINS" => {
            Some("http://localhost:5173,http://localhost:3000,https://*.github.io".to_string())
        }
        _ => None,
    })
}

fn rest_proxy_event(method: &str, origin: &str, body: Option<&str>) -> Value {
    json!({
        "resource": "/contact",
        "path": "/contact",
        "httpMethod": method,
        "headers": {
            "content-type": "application/json",
            "origin": origin
        },
        "requestContext": {
            "requestId": "c6af9ac6-7b61-11e6-9a41-93e8deadbeef",
            "stage": "prod"
        },
        "body": body,
        "isBase64Encoded": false
    })
}

fn parse_body(response: &ApiGatewayResponse) -> Value {
    serde_json::from_str(&response.body).expect("response body should be JSON")
}

#[test]
fn browser_flow_preflight_then_post() {
    let config = deployed_config();
    let sender = RecordingSender::default();
    let origin = "https://portfolio-owner.github.io";

    let preflight = handle_contact_event(rest_proxy_event("OPTIONS", origin, None), &config, &sender);
    assert_eq!(preflight.status_code, 200);
    assert_eq!(
        preflight
            .headers
            .get("Access-Control-Allow-Origin")
            .map(String::as_str),
        Some(origin)
    );

    let body = json!({
        "name": "Katherine Johnson",
        "email": "katherine@example.com",
        "message": "Hello!\n\nI enjoyed your projects section. Are you open to consulting work?"
    })
    .to_string();
    let response = handle_contact_event(
        rest_proxy_event("POST", origin, Some(&body)),
        &config,
        &sender,
    );

    assert_eq!(response.status_code, 200);
    assert_eq!(parse_body(&response)["success"], true);
    assert_eq!(
        response
            .headers
            .get("Access-Control-Allow-Origin")
            .map(String::as_str),
        Some(origin)
    );

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, "noreply@portfolio.example");
    assert_eq!(sent[0].to, "owner@portfolio.example");
    assert_eq!(sent[0].reply_to, "katherine@example.com");
    assert!(sent[0]
        .html_body
        .contains("Hello!<br><br>I enjoyed your projects section."));
}

#[test]
fn hostile_markup_is_stripped_before_relay() {
    let config = deployed_config();
    let sender = RecordingSender::default();
    let body = json!({
        "name": "<img src=x onerror=alert(1)>Mallory",
        "email": "mallory@example.com",
        "message": "Nice site <script>document.location='https://evil.example'</script><a href=\"javascript:steal()\">see this</a> thanks"
    })
    .to_string();

    let response = handle_contact_event(
        rest_proxy_event("POST", "http://localhost:5173", Some(&body)),
        &config,
        &sender,
    );

    assert_eq!(response.status_code, 200);
    let sent = sender.sent();
    assert_eq!(sent[0].subject, "Portfolio Contact: Message from Mallory");
    assert!(sent[0].text_body.contains("Nice site see this thanks"));
    assert!(!sent[0].html_body.contains("<script"));
    assert!(!sent[0].html_body.contains("javascript:"));
}

#[test]
fn unknown_origin_gets_no_allow_origin_header() {
    let config = deployed_config();
    let sender = RecordingSender::default();

    let response = handle_contact_event(
        rest_proxy_event("OPTIONS", "https://attacker.example", None),
        &config,
        &sender,
    );

    assert!(!response.headers.contains_key("Access-Control-Allow-Origin"));
}

#[test]
fn extra_fields_are_rejected() {
    let config = deployed_config();
    let sender = RecordingSender::default();
    let body = json!({
        "name": "Ada",
        "email": "ada@example.com",
        "message": "Long enough message body",
        "admin": true
    })
    .to_string();

    let response = handle_contact_event(
        rest_proxy_event("POST", "http://localhost:3000", Some(&body)),
        &config,
        &sender,
    );

    assert_eq!(response.status_code, 400);
    assert_eq!(parse_body(&response)["error"], "Invalid request payload");
    assert!(sender.sent().is_empty());
}

#[test]
fn link_flood_is_treated_as_spam() {
    let config = deployed_config();
    let sender = RecordingSender::default();
    let body = json!({
        "name": "Links",
        "email": "links@example.com",
        "message": "https://a.example https://b.example https://c.example https://d.example"
    })
    .to_string();

    let response = handle_contact_event(
        rest_proxy_event("POST", "http://localhost:3000", Some(&body)),
        &config,
        &sender,
    );

    assert_eq!(response.status_code, 400);
    assert_eq!(parse_body(&response)["error"], "Message could not be delivered");
    assert!(sender.sent().is_empty());
}
