use aws_sdk_sesv2::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use contact_relay_core::config::ContactConfig;
use contact_relay_core::delivery::{SendError, SendReceipt};
use contact_relay_core::email::OutboundEmail;
use contact_relay_lambda::adapters::email_sender::EmailSender;
use contact_relay_lambda::handlers::contact::{handle_contact_event, ApiGatewayResponse};
use contact_relay_lambda::logging::log_error;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::{json, Value};

const CHARSET: &str = "UTF-8";

struct SesEmailSender {
    ses_client: aws_sdk_sesv2::Client,
}

impl EmailSender for SesEmailSender {
    fn send(&self, email: &OutboundEmail) -> Result<SendReceipt, SendError> {
        let content = build_email_content(email)?;
        let client = self.ses_client.clone();
        let from = email.from.clone();
        let to = email.to.clone();
        let reply_to = email.reply_to.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .send_email()
                    .from_email_address(from)
                    .destination(Destination::builder().to_addresses(to).build())
                    .reply_to_addresses(reply_to)
                    .content(content)
                    .send()
                    .await
                    .map(|output| SendReceipt {
                        message_id: output.message_id().map(str::to_string),
                    })
                    .map_err(|error| {
                        let code = error
                            .as_service_error()
                            .and_then(|service_error| service_error.code())
                            .map(str::to_string);
                        SendError::from_service_code(
                            code.as_deref(),
                            format!("failed to send email via ses: {}", DisplayErrorContext(&error)),
                        )
                    })
            })
        })
    }
}

fn build_email_content(email: &OutboundEmail) -> Result<EmailContent, SendError> {
    let utf8 = |data: &str| {
        Content::builder()
            .data(data)
            .charset(CHARSET)
            .build()
            .map_err(|error| SendError::Transport(format!("failed to build email content: {error}")))
    };

    let message = Message::builder()
        .subject(utf8(&email.subject)?)
        .body(
            Body::builder()
                .text(utf8(&email.text_body)?)
                .html(utf8(&email.html_body)?)
                .build(),
        )
        .build();

    Ok(EmailContent::builder().simple(message).build())
}

struct RuntimeDependencies {
    config: ContactConfig,
    sender: SesEmailSender,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<ApiGatewayResponse, Error> {
    Ok(handle_contact_event(event.payload, &deps.config, &deps.sender))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = ContactConfig::from_env();
    if let Err(error) = &config.routing {
        log_error(
            "contact_runtime",
            "config_missing",
            json!({"message": error.to_string()}),
        );
    }

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()))
        .load()
        .await;
    let deps = RuntimeDependencies {
        sender: SesEmailSender {
            ses_client: aws_sdk_sesv2::Client::new(&aws_config),
        },
        config,
    };

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, deps).await
    }))
    .await
}
