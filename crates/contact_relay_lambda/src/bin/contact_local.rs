//! Runs the contact handler once against an API Gateway event read from
//! stdin, rendering the email instead of sending it.

use std::io::Read;

use contact_relay_core::config::ContactConfig;
use contact_relay_lambda::adapters::email_sender::DryRunSender;
use contact_relay_lambda::handlers::contact::handle_contact_event;
use serde_json::Value;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let event: Value = serde_json::from_str(&input)?;

    let config = ContactConfig::from_env();
    let response = handle_contact_event(event, &config, &DryRunSender);

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
