//! AWS-oriented adapters and handlers for the portfolio contact endpoint.
//!
//! This crate owns runtime integration details (API Gateway event handling,
//! the email sending seam, and structured logging). Validation, spam screening
//! and email rendering live in `contact_relay_core`.

pub mod adapters;
pub mod handlers;
pub mod logging;
