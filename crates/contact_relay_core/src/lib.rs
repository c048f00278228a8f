//! Shared contact relay domain primitives.
//!
//! This crate owns request contracts, sanitization, validation, spam screening
//! and email rendering. It intentionally excludes AWS SDK and Lambda runtime
//! concerns; those live in `contact_relay_lambda`.

pub mod config;
pub mod contract;
pub mod delivery;
pub mod email;
pub mod sanitize;
pub mod spam;
pub mod validate;
