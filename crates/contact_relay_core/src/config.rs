use std::collections::BTreeMap;

use crate::validate::is_valid_email;

pub const SENDER_EMAIL_KEY: &str = "SENDER_EMAIL";
pub const RECEIVER_EMAIL_KEY: &str = "RECEIVER_EMAIL";
pub const ALLOWED_ORIGINS_KEY: &str = "CORS_ALLOWED_ORIGINS";
pub const REGION_KEY: &str = "AWS_REGION";
pub const DEFAULT_REGION: &str = "eu-west-3";

pub const ALLOWED_HEADERS: &str = "Content-Type, X-Requested-With";
pub const ALLOWED_METHODS: &str = "POST, OPTIONS";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{key} is not a valid email address: '{value}'")]
    InvalidAddress { key: &'static str, value: String },
}

/// Sender and receiver addresses for relayed messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRouting {
    pub sender: String,
    pub receiver: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactConfig {
    /// Kept as a `Result` so a misconfigured deployment still answers CORS
    /// preflights and reports the problem per request.
    pub routing: Result<EmailRouting, ConfigError>,
    pub cors: CorsPolicy,
    pub region: String,
}

impl ContactConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let routing = read_address(&read, SENDER_EMAIL_KEY).and_then(|sender| {
            read_address(&read, RECEIVER_EMAIL_KEY)
                .map(|receiver| EmailRouting { sender, receiver })
        });

        let cors = read(ALLOWED_ORIGINS_KEY)
            .map(|value| CorsPolicy::parse(&value))
            .unwrap_or_default();

        Self {
            routing,
            cors,
            region: read(REGION_KEY).unwrap_or_else(|| DEFAULT_REGION.to_string()),
        }
    }
}

fn read_address(
    read: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    let value = read(key).ok_or(ConfigError::Missing(key))?;
    if !is_valid_email(&value) {
        return Err(ConfigError::InvalidAddress { key, value });
    }
    Ok(value)
}

/// An allowlist entry; at most one `*` wildcard, which matches a non-empty
/// run of host characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginPattern {
    prefix: String,
    suffix: Option<String>,
}

impl OriginPattern {
    pub fn parse(pattern: &str) -> Self {
        let normalized = pattern.trim().trim_end_matches('/').to_ascii_lowercase();
        match normalized.split_once('*') {
            Some((prefix, suffix)) => Self {
                prefix: prefix.to_string(),
                suffix: Some(suffix.to_string()),
            },
            None => Self {
                prefix: normalized,
                suffix: None,
            },
        }
    }

    pub fn matches(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/').to_ascii_lowercase();
        match &self.suffix {
            None => origin == self.prefix,
            Some(suffix) => {
                if origin.len() <= self.prefix.len() + suffix.len()
                    || !origin.starts_with(&self.prefix)
                    || !origin.ends_with(suffix.as_str())
                {
                    return false;
                }
                let middle = &origin[self.prefix.len()..origin.len() - suffix.len()];
                !middle.contains('/') && !middle.contains('*')
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CorsPolicy {
    #[default]
    AnyOrigin,
    AllowList(Vec<OriginPattern>),
}

impl CorsPolicy {
    /// Parses a comma-separated allowlist. A bare `*` entry allows any origin.
    pub fn parse(value: &str) -> Self {
        let entries: Vec<&str> = value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .collect();

        if entries.is_empty() || entries.iter().any(|entry| *entry == "*") {
            return Self::AnyOrigin;
        }

        Self::AllowList(entries.into_iter().map(OriginPattern::parse).collect())
    }

    pub fn allows(&self, origin: &str) -> bool {
        match self {
            Self::AnyOrigin => true,
            Self::AllowList(patterns) => patterns.iter().any(|pattern| pattern.matches(origin)),
        }
    }

    /// Response headers for a request carrying `origin`.
    pub fn headers_for(&self, origin: Option<&str>) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::from([
            (
                "Access-Control-Allow-Headers".to_string(),
                ALLOWED_HEADERS.to_string(),
            ),
            (
                "Access-Control-Allow-Methods".to_string(),
                ALLOWED_METHODS.to_string(),
            ),
            ("Content-Type".to_string(), "application/json".to_string()),
        ]);

        match (self, origin) {
            (Self::AnyOrigin, _) => {
                headers.insert("Access-Control-Allow-Origin".to_string(), "*".to_string());
            }
            (Self::AllowList(_), Some(origin)) if self.allows(origin) => {
                headers.insert(
                    "Access-Control-Allow-Origin".to_string(),
                    origin.to_string(),
                );
                headers.insert("Vary".to_string(), "Origin".to_string());
            }
            (Self::AllowList(_), _) => {
                headers.insert("Vary".to_string(), "Origin".to_string());
            }
        }

        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> ContactConfig {
        let values: BTreeMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ContactConfig::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn reads_routing_and_defaults() {
        let config = config_from(&[
            (SENDER_EMAIL_KEY, "noreply@portfolio.example"),
            (RECEIVER_EMAIL_KEY, " me@portfolio.example "),
        ]);

        assert_eq!(
            config.routing,
            Ok(EmailRouting {
                sender: "noreply@portfolio.example".to_string(),
                receiver: "me@portfolio.example".to_string(),
            })
        );
        assert_eq!(config.cors, CorsPolicy::AnyOrigin);
        assert_eq!(config.region, DEFAULT_REGION);
    }

    #[test]
    fn missing_or_blank_addresses_are_reported() {
        let config = config_from(&[(SENDER_EMAIL_KEY, "noreply@portfolio.example")]);
        assert_eq!(config.routing, Err(ConfigError::Missing(RECEIVER_EMAIL_KEY)));

        let config = config_from(&[(SENDER_EMAIL_KEY, "  "), (RECEIVER_EMAIL_KEY, "me@x.io")]);
        assert_eq!(config.routing, Err(ConfigError::Missing(SENDER_EMAIL_KEY)));
    }

    #[test]
    fn malformed_addresses_are_reported() {
        let config = config_from(&[
            (SENDER_EMAIL_KEY, "noreply"),
            (RECEIVER_EMAIL_KEY, "me@portfolio.example"),
        ]);
        assert_eq!(
            config.routing,
            Err(ConfigError::InvalidAddress {
                key: SENDER_EMAIL_KEY,
                value: "noreply".to_string(),
            })
        );
    }

    #[test]
    fn wildcard_origins_match_a_single_host_label_run() {
        let pattern = OriginPattern::parse("https://*.github.io");
        assert!(pattern.matches("https://ada.github.io"));
        assert!(pattern.matches("HTTPS://Ada.GitHub.io/"));
        assert!(!pattern.matches("https://.github.io"));
        assert!(!pattern.matches("https://evil.example/x.github.io"));
        assert!(!pattern.matches("http://ada.github.io"));
    }

    #[test]
    fn allowlist_echoes_matching_origin() {
        let policy = CorsPolicy::parse("http://localhost:5173, https://*.github.io");
        let headers = policy.headers_for(Some("https://ada.github.io"));
        assert_eq!(
            headers.get("Access-Control-Allow-Origin").map(String::as_str),
            Some("https://ada.github.io")
        );
        assert_eq!(headers.get("Vary").map(String::as_str), Some("Origin"));
    }

    #[test]
    fn allowlist_omits_allow_origin_for_unknown_origin() {
        let policy = CorsPolicy::parse("http://localhost:5173");
        let headers = policy.headers_for(Some("https://attacker.example"));
        assert!(!headers.contains_key("Access-Control-Allow-Origin"));
        assert_eq!(
            headers.get("Access-Control-Allow-Methods").map(String::as_str),
            Some(ALLOWED_METHODS)
        );
    }

    #[test]
    fn star_entry_allows_any_origin() {
        let policy = CorsPolicy::parse("https://a.example, *");
        assert_eq!(policy, CorsPolicy::AnyOrigin);
        let headers = policy.headers_for(None);
        assert_eq!(
            headers.get("Access-Control-Allow-Origin").map(String::as_str),
            Some("*")
        );
    }
}
