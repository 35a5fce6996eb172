//! Environment configuration for the refresh run.

use std::time::Duration;

use thiserror::Error;

use appointly_core::{BearerToken, Label};

pub const DEFAULT_API_URL: &str = "http://backend:8000";
pub const DEFAULT_REDIS_URL: &str = "redis://redis:6379";
pub const DEFAULT_LABELS: &str = "daily";
pub const DEFAULT_CONCURRENCY: usize = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("REFRESH_LABELS contains no labels")]
    NoLabels,
}

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub api_url: String,
    pub redis_url: String,
    pub token: Option<BearerToken>,
    pub labels: Vec<Label>,
    pub concurrency: usize,
    pub request_timeout: Duration,
}

impl RefreshConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    ///
    /// Blank values count as unset. `JWT_TOKEN` may be absent; the run only
    /// fails on it once a label actually needs a backend call.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = get("API_URL").unwrap_or_else(|| {
            tracing::debug!("API_URL not set; using {DEFAULT_API_URL}");
            DEFAULT_API_URL.to_string()
        });
        let redis_url = get("REDIS_URL").unwrap_or_else(|| {
            tracing::debug!("REDIS_URL not set; using {DEFAULT_REDIS_URL}");
            DEFAULT_REDIS_URL.to_string()
        });

        let labels = Label::parse_list(&get("REFRESH_LABELS").unwrap_or_else(|| DEFAULT_LABELS.to_string()));
        if labels.is_empty() {
            return Err(ConfigError::NoLabels);
        }

        let concurrency = match get("REFRESH_CONCURRENCY") {
            Some(raw) => positive("REFRESH_CONCURRENCY", &raw)? as usize,
            None => DEFAULT_CONCURRENCY,
        };
        let timeout_secs = match get("REFRESH_TIMEOUT_SECS") {
            Some(raw) => positive("REFRESH_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            redis_url,
            token: BearerToken::from_optional(lookup("JWT_TOKEN")),
            labels,
            concurrency,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<RefreshConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RefreshConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_match_the_deployment() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.api_url, "http://backend:8000");
        assert_eq!(cfg.redis_url, "redis://redis:6379");
        assert_eq!(cfg.labels, vec![Label::new("daily")]);
        assert_eq!(cfg.concurrency, 3);
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
        assert!(cfg.token.is_none());
    }

    #[test]
    fn overrides_are_read() {
        let cfg = config(&[
            ("API_URL", "http://localhost:8000"),
            ("JWT_TOKEN", "abc"),
            ("REFRESH_LABELS", "daily, weekly"),
            ("REFRESH_CONCURRENCY", "5"),
            ("REFRESH_TIMEOUT_SECS", "2"),
        ])
        .unwrap();
        assert_eq!(cfg.api_url, "http://localhost:8000");
        assert_eq!(cfg.token.as_ref().map(|t| t.expose()), Some("abc"));
        assert_eq!(cfg.labels, vec![Label::new("daily"), Label::new("weekly")]);
        assert_eq!(cfg.concurrency, 5);
        assert_eq!(cfg.request_timeout, Duration::from_secs(2));
    }

    #[test]
    fn blank_token_is_absent() {
        assert!(config(&[("JWT_TOKEN", "  ")]).unwrap().token.is_none());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = config(&[("REFRESH_CONCURRENCY", "0")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                var: "REFRESH_CONCURRENCY",
                value: "0".into()
            }
        );
        assert!(config(&[("REFRESH_TIMEOUT_SECS", "soon")]).is_err());
    }

    #[test]
    fn label_list_of_only_commas_is_rejected() {
        assert_eq!(config(&[("REFRESH_LABELS", ", ,")]).unwrap_err(), ConfigError::NoLabels);
    }
}
