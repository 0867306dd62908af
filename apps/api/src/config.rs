use anyhow::{Context, Result};

use crate::ai_client::{DEFAULT_GATEWAY_URL, DEFAULT_MODEL};
use crate::layout::fit::DEFAULT_MIN_SCALE;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub ai_gateway_api_key: String,
    pub ai_gateway_url: String,
    pub ai_model: String,
    /// Drafts and the application log live in process memory when unset.
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub fit_min_scale: f32,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            ai_gateway_api_key: require_env(&lookup, "AI_GATEWAY_API_KEY")?,
            ai_gateway_url: optional("AI_GATEWAY_URL")
                .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()),
            ai_model: optional("AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            redis_url: optional("REDIS_URL"),
            port: optional("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            fit_min_scale: match optional("FIT_MIN_SCALE") {
                Some(v) => v
                    .parse::<f32>()
                    .context("FIT_MIN_SCALE must be a number")?,
                None => DEFAULT_MIN_SCALE,
            },
            max_upload_bytes: match optional("MAX_UPLOAD_BYTES") {
                Some(v) => v
                    .parse::<usize>()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
            },
        })
    }
}

fn require_env(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_optional_vars_missing() {
        let config = Config::from_lookup(make_env(&[("AI_GATEWAY_API_KEY", "k")])).unwrap();
        assert_eq!(config.ai_gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.ai_model, DEFAULT_MODEL);
        assert_eq!(config.redis_url, None);
        assert_eq!(config.port, 8080);
        assert_eq!(config.fit_min_scale, DEFAULT_MIN_SCALE);
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_missing_api_key_fails() {
        let err = Config::from_lookup(make_env(&[])).unwrap_err();
        assert!(err.to_string().contains("AI_GATEWAY_API_KEY"));
    }

    #[test]
    fn test_blank_redis_url_means_memory_storage() {
        let config = Config::from_lookup(make_env(&[
            ("AI_GATEWAY_API_KEY", "k"),
            ("REDIS_URL", " "),
            ("FIT_MIN_SCALE", "0.75"),
        ]))
        .unwrap();
        assert_eq!(config.redis_url, None);
        assert_eq!(config.fit_min_scale, 0.75);
    }

    #[test]
    fn test_bad_port_fails() {
        assert!(Config::from_lookup(make_env(&[
            ("AI_GATEWAY_API_KEY", "k"),
            ("PORT", "eighty")
        ]))
        .is_err());
    }
}
