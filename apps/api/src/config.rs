use thiserror::Error;

/// Model used when `GROQ_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required environment variable '{0}' is not set")]
    Missing(&'static str),

    #[error("Environment variable '{key}' is invalid: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Application configuration loaded from environment variables.
/// Fails at startup if the generation service credential is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub groq_model: String,
    pub llm_timeout_secs: u64,
    pub cors_allow_origin: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            groq_api_key: optional("GROQ_API_KEY").ok_or(ConfigError::Missing("GROQ_API_KEY"))?,
            groq_model: optional("GROQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            llm_timeout_secs: parse_or(
                "LLM_TIMEOUT_SECS",
                optional("LLM_TIMEOUT_SECS"),
                DEFAULT_LLM_TIMEOUT_SECS,
            )?,
            cors_allow_origin: optional("CORS_ALLOW_ORIGIN")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            port: parse_or("PORT", optional("PORT"), DEFAULT_PORT)?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GROQ_API_KEY")));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let err = Config::from_lookup(lookup_from(&[("GROQ_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&[("GROQ_API_KEY", "gsk_test")])).unwrap();
        assert_eq!(config.groq_api_key, "gsk_test");
        assert_eq!(config.groq_model, DEFAULT_MODEL);
        assert_eq!(config.llm_timeout_secs, 120);
        assert_eq!(config.port, 8000);
        assert_eq!(config.cors_allow_origin, "http://localhost:3000");
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_model_override() {
        let config = Config::from_lookup(lookup_from(&[
            ("GROQ_API_KEY", "gsk_test"),
            ("GROQ_MODEL", "llama-3.1-8b-instant"),
        ]))
        .unwrap();
        assert_eq!(config.groq_model, "llama-3.1-8b-instant");
    }

    #[test]
    fn test_invalid_port_names_variable() {
        let err = Config::from_lookup(lookup_from(&[
            ("GROQ_API_KEY", "gsk_test"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        match err {
            ConfigError::Invalid { key, .. } => assert_eq!(key, "PORT"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
