//! Configuration, built from environment variables.
//!
//! `main` loads a `.env` file (if any) before calling [`IntakeConfig::from_env`].

use std::str::FromStr;

use secrecy::SecretString;

use crate::classifier::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::error::ConfigError;
use crate::intake::RetryPolicy;
use crate::llm::{LlmBackend, LlmConfig};
use crate::submission::RegistrationApiConfig;
use crate::vocabulary::DrillDefaults;

/// Port the web front end binds when `INTAKE_HTTP_PORT` is unset.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Everything the binary needs to wire up a flow controller.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub llm: LlmConfig,
    pub temperature: f32,
    pub max_tokens: u32,
    pub api: RegistrationApiConfig,
    pub defaults: DrillDefaults,
    pub retry: RetryPolicy,
    pub http_port: u16,
}

impl IntakeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("INTAKE_LLM_BACKEND") {
            Some(raw) => raw.parse::<LlmBackend>()?,
            None => LlmBackend::Anthropic,
        };
        let api_key = get(backend.api_key_var())
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(backend.api_key_var().to_string()))?;
        let model = get("INTAKE_LLM_MODEL").unwrap_or_else(|| backend.default_model().to_string());

        let temperature = parse_or(&get, "INTAKE_LLM_TEMPERATURE", DEFAULT_TEMPERATURE)?;
        let max_tokens = parse_or(&get, "INTAKE_LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS)?;
        let http_port = parse_or(&get, "INTAKE_HTTP_PORT", DEFAULT_HTTP_PORT)?;

        // 0 or unset: re-ask forever.
        let retry = match parse_or(&get, "INTAKE_MAX_ATTEMPTS", 0u32)? {
            0 => RetryPolicy::Unbounded,
            n => RetryPolicy::Bounded(n),
        };

        let fallback = DrillDefaults::default();
        let defaults = DrillDefaults {
            timezone: get("DRILL_TIMEZONE").unwrap_or(fallback.timezone),
            partner_id: get("DRILL_PARTNER_ID").unwrap_or(fallback.partner_id),
            partner_name: get("DRILL_PARTNER_NAME").unwrap_or(fallback.partner_name),
        };

        Ok(Self {
            llm: LlmConfig {
                backend,
                api_key,
                model,
            },
            temperature,
            max_tokens,
            api: RegistrationApiConfig::from_lookup(&lookup)?,
            defaults,
            retry,
            http_port,
        })
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("could not parse '{raw}'"),
        }),
        None => Ok(default),
    }
}
