//! HTTP client for the drill registration API.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::error::{ConfigError, SubmissionError};

use super::payload::DrillPayload;

/// Response field carrying the new drill's URL slug.
pub const SLUG_FIELD: &str = "drillCustUrl";

/// Creates drills on the remote registration system.
#[async_trait]
pub trait RegistrationApi: Send + Sync {
    /// POST the payload once and return the slug of the created drill.
    async fn create_drill(&self, payload: &DrillPayload) -> Result<String, SubmissionError>;
}

/// Registration API connection settings.
#[derive(Debug, Clone)]
pub struct RegistrationApiConfig {
    pub endpoint: String,
    /// Host the public `/drills/<slug>` link is built on.
    pub public_base_url: String,
    /// Optional static bearer credential.
    pub api_token: Option<SecretString>,
    pub timeout: Duration,
}

impl Default for RegistrationApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api-dev.whereuelevate.com/internity/api/v1/drills".to_string(),
            public_base_url: "https://dev.whereuelevate.com".to_string(),
            api_token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl RegistrationApiConfig {
    /// Read `DRILL_API_*` / `DRILL_PUBLIC_BASE_URL` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let endpoint = lookup("DRILL_API_ENDPOINT").unwrap_or(defaults.endpoint);
        let public_base_url = lookup("DRILL_PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url);
        let api_token = lookup("DRILL_API_TOKEN")
            .filter(|s| !s.trim().is_empty())
            .map(SecretString::from);

        let timeout = match lookup("DRILL_API_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "DRILL_API_TIMEOUT_SECS".to_string(),
                    message: format!("'{raw}' is not a number of seconds"),
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.timeout,
        };

        Ok(Self {
            endpoint,
            public_base_url,
            api_token,
            timeout,
        })
    }

    /// Public page for a created drill.
    pub fn drill_link(&self, slug: &str) -> String {
        format!("{}/drills/{}", self.public_base_url.trim_end_matches('/'), slug)
    }
}

/// `RegistrationApi` over reqwest.
pub struct HttpRegistrationApi {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<SecretString>,
}

impl HttpRegistrationApi {
    pub fn new(config: &RegistrationApiConfig) -> Result<Self, SubmissionError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SubmissionError::Transport(format!("failed to build client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
        })
    }
}

#[async_trait]
impl RegistrationApi for HttpRegistrationApi {
    async fn create_drill(&self, payload: &DrillPayload) -> Result<String, SubmissionError> {
        let mut request = self.client.post(&self.endpoint).json(payload);
        if let Some(ref token) = self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let resp = request
            .send()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Registration API rejected drill");
            return Err(SubmissionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| SubmissionError::MalformedBody(e.to_string()))?;

        let slug = extract_slug(&body)?;
        info!(slug = %slug, "Drill created");
        Ok(slug)
    }
}

/// Pull the non-empty slug out of a success body.
pub fn extract_slug(body: &serde_json::Value) -> Result<String, SubmissionError> {
    body.get(SLUG_FIELD)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(SubmissionError::MissingSlug)
}
