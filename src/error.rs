//! Error types for the drill intake flow.

/// Errors a front end can hit while driving a conversation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Failures while building or posting a drill registration.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Registration record is missing {0}")]
    IncompleteRecord(&'static str),

    #[error("Invalid registration start date '{0}'")]
    InvalidStartDate(String),

    #[error("Description generation failed: {0}")]
    Description(#[from] LlmError),

    #[error("Registration API request failed: {0}")]
    Transport(String),

    #[error("Registration API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Registration API response is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("API response does not contain 'drillCustUrl'.")]
    MissingSlug,

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Misuse of the conversation state machine.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Registration has not been started")]
    NotStarted,

    #[error("Registration already started")]
    AlreadyStarted,

    #[error("Registration is already complete")]
    AlreadyCompleted,

    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}
