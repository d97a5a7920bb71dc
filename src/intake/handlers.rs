//! Per-question answer handlers.
//!
//! Each handler reads the raw answer and the record accumulated so far and
//! returns a new record with its field set, or a rejection that asks the user
//! to answer the same question again. The input record is never mutated.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, info};

use crate::classifier::ClassifierGateway;
use crate::error::LlmError;

use super::model::{DrillType, RegistrationRecord};
use super::questions::QuestionKey;

/// `DD-MM-YYYY` with day 01-31 and month 01-12. No calendar check.
static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0[1-9]|[12][0-9]|3[01])-(0[1-9]|1[0-2])-\d{4}$")
        .unwrap_or_else(|e| panic!("date pattern is a valid regex: {e}"))
});

/// Answer refused; re-ask the same question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub message: String,
}

impl Rejection {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Why an answer did not produce an updated record.
#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("{0}")]
    Rejected(Rejection),

    #[error("Language model unavailable: {0}")]
    Llm(#[from] LlmError),
}

/// Strict `DD-MM-YYYY` format check.
pub fn validate_date(input: &str) -> bool {
    DATE_PATTERN.is_match(input)
}

/// Dispatches answers to the handler for their question.
pub struct AnswerHandlers {
    gateway: Arc<ClassifierGateway>,
}

impl AnswerHandlers {
    pub fn new(gateway: Arc<ClassifierGateway>) -> Self {
        Self { gateway }
    }

    /// Apply `raw` as the answer to `key`.
    pub async fn handle(
        &self,
        key: QuestionKey,
        raw: &str,
        record: &RegistrationRecord,
    ) -> Result<RegistrationRecord, AnswerError> {
        let mut next = record.clone();
        match key {
            QuestionKey::Subcategory => self.subcategory(raw, &mut next).await?,
            QuestionKey::RegistrationStartDate => registration_start_date(raw, &mut next)?,
            QuestionKey::IsPaid => self.is_paid(raw, &mut next).await?,
            QuestionKey::Type => self.drill_type(raw, &mut next).await?,
            QuestionKey::Purpose => self.purpose(raw, &mut next).await?,
            QuestionKey::Name => next.name = Some(raw.to_string()),
        }
        debug!(question = %key, "Answer accepted");
        Ok(next)
    }

    async fn subcategory(
        &self,
        raw: &str,
        next: &mut RegistrationRecord,
    ) -> Result<(), AnswerError> {
        let Some(subcategory) = self.gateway.infer_subcategory(raw).await? else {
            return Err(AnswerError::Rejected(Rejection::new(
                "Could not determine a valid subcategory. Please try again.",
            )));
        };
        next.set_classification(&subcategory)
            .map_err(|e| AnswerError::Rejected(Rejection::new(e.to_string())))
    }

    async fn is_paid(&self, raw: &str, next: &mut RegistrationRecord) -> Result<(), AnswerError> {
        next.is_paid = Some(self.gateway.infer_yes_no(raw).await?);
        Ok(())
    }

    async fn drill_type(
        &self,
        raw: &str,
        next: &mut RegistrationRecord,
    ) -> Result<(), AnswerError> {
        let corrected = self
            .gateway
            .correct_typo(QuestionKey::Type.field_name(), raw)
            .await?;
        // Unrecognised answers fall back to Theme Based rather than re-asking.
        let drill_type = DrillType::from_phrase(&corrected).unwrap_or_else(|| {
            info!(corrected = %corrected, "Drill type not recognised, using Theme Based");
            DrillType::ThemeBased
        });
        next.drill_type = Some(drill_type);
        Ok(())
    }

    async fn purpose(&self, raw: &str, next: &mut RegistrationRecord) -> Result<(), AnswerError> {
        let purpose = self.gateway.infer_purpose(next.subcategory(), raw).await?;
        next.purpose = Some(purpose);
        Ok(())
    }
}

fn registration_start_date(raw: &str, next: &mut RegistrationRecord) -> Result<(), AnswerError> {
    if !validate_date(raw) {
        return Err(AnswerError::Rejected(Rejection::new(
            "Invalid date format. Please use DD-MM-YYYY.",
        )));
    }
    next.registration_start_date = Some(raw.to_string());
    Ok(())
}
