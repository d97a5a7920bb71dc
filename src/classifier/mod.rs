//! Classifier gateway: every fuzzy interpretation of user text goes through
//! one LLM completion here.
//!
//! Closed-vocabulary tasks never return a value outside their label set: an
//! unrecognised model answer is replaced by the task's default. Subcategory
//! inference is the one task that signals "no match" (empty string) instead
//! of defaulting.

pub mod prompts;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::LlmError;
use crate::intake::model::{DrillType, Purpose};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::vocabulary::Vocabulary;

/// Sampling temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Completion cap used when none is configured.
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// What the gateway is being asked to do, with the context each task needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierTask<'a> {
    CorrectTypo { field: &'a str },
    InferSubcategory,
    InferPurpose { subcategory: &'a str },
    InferYesNo,
    DetectCancellation,
    GenerateDescription {
        name: &'a str,
        drill_type: DrillType,
        purpose: Purpose,
    },
}

impl ClassifierTask<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CorrectTypo { .. } => "correct_typo",
            Self::InferSubcategory => "infer_subcategory",
            Self::InferPurpose { .. } => "infer_purpose",
            Self::InferYesNo => "infer_yes_no",
            Self::DetectCancellation => "detect_cancellation",
            Self::GenerateDescription { .. } => "generate_description",
        }
    }

    /// Short user turn sent after the instruction.
    fn nudge(&self) -> &'static str {
        match self {
            Self::CorrectTypo { .. } => "Please provide the corrected value.",
            Self::InferSubcategory => "Provide the inferred subcategory.",
            Self::InferPurpose { .. } => "Provide the inferred purpose.",
            Self::InferYesNo | Self::DetectCancellation => "Provide the inferred response.",
            Self::GenerateDescription { .. } => {
                "Please generate the description based on the above details."
            }
        }
    }
}

/// Narrow interface over the language model used by the answer handlers.
pub struct ClassifierGateway {
    llm: Arc<dyn LlmProvider>,
    vocabulary: Vocabulary,
    temperature: f32,
    max_tokens: u32,
}

impl ClassifierGateway {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            vocabulary: Vocabulary,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Run one classification task against `text`.
    ///
    /// Performs exactly one completion call. No retry: a provider failure is
    /// returned to the caller as-is.
    pub async fn classify(&self, task: ClassifierTask<'_>, text: &str) -> Result<String, LlmError> {
        let instruction = match task {
            ClassifierTask::CorrectTypo { field } => prompts::correct_typo(field, text),
            ClassifierTask::InferSubcategory => {
                prompts::infer_subcategory(text, self.vocabulary.all_subcategories())
            }
            ClassifierTask::InferPurpose { subcategory } => {
                prompts::infer_purpose(subcategory, text)
            }
            ClassifierTask::InferYesNo => prompts::infer_yes_no(text),
            ClassifierTask::DetectCancellation => prompts::detect_cancellation(text),
            ClassifierTask::GenerateDescription {
                name,
                drill_type,
                purpose,
            } => prompts::generate_description(name, drill_type.as_str(), purpose.as_str()),
        };

        let request = CompletionRequest::new(vec![
            ChatMessage::system(instruction),
            ChatMessage::user(task.nudge()),
        ])
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens);

        let response = self.llm.complete(request).await?;
        let raw = response.content;
        let value = self.normalize(task, &raw);

        debug!(
            task = task.label(),
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            raw = %raw.trim(),
            value = %value,
            "Classified input"
        );

        Ok(value)
    }

    /// Map a raw model answer into the task's output set.
    fn normalize(&self, task: ClassifierTask<'_>, raw: &str) -> String {
        match task {
            ClassifierTask::CorrectTypo { .. } | ClassifierTask::GenerateDescription { .. } => {
                raw.trim().to_string()
            }
            ClassifierTask::InferSubcategory => {
                let label = strip_label(raw).to_uppercase();
                if self.vocabulary.contains(&label) {
                    label
                } else {
                    if !label.is_empty() {
                        warn!(
                            label = %label,
                            "Model proposed a subcategory outside the vocabulary"
                        );
                    }
                    String::new()
                }
            }
            ClassifierTask::InferPurpose { .. } => {
                let label = capitalize(strip_label(raw));
                Purpose::from_label(&label)
                    .unwrap_or_default()
                    .as_str()
                    .to_string()
            }
            ClassifierTask::InferYesNo => {
                let label = capitalize(strip_label(raw));
                let answer = if label == "Yes" { "Yes" } else { "No" };
                answer.to_string()
            }
            ClassifierTask::DetectCancellation => {
                let label = capitalize(strip_label(raw));
                let answer = if label == "True" { "True" } else { "False" };
                answer.to_string()
            }
        }
    }

    /// Subcategory code for free text, or `None` when nothing matches.
    pub async fn infer_subcategory(&self, text: &str) -> Result<Option<String>, LlmError> {
        let label = self.classify(ClassifierTask::InferSubcategory, text).await?;
        Ok(if label.is_empty() { None } else { Some(label) })
    }

    pub async fn infer_purpose(&self, subcategory: &str, text: &str) -> Result<Purpose, LlmError> {
        let label = self
            .classify(ClassifierTask::InferPurpose { subcategory }, text)
            .await?;
        Ok(Purpose::from_label(&label).unwrap_or_default())
    }

    /// `true` iff the model reads the text as affirmative.
    pub async fn infer_yes_no(&self, text: &str) -> Result<bool, LlmError> {
        let label = self.classify(ClassifierTask::InferYesNo, text).await?;
        Ok(label == "Yes")
    }

    pub async fn detect_cancellation(&self, text: &str) -> Result<bool, LlmError> {
        let label = self.classify(ClassifierTask::DetectCancellation, text).await?;
        Ok(label == "True")
    }

    pub async fn correct_typo(&self, field: &str, text: &str) -> Result<String, LlmError> {
        self.classify(ClassifierTask::CorrectTypo { field }, text).await
    }

    pub async fn generate_description(
        &self,
        name: &str,
        drill_type: DrillType,
        purpose: Purpose,
    ) -> Result<String, LlmError> {
        self.classify(
            ClassifierTask::GenerateDescription {
                name,
                drill_type,
                purpose,
            },
            name,
        )
        .await
    }
}

/// Trim whitespace, wrapping quotes/backticks and a trailing period.
fn strip_label(raw: &str) -> &str {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim_end_matches('.')
        .trim()
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::llm::CompletionResponse;

    /// Scripted LLM: answers by the first rule whose needle appears in the
    /// system instruction. Records every instruction it sees.
    pub(crate) struct ScriptedLlm {
        rules: Vec<(String, Result<String, String>)>,
        pub(crate) seen: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        pub(crate) fn new() -> Self {
            Self {
                rules: Vec::new(),
                seen: Mutex::new(Vec::new()),
            }
        }

        /// Reply `answer` when the instruction contains `needle`.
        pub(crate) fn on(mut self, needle: &str, answer: &str) -> Self {
            self.rules.push((needle.to_string(), Ok(answer.to_string())));
            self
        }

        /// Fail when the instruction contains `needle`.
        pub(crate) fn fail_on(mut self, needle: &str, reason: &str) -> Self {
            self.rules.push((needle.to_string(), Err(reason.to_string())));
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            let instruction = request.preamble().unwrap_or_default();
            self.seen.lock().unwrap().push(instruction.clone());
            let answer = self
                .rules
                .iter()
                .find(|(needle, _)| instruction.contains(needle.as_str()))
                .map(|(_, answer)| answer.clone())
                .unwrap_or_else(|| Ok(String::new()));
            match answer {
                Ok(content) => Ok(CompletionResponse {
                    content,
                    input_tokens: 10,
                    output_tokens: 2,
                }),
                Err(reason) => Err(LlmError::RequestFailed {
                    provider: "scripted".to_string(),
                    reason,
                }),
            }
        }
    }

    fn gateway(llm: ScriptedLlm) -> ClassifierGateway {
        ClassifierGateway::new(Arc::new(llm))
    }

    #[tokio::test]
    async fn subcategory_is_uppercased_and_checked() {
        let gw = gateway(ScriptedLlm::new().on("most relevant subcategory", " webinar\n"));
        assert_eq!(gw.infer_subcategory("a webinar").await.unwrap().as_deref(), Some("WEBINAR"));
    }

    #[tokio::test]
    async fn subcategory_outside_vocabulary_is_no_match() {
        let gw = gateway(ScriptedLlm::new().on("most relevant subcategory", "HACKATHON"));
        assert_eq!(gw.classify(ClassifierTask::InferSubcategory, "x").await.unwrap(), "");
        assert!(gw.infer_subcategory("x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purpose_defaults_to_innovation() {
        let gw = gateway(ScriptedLlm::new().on("possible purposes", "Recruitment drive"));
        let purpose = gw.infer_purpose("HIRINGHACKATHON", "get people").await.unwrap();
        assert_eq!(purpose, Purpose::Innovation);
    }

    #[tokio::test]
    async fn purpose_label_is_capitalized() {
        let gw = gateway(ScriptedLlm::new().on("possible purposes", "HIRING."));
        let label = gw
            .classify(ClassifierTask::InferPurpose { subcategory: "x" }, "hire")
            .await
            .unwrap();
        assert_eq!(label, "Hiring");
    }

    #[tokio::test]
    async fn yes_no_defaults_to_no() {
        let gw = gateway(ScriptedLlm::new().on("'Yes' or 'No'", "Maybe"));
        assert_eq!(gw.classify(ClassifierTask::InferYesNo, "hmm").await.unwrap(), "No");

        let gw = gateway(ScriptedLlm::new().on("'Yes' or 'No'", "\"yes\""));
        assert!(gw.infer_yes_no("sure").await.unwrap());
    }

    #[tokio::test]
    async fn cancellation_only_on_true() {
        let gw = gateway(ScriptedLlm::new().on("cancel the registration", "TRUE"));
        assert!(gw.detect_cancellation("stop").await.unwrap());

        let gw = gateway(ScriptedLlm::new().on("cancel the registration", "probably"));
        assert!(!gw.detect_cancellation("go on").await.unwrap());
    }

    #[tokio::test]
    async fn free_text_tasks_are_only_trimmed() {
        let gw = gateway(ScriptedLlm::new().on("typos or errors", "  theme based \n"));
        assert_eq!(gw.correct_typo("drillType", "theem").await.unwrap(), "theme based");
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let gw = gateway(ScriptedLlm::new().fail_on("'Yes' or 'No'", "boom"));
        let err = gw.infer_yes_no("yes").await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn capitalize_and_strip() {
        assert_eq!(capitalize("hIRING"), "Hiring");
        assert_eq!(capitalize(""), "");
        assert_eq!(strip_label(" `Yes.` "), "Yes");
        assert_eq!(strip_label("'WEBINAR'"), "WEBINAR");
    }
}
