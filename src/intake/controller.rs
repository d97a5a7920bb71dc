//! Flow controller: drives one conversation through the question sequence,
//! cancellation, restart, and submission.
//!
//! The controller holds no conversation data of its own. Callers own a
//! [`ConversationState`] and pass it into every call, so the same controller
//! serves the console and the web front ends.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::classifier::ClassifierGateway;
use crate::error::{FlowError, LlmError};
use crate::submission::RegistrationSubmitter;
use crate::vocabulary::DrillDefaults;

use super::handlers::{AnswerError, AnswerHandlers};
use super::questions::QUESTIONS;
use super::schedule::DrillSchedule;
use super::state::{ConversationState, FlowOutcome, FlowPhase, RetryPolicy};

pub const WELCOME: &str = "Welcome! Let's register your hackathon event.";
pub const CANCELLED: &str = "Registration process has been canceled.";
pub const ANOTHER_REGISTRATION: &str =
    "Would you like to register another hackathon/event? (Yes/No)";
pub const FAREWELL: &str =
    "Thank you for using the Hackathon Registration Chatbot! Have a great day!";
pub const COMPLETE: &str = "Registration complete! Thank you!";
pub const TOO_MANY_ATTEMPTS: &str =
    "I couldn't get a usable answer to that question, so this registration has been stopped.";

/// What the assistant says in response to one call.
#[derive(Debug, Clone, Serialize)]
pub struct FlowReply {
    pub messages: Vec<String>,
    pub phase: FlowPhase,
    pub outcome: Option<FlowOutcome>,
}

/// Sequences answer handling, cancellation and submission.
pub struct FlowController {
    gateway: Arc<ClassifierGateway>,
    handlers: AnswerHandlers,
    submitter: RegistrationSubmitter,
    retry: RetryPolicy,
    defaults: DrillDefaults,
}

impl FlowController {
    pub fn new(
        gateway: Arc<ClassifierGateway>,
        submitter: RegistrationSubmitter,
        defaults: DrillDefaults,
    ) -> Self {
        Self {
            handlers: AnswerHandlers::new(Arc::clone(&gateway)),
            gateway,
            submitter,
            retry: RetryPolicy::default(),
            defaults,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fresh conversation in `AwaitingStart`.
    pub fn new_conversation(&self) -> ConversationState {
        ConversationState::new(self.defaults.clone())
    }

    /// Start over: replace `state` with a fresh conversation.
    pub fn reset(&self, state: &mut ConversationState) {
        *state = self.new_conversation();
        info!(attempt_id = %state.attempt_id, "Conversation reset");
    }

    /// The explicit start action: ask the first question.
    pub fn begin(&self, state: &mut ConversationState) -> Result<FlowReply, FlowError> {
        match state.phase {
            FlowPhase::AwaitingStart => {}
            FlowPhase::Completed => return Err(FlowError::AlreadyCompleted),
            _ => return Err(FlowError::AlreadyStarted),
        }
        state.transition(FlowPhase::AskingQuestions)?;
        info!(attempt_id = %state.attempt_id, "Registration started");

        let mut out = Vec::new();
        say(state, &mut out, WELCOME);
        say(state, &mut out, QUESTIONS[0].text);
        Ok(reply(state, out))
    }

    /// Feed one user message into the conversation.
    pub async fn handle_input(
        &self,
        state: &mut ConversationState,
        text: &str,
    ) -> Result<FlowReply, FlowError> {
        match state.phase {
            FlowPhase::AwaitingStart => Err(FlowError::NotStarted),
            FlowPhase::GeneratingSubmission | FlowPhase::Completed => {
                Err(FlowError::AlreadyCompleted)
            }
            FlowPhase::AskingQuestions => self.answer(state, text.trim()).await,
            FlowPhase::Cancelled => self.decide_restart(state, text.trim()).await,
        }
    }

    /// Classify a "start over?" answer given after completion.
    pub async fn confirm_restart(&self, text: &str) -> Result<bool, LlmError> {
        self.gateway.infer_yes_no(text).await
    }

    async fn answer(
        &self,
        state: &mut ConversationState,
        text: &str,
    ) -> Result<FlowReply, FlowError> {
        let mut out = Vec::new();
        let Some(question) = state.current_question() else {
            return Err(FlowError::AlreadyCompleted);
        };
        if text.is_empty() {
            say(state, &mut out, question.text);
            return Ok(reply(state, out));
        }
        state.push_user(text);

        // Cancellation is checked before any field-specific handling.
        match self.gateway.detect_cancellation(text).await {
            Ok(true) => {
                info!(
                    attempt_id = %state.attempt_id,
                    question = %question.key,
                    "Registration cancelled by user"
                );
                state.transition(FlowPhase::Cancelled)?;
                say(state, &mut out, CANCELLED);
                say(state, &mut out, ANOTHER_REGISTRATION);
                return Ok(reply(state, out));
            }
            Ok(false) => {}
            Err(e) => {
                self.fail(state, &mut out, &e)?;
                return Ok(reply(state, out));
            }
        }

        match self.handlers.handle(question.key, text, &state.record).await {
            Ok(record) => {
                state.transition(FlowPhase::AskingQuestions)?;
                state.advance(record);
                match state.current_question() {
                    Some(next) => say(state, &mut out, next.text),
                    None => self.submit(state, &mut out).await?,
                }
            }
            Err(AnswerError::Rejected(rejection)) => {
                state.rejections += 1;
                info!(
                    attempt_id = %state.attempt_id,
                    question = %question.key,
                    rejections = state.rejections,
                    reason = %rejection,
                    "Answer rejected"
                );
                say(state, &mut out, &rejection.message);
                if self.retry.exhausted(state.rejections) {
                    state.transition(FlowPhase::Cancelled)?;
                    say(state, &mut out, TOO_MANY_ATTEMPTS);
                    say(state, &mut out, ANOTHER_REGISTRATION);
                } else {
                    say(state, &mut out, question.text);
                }
            }
            Err(AnswerError::Llm(e)) => self.fail(state, &mut out, &e)?,
        }

        Ok(reply(state, out))
    }

    /// The single post-cancellation decision: restart fresh or stop.
    async fn decide_restart(
        &self,
        state: &mut ConversationState,
        text: &str,
    ) -> Result<FlowReply, FlowError> {
        let mut out = Vec::new();
        state.push_user(text);

        match self.gateway.infer_yes_no(text).await {
            Ok(true) => {
                state.transition(FlowPhase::AskingQuestions)?;
                state.restart_attempt();
                info!(attempt_id = %state.attempt_id, "Registration restarted");
                say(state, &mut out, WELCOME);
                say(state, &mut out, QUESTIONS[0].text);
            }
            Ok(false) => {
                say(state, &mut out, FAREWELL);
                state.finish(FlowOutcome::Cancelled)?;
            }
            Err(e) => self.fail(state, &mut out, &e)?,
        }
        Ok(reply(state, out))
    }

    async fn submit(
        &self,
        state: &mut ConversationState,
        out: &mut Vec<String>,
    ) -> Result<(), FlowError> {
        state.transition(FlowPhase::GeneratingSubmission)?;
        let start_date = state.record.registration_start_date.clone().unwrap_or_default();

        let result = match DrillSchedule::derive(&start_date) {
            Ok(schedule) => self.submitter.submit(&mut state.record, &schedule).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(link) => {
                say(
                    state,
                    out,
                    &format!(
                        "Your event has been successfully registered! You can access it here: {link}"
                    ),
                );
                say(state, out, COMPLETE);
                state.finish(FlowOutcome::Submitted { link })
            }
            Err(e) => {
                warn!(attempt_id = %state.attempt_id, error = %e, "Submission failed");
                say(
                    state,
                    out,
                    &format!("An error occurred while submitting the hackathon: {e}"),
                );
                state.finish(FlowOutcome::Failed {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Abort the attempt after an external failure.
    fn fail(
        &self,
        state: &mut ConversationState,
        out: &mut Vec<String>,
        error: &LlmError,
    ) -> Result<(), FlowError> {
        warn!(attempt_id = %state.attempt_id, error = %error, "Language model call failed");
        say(state, out, &apology(error));
        state.finish(FlowOutcome::Failed {
            reason: error.to_string(),
        })
    }
}

/// What the user is told when a language model call fails.
pub(crate) fn apology(error: &LlmError) -> String {
    format!("An error occurred: {error}. Please try again or contact support.")
}

fn say(state: &mut ConversationState, out: &mut Vec<String>, text: &str) {
    state.push_assistant(text);
    out.push(text.to_string());
}

fn reply(state: &ConversationState, messages: Vec<String>) -> FlowReply {
    FlowReply {
        messages,
        phase: state.phase,
        outcome: state.outcome.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::ScriptedLlm;
    use crate::intake::model::{DrillType, Purpose};
    use crate::submission::RegistrationApiConfig;
    use crate::submission::tests::RecordingApi;

    /// Answers a full happy path; nothing reads as a cancellation.
    fn happy_llm() -> ScriptedLlm {
        ScriptedLlm::new()
            .on("cancel the registration", "False")
            .on("most relevant subcategory", "IDEATHON")
            .on("typos or errors", "Product Based")
            .on("'Yes' or 'No'", "Yes")
            .on("possible purposes", "Hiring")
            .on("short description", "An ideathon.")
    }

    fn controller(llm: Arc<ScriptedLlm>, api: Arc<RecordingApi>) -> FlowController {
        let gateway = Arc::new(ClassifierGateway::new(llm));
        let submitter = RegistrationSubmitter::new(
            Arc::clone(&gateway),
            api,
            RegistrationApiConfig::default(),
        );
        FlowController::new(gateway, submitter, DrillDefaults::default())
    }

    const ANSWERS: [&str; 6] = [
        "an ideathon",
        "Idea Sprint",
        "01-01-2025",
        "prodct basd",
        "yes it is paid",
        "to hire people",
    ];

    #[tokio::test]
    async fn six_answers_submit_once() {
        let api = Arc::new(RecordingApi::ok("idea-sprint"));
        let flow = controller(Arc::new(happy_llm()), api.clone());
        let mut state = flow.new_conversation();

        let first = flow.begin(&mut state).unwrap();
        assert_eq!(first.messages, vec![WELCOME.to_string(), QUESTIONS[0].text.to_string()]);

        let mut last = None;
        for answer in ANSWERS {
            last = Some(flow.handle_input(&mut state, answer).await.unwrap());
        }
        let last = last.unwrap();

        assert_eq!(state.phase, FlowPhase::Completed);
        assert_eq!(
            state.outcome,
            Some(FlowOutcome::Submitted {
                link: "https://dev.whereuelevate.com/drills/idea-sprint".to_string()
            })
        );
        assert!(last.messages[0].contains("successfully registered"));
        assert_eq!(api.count(), 1);

        let payloads = api.payloads.lock().unwrap();
        let payload = &payloads[0];
        assert_eq!(payload.drill_name, "Idea Sprint");
        assert_eq!(payload.drill_sub_category, "IDEATHON");
        assert_eq!(payload.drill_category, "HACKATHON");
        assert_eq!(payload.drill_registration_start_dt, "2025-01-01T00:00:00");
        assert_eq!(payload.drill_end_dt, "2025-02-01T00:00:00");
        assert_eq!(payload.drill_type, DrillType::ProductBased);
        assert_eq!(payload.drill_purpose, Purpose::Hiring);
        assert!(payload.is_drill_paid);
    }

    #[tokio::test]
    async fn submission_failure_is_distinguishable() {
        let api = Arc::new(RecordingApi::failing(502));
        let flow = controller(Arc::new(happy_llm()), api.clone());
        let mut state = flow.new_conversation();
        flow.begin(&mut state).unwrap();
        for answer in ANSWERS {
            flow.handle_input(&mut state, answer).await.unwrap();
        }
        assert!(state.is_complete());
        match state.outcome.as_ref().unwrap() {
            FlowOutcome::Failed { reason } => assert!(reason.contains("502")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!state.outcome.as_ref().unwrap().is_success());
        assert_eq!(api.count(), 1);
    }

    #[tokio::test]
    async fn cancellation_short_circuits_every_question() {
        for pending in 0..QUESTIONS.len() {
            let llm = Arc::new(
                ScriptedLlm::new()
                    .on("'STOP NOW'", "True")
                    .on("cancel the registration", "False")
                    .on("most relevant subcategory", "WEBINAR")
                    .on("typos or errors", "Theme Based")
                    .on("'Yes' or 'No'", "No")
                    .on("possible purposes", "Innovation"),
            );
            let api = Arc::new(RecordingApi::ok("x"));
            let flow = controller(llm.clone(), api.clone());
            let mut state = flow.new_conversation();
            flow.begin(&mut state).unwrap();
            for answer in &ANSWERS[..pending] {
                flow.handle_input(&mut state, answer).await.unwrap();
            }
            assert_eq!(state.question_index, pending);
            let before = state.record.clone();
            let calls_before = llm.calls();

            let out = flow.handle_input(&mut state, "STOP NOW").await.unwrap();

            assert_eq!(state.phase, FlowPhase::Cancelled, "question {pending}");
            assert_eq!(state.record, before);
            // Only the cancellation check ran, no field handler.
            assert_eq!(llm.calls(), calls_before + 1);
            assert_eq!(out.messages, vec![CANCELLED.to_string(), ANOTHER_REGISTRATION.to_string()]);
            assert_eq!(api.count(), 0);
        }
    }

    #[tokio::test]
    async fn cancelled_then_restart_gets_fresh_record() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .on("'quit'", "True")
                .on("cancel the registration", "False")
                .on("most relevant subcategory", "WEBINAR")
                .on("'Yes' or 'No'", "Yes"),
        );
        let flow = controller(llm, Arc::new(RecordingApi::ok("x")));
        let mut state = flow.new_conversation();
        flow.begin(&mut state).unwrap();
        flow.handle_input(&mut state, "webinar").await.unwrap();
        assert_eq!(state.record.subcategory(), "WEBINAR");
        let first_attempt = state.attempt_id;

        flow.handle_input(&mut state, "quit").await.unwrap();
        let out = flow.handle_input(&mut state, "sure, another one").await.unwrap();

        assert_eq!(state.phase, FlowPhase::AskingQuestions);
        assert_eq!(state.question_index, 0);
        assert!(state.record.subcategory().is_empty());
        assert_ne!(state.attempt_id, first_attempt);
        assert_eq!(out.messages[1], QUESTIONS[0].text);
    }

    #[tokio::test]
    async fn cancelled_then_decline_completes_without_submission() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .on("cancel the registration", "True")
                .on("'Yes' or 'No'", "No"),
        );
        let api = Arc::new(RecordingApi::ok("x"));
        let flow = controller(llm, api.clone());
        let mut state = flow.new_conversation();
        flow.begin(&mut state).unwrap();
        flow.handle_input(&mut state, "cancel").await.unwrap();
        let out = flow.handle_input(&mut state, "no thanks").await.unwrap();

        assert_eq!(out.messages, vec![FAREWELL.to_string()]);
        assert_eq!(state.outcome, Some(FlowOutcome::Cancelled));
        assert_eq!(api.count(), 0);
        assert!(matches!(
            flow.handle_input(&mut state, "hello").await,
            Err(FlowError::AlreadyCompleted)
        ));
    }

    #[tokio::test]
    async fn rejection_reprompts_same_question() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .on("cancel the registration", "False")
                .on("most relevant subcategory", ""),
        );
        let flow = controller(llm, Arc::new(RecordingApi::ok("x")));
        let mut state = flow.new_conversation();
        flow.begin(&mut state).unwrap();

        for attempt in 1..=5 {
            let out = flow.handle_input(&mut state, "a party").await.unwrap();
            assert_eq!(state.phase, FlowPhase::AskingQuestions);
            assert_eq!(state.question_index, 0);
            assert_eq!(state.rejections, attempt);
            assert_eq!(out.messages[1], QUESTIONS[0].text);
        }
    }

    #[tokio::test]
    async fn bounded_retry_gives_up() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .on("cancel the registration", "False")
                .on("most relevant subcategory", "WEBINAR"),
        );
        let flow = controller(llm, Arc::new(RecordingApi::ok("x")))
            .with_retry_policy(RetryPolicy::Bounded(2));
        let mut state = flow.new_conversation();
        flow.begin(&mut state).unwrap();
        flow.handle_input(&mut state, "a webinar").await.unwrap();
        flow.handle_input(&mut state, "Idea").await.unwrap();
        flow.handle_input(&mut state, "tomorrow").await.unwrap();
        assert_eq!(state.phase, FlowPhase::AskingQuestions);
        assert_eq!(state.rejections, 1);
        let out = flow.handle_input(&mut state, "next week").await.unwrap();
        assert_eq!(state.phase, FlowPhase::Cancelled);
        assert!(out.messages.contains(&TOO_MANY_ATTEMPTS.to_string()));
    }

    #[tokio::test]
    async fn llm_failure_ends_attempt() {
        let llm = Arc::new(ScriptedLlm::new().fail_on("cancel the registration", "503"));
        let api = Arc::new(RecordingApi::ok("x"));
        let flow = controller(llm, api.clone());
        let mut state = flow.new_conversation();
        flow.begin(&mut state).unwrap();
        let out = flow.handle_input(&mut state, "webinar").await.unwrap();
        assert_eq!(out.phase, FlowPhase::Completed);
        assert!(matches!(out.outcome, Some(FlowOutcome::Failed { .. })));
        assert_eq!(api.count(), 0);
    }

    #[tokio::test]
    async fn impossible_calendar_date_fails_without_posting() {
        let llm = Arc::new(happy_llm());
        let api = Arc::new(RecordingApi::ok("x"));
        let flow = controller(llm.clone(), api.clone());
        let mut state = flow.new_conversation();
        flow.begin(&mut state).unwrap();

        let mut answers = ANSWERS;
        answers[2] = "31-02-2025";
        for answer in answers {
            flow.handle_input(&mut state, answer).await.unwrap();
        }

        // The format check accepted it; the calendar did not.
        assert_eq!(state.record.registration_start_date.as_deref(), Some("31-02-2025"));
        assert_eq!(state.phase, FlowPhase::Completed);
        match state.outcome.as_ref().unwrap() {
            FlowOutcome::Failed { reason } => assert!(reason.contains("31-02-2025")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(api.count(), 0);
        let seen = llm.seen.lock().unwrap();
        assert!(!seen.iter().any(|i| i.contains("short description")));
    }

    #[tokio::test]
    async fn reset_returns_to_awaiting_start() {
        let flow = controller(Arc::new(happy_llm()), Arc::new(RecordingApi::ok("x")));
        let mut state = flow.new_conversation();
        flow.begin(&mut state).unwrap();
        flow.handle_input(&mut state, "an ideathon").await.unwrap();

        flow.reset(&mut state);

        assert_eq!(state.phase, FlowPhase::AwaitingStart);
        assert!(state.transcript.is_empty());
        assert!(state.record.subcategory().is_empty());
        assert!(flow.begin(&mut state).is_ok());
    }

    #[tokio::test]
    async fn input_before_start_is_refused() {
        let flow = controller(Arc::new(ScriptedLlm::new()), Arc::new(RecordingApi::ok("x")));
        let mut state = flow.new_conversation();
        assert!(matches!(
            flow.handle_input(&mut state, "hi").await,
            Err(FlowError::NotStarted)
        ));
        flow.begin(&mut state).unwrap();
        assert!(matches!(flow.begin(&mut state), Err(FlowError::AlreadyStarted)));
    }

    #[tokio::test]
    async fn transcript_records_both_sides() {
        let flow = controller(Arc::new(happy_llm()), Arc::new(RecordingApi::ok("x")));
        let mut state = flow.new_conversation();
        flow.begin(&mut state).unwrap();
        flow.handle_input(&mut state, "an ideathon").await.unwrap();
        let contents: Vec<&str> = state.transcript.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![WELCOME, QUESTIONS[0].text, "an ideathon", QUESTIONS[1].text]
        );
    }
}
