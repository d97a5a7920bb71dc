//! Conversation state machine: tracks where one registration attempt is.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FlowError;
use crate::llm::ChatMessage;
use crate::vocabulary::DrillDefaults;

use super::model::RegistrationRecord;
use super::questions::{QUESTIONS, Question};

/// Phases of a registration conversation.
///
/// AwaitingStart → AskingQuestions → GeneratingSubmission → Completed, with
/// Cancelled reachable from AskingQuestions and leading either back to
/// AskingQuestions (restart) or to Completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    #[default]
    AwaitingStart,
    AskingQuestions,
    GeneratingSubmission,
    Cancelled,
    Completed,
}

impl FlowPhase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: FlowPhase) -> bool {
        use FlowPhase::*;
        matches!(
            (self, target),
            (AwaitingStart, AskingQuestions)
                | (AskingQuestions, AskingQuestions)
                | (AskingQuestions, Cancelled)
                | (AskingQuestions, GeneratingSubmission)
                | (AskingQuestions, Completed)
                | (Cancelled, AskingQuestions)
                | (Cancelled, Completed)
                | (GeneratingSubmission, Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for FlowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingStart => "awaiting_start",
            Self::AskingQuestions => "asking_questions",
            Self::GeneratingSubmission => "generating_submission",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// How a completed conversation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlowOutcome {
    /// Registered; `link` is the public drill page.
    Submitted { link: String },
    /// The user cancelled and declined to start another registration.
    Cancelled,
    /// An external call failed; nothing is pending on the remote side.
    Failed { reason: String },
}

impl FlowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Submitted { .. })
    }
}

/// How many times a question may be re-asked after a rejection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    #[default]
    Unbounded,
    /// Give up on the attempt after this many rejected answers to one question.
    Bounded(u32),
}

impl RetryPolicy {
    /// Whether `rejections` rejected answers exhaust the policy.
    pub fn exhausted(&self, rejections: u32) -> bool {
        match self {
            Self::Unbounded => false,
            Self::Bounded(max) => rejections >= *max,
        }
    }
}

/// Everything one conversation owns. Passed explicitly to the controller.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationState {
    pub attempt_id: Uuid,
    pub phase: FlowPhase,
    pub question_index: usize,
    /// Rejected answers to the current question.
    pub rejections: u32,
    pub record: RegistrationRecord,
    pub transcript: Vec<ChatMessage>,
    pub outcome: Option<FlowOutcome>,
    #[serde(skip)]
    defaults: DrillDefaults,
}

impl ConversationState {
    pub fn new(defaults: DrillDefaults) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            phase: FlowPhase::AwaitingStart,
            question_index: 0,
            rejections: 0,
            record: RegistrationRecord::new(&defaults),
            transcript: Vec::new(),
            outcome: None,
            defaults,
        }
    }

    /// Question awaiting an answer, if questions are being asked.
    pub fn current_question(&self) -> Option<&'static Question> {
        if self.phase == FlowPhase::AskingQuestions {
            QUESTIONS.get(self.question_index)
        } else {
            None
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Move to `target`, refusing transitions the machine does not allow.
    pub fn transition(&mut self, target: FlowPhase) -> Result<(), FlowError> {
        if !self.phase.can_transition_to(target) {
            return Err(FlowError::InvalidTransition {
                from: self.phase.to_string(),
                to: target.to_string(),
            });
        }
        self.phase = target;
        Ok(())
    }

    /// Record accepted; move on to the next question.
    pub fn advance(&mut self, record: RegistrationRecord) {
        self.record = record;
        self.question_index += 1;
        self.rejections = 0;
    }

    /// Discard the record and start the questions over. Transcript is kept.
    pub fn restart_attempt(&mut self) {
        self.attempt_id = Uuid::new_v4();
        self.question_index = 0;
        self.rejections = 0;
        self.record = RegistrationRecord::new(&self.defaults);
        self.outcome = None;
    }

    pub fn finish(&mut self, outcome: FlowOutcome) -> Result<(), FlowError> {
        self.transition(FlowPhase::Completed)?;
        self.outcome = Some(outcome);
        Ok(())
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.transcript.push(ChatMessage::assistant(content));
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.transcript.push(ChatMessage::user(content));
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(DrillDefaults::default())
    }
}
