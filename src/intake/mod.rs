//! Registration intake: the question sequence, answer handling, and the
//! controller that ties them to submission.

pub mod controller;
pub mod handlers;
pub mod model;
pub mod questions;
pub mod schedule;
pub mod state;

pub use controller::{FlowController, FlowReply};
pub use model::{DrillType, Purpose, RegistrationRecord};
pub use questions::{QUESTIONS, Question, QuestionKey};
pub use schedule::DrillSchedule;
pub use state::{ConversationState, FlowOutcome, FlowPhase, RetryPolicy};
