//! Web front end: REST endpoints over a single shared conversation.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::error::FlowError;
use crate::intake::{
    ConversationState, FlowController, FlowOutcome, FlowPhase, Question, RegistrationRecord,
};
use crate::llm::ChatMessage;

/// Shared state for the registration routes.
#[derive(Clone)]
pub struct WebState {
    flow: Arc<FlowController>,
    conversation: Arc<Mutex<ConversationState>>,
}

impl WebState {
    pub fn new(flow: Arc<FlowController>) -> Self {
        let conversation = flow.new_conversation();
        Self {
            flow,
            conversation: Arc::new(Mutex::new(conversation)),
        }
    }
}

/// What a client sees of the conversation.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub phase: FlowPhase,
    pub question: Option<Question>,
    pub record: RegistrationRecord,
    pub transcript: Vec<ChatMessage>,
    pub outcome: Option<FlowOutcome>,
}

impl From<&ConversationState> for Snapshot {
    fn from(state: &ConversationState) -> Self {
        Self {
            phase: state.phase,
            question: state.current_question().copied(),
            record: state.record.clone(),
            transcript: state.transcript.clone(),
            outcome: state.outcome.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnswerRequest {
    content: String,
}

/// Build the registration REST routes.
pub fn registration_routes(state: WebState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/registration", get(snapshot))
        .route("/api/registration/start", post(start))
        .route("/api/registration/answer", post(answer))
        .route("/api/registration/reset", post(reset))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn snapshot(State(state): State<WebState>) -> impl IntoResponse {
    let conversation = state.conversation.lock().await;
    Json(Snapshot::from(&*conversation))
}

async fn start(State(state): State<WebState>) -> impl IntoResponse {
    let mut conversation = state.conversation.lock().await;
    match state.flow.begin(&mut conversation) {
        Ok(reply) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "messages": reply.messages,
                "state": Snapshot::from(&*conversation),
            })),
        ),
        Err(e) => flow_error(e),
    }
}

async fn answer(
    State(state): State<WebState>,
    Json(body): Json<AnswerRequest>,
) -> impl IntoResponse {
    let content = body.content.trim();
    if content.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Answer content is empty"})),
        );
    }

    // Held across the LLM call: answers are processed one at a time.
    let mut conversation = state.conversation.lock().await;
    match state.flow.handle_input(&mut conversation, content).await {
        Ok(reply) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "messages": reply.messages,
                "state": Snapshot::from(&*conversation),
            })),
        ),
        Err(e) => flow_error(e),
    }
}

async fn reset(State(state): State<WebState>) -> impl IntoResponse {
    let mut conversation = state.conversation.lock().await;
    state.flow.reset(&mut conversation);
    Json(Snapshot::from(&*conversation))
}

fn flow_error(e: FlowError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match e {
        FlowError::InvalidTransition { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::CONFLICT,
    };
    (status, Json(serde_json::json!({"error": e.to_string()})))
}
