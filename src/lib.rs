//! Drill intake: a conversational assistant that registers hackathon-style
//! events ("drills") by asking a fixed set of questions.

pub mod channels;
pub mod classifier;
pub mod config;
pub mod error;
pub mod intake;
pub mod llm;
pub mod submission;
pub mod vocabulary;
