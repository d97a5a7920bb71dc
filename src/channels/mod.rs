//! Front ends that drive the flow controller.

pub mod cli;
pub mod web;

pub use cli::ConsoleChannel;
pub use web::{WebState, registration_routes};
