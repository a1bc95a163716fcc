//! treino - workout session tracker
//!
//! Timed workouts against a remote training API: start a session, log
//! each set, then look at progress and the post-workout summary.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod notify;
pub mod progress;
pub mod routine;
pub mod session;
pub mod summary;
pub mod tui;

pub use db::Database;
pub use session::SessionController;
