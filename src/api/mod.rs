//! Remote workout API - wire types and the client seam
//!
//! The server owns routines, workouts, PR detection and volume totals.
//! Everything here is a thin typed view of its JSON (camelCase fields).

pub mod client;
#[cfg(test)]
pub(crate) mod testing;

pub use client::ApiClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routine::Routine;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unauthorized, log in again")]
    Unauthorized,

    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// A workout as the server sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub training_ids: Vec<String>,
    /// Sets already persisted, in the order they were recorded
    #[serde(default)]
    pub sets: Vec<PersistedSet>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkout<'a> {
    pub training_ids: &'a [String],
}

/// Body of `PUT /workout/{id}`; `set_id` is `None` until the set exists remotely
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUpsert {
    pub exercise_id: String,
    pub reps: u32,
    pub load: f64,
    pub set_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSet {
    pub id: String,
    pub exercise_id: String,
    pub reps: u32,
    pub load: f64,
}

/// One set from history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    pub load: f64,
    pub reps: u32,
}

impl SetRecord {
    pub fn volume(&self) -> f64 {
        self.load * self.reps as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalWorkout {
    pub workout_id: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub sets: Vec<SetRecord>,
}

/// Historical data for one exercise, as returned by `GET /user/{id}/exercise`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseHistory {
    pub exercise_id: String,
    pub name: String,
    #[serde(default)]
    pub workouts: Vec<HistoricalWorkout>,
}

/// Post-workout totals computed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSummary {
    pub total_volume: f64,
    #[serde(default)]
    pub previous_total_volume: Option<f64>,
    #[serde(default)]
    pub all_time_best_volume: Option<f64>,
    pub workouts_of_same_type_count: u32,
    #[serde(default)]
    pub training_name: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<u64>,
    #[serde(default)]
    pub total_sets: Option<u32>,
}

/// Everything the client needs from the server
#[async_trait]
pub trait WorkoutApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse>;

    async fn routines(&self, user_id: &str) -> Result<Vec<Routine>>;

    /// `POST /workout`
    async fn create_workout(&self, training_ids: &[String]) -> Result<Workout>;

    /// `PUT /workout/stop/{id}`
    async fn stop_workout(&self, workout_id: &str) -> Result<Workout>;

    /// `GET /workout/in-progress`, `None` when no session is open
    async fn workout_in_progress(&self, training_ids: &[String]) -> Result<Option<Workout>>;

    /// `PUT /workout/{id}` - create or update one set
    async fn upsert_set(&self, workout_id: &str, set: &SetUpsert) -> Result<PersistedSet>;

    async fn exercise_history(&self, user_id: &str) -> Result<Vec<ExerciseHistory>>;

    async fn workout_summary(&self, workout_id: &str, training_id: &str) -> Result<WorkoutSummary>;
}
