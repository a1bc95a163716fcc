//! reqwest-backed implementation of [`WorkoutApi`]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    ApiError, CreateWorkout, ExerciseHistory, LoginRequest, LoginResponse, PersistedSet, Result,
    SetUpsert, Workout, WorkoutApi, WorkoutSummary,
};
use crate::routine::Routine;

const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Longest error body echoed back to the user
const MAX_ERROR_LEN: usize = 200;

pub struct ApiClient {
    base_url: String,
    client: Client,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("treino/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            client,
            token: None,
        })
    }

    /// Attach the bearer token resolved by the auth session
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url().path());

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        // An empty 2xx body means "nothing", same as a JSON null
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        Ok(serde_json::from_str(body)?)
    }
}

/// Pull a readable message out of an error body
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no details".to_string();
    }
    trimmed.chars().take(MAX_ERROR_LEN).collect()
}

#[async_trait]
impl WorkoutApi for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let body = LoginRequest { email, password };
        self.send(self.request(Method::POST, "/auth/login").json(&body))
            .await
    }

    async fn routines(&self, user_id: &str) -> Result<Vec<Routine>> {
        self.send(self.request(Method::GET, &format!("/user/{}/routine", user_id)))
            .await
    }

    async fn create_workout(&self, training_ids: &[String]) -> Result<Workout> {
        let body = CreateWorkout { training_ids };
        self.send(self.request(Method::POST, "/workout").json(&body))
            .await
    }

    async fn stop_workout(&self, workout_id: &str) -> Result<Workout> {
        self.send(self.request(Method::PUT, &format!("/workout/stop/{}", workout_id)))
            .await
    }

    async fn workout_in_progress(&self, training_ids: &[String]) -> Result<Option<Workout>> {
        let request = self
            .request(Method::GET, "/workout/in-progress")
            .query(&[("trainingIds", training_ids.join(","))]);
        self.send(request).await
    }

    async fn upsert_set(&self, workout_id: &str, set: &SetUpsert) -> Result<PersistedSet> {
        self.send(self.request(Method::PUT, &format!("/workout/{}", workout_id)).json(set))
            .await
    }

    async fn exercise_history(&self, user_id: &str) -> Result<Vec<ExerciseHistory>> {
        self.send(self.request(Method::GET, &format!("/user/{}/exercise", user_id)))
            .await
    }

    async fn workout_summary(&self, workout_id: &str, training_id: &str) -> Result<WorkoutSummary> {
        let request = self
            .request(Method::GET, &format!("/summary/workout/{}", workout_id))
            .query(&[("trainingId", training_id)]);
        self.send(request).await
    }
}
