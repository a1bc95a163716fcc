//! In-memory [`WorkoutApi`] for tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use super::{
    ApiError, ExerciseHistory, LoginResponse, PersistedSet, Result, SetUpsert, User, Workout,
    WorkoutApi, WorkoutSummary,
};
use crate::routine::Routine;

#[derive(Default)]
pub struct FakeApi {
    fail_create: AtomicBool,
    fail_stop: AtomicBool,
    fail_upsert: AtomicBool,
    next_id: AtomicU64,
    in_progress: Mutex<Option<Workout>>,
    upserts: Mutex<Vec<SetUpsert>>,
    stopped: Mutex<Vec<String>>,
    history: Mutex<Vec<ExerciseHistory>>,
    summary: Mutex<Option<WorkoutSummary>>,
    routines: Mutex<Vec<Routine>>,
}

fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

impl FakeApi {
    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }

    pub fn fail_upsert(&self, fail: bool) {
        self.fail_upsert.store(fail, Ordering::SeqCst);
    }

    pub fn set_in_progress(&self, workout: Option<Workout>) {
        *self.in_progress.lock().unwrap() = workout;
    }

    pub fn set_history(&self, history: Vec<ExerciseHistory>) {
        *self.history.lock().unwrap() = history;
    }

    pub fn set_summary(&self, summary: WorkoutSummary) {
        *self.summary.lock().unwrap() = Some(summary);
    }

    pub fn set_routines(&self, routines: Vec<Routine>) {
        *self.routines.lock().unwrap() = routines;
    }

    pub fn upserts(&self) -> Vec<SetUpsert> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn stopped(&self) -> Vec<String> {
        self.stopped.lock().unwrap().clone()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl WorkoutApi for FakeApi {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        if password != "secret" {
            return Err(ApiError::Unauthorized);
        }
        Ok(LoginResponse {
            token: "token-123".to_string(),
            user: User {
                id: "u1".to_string(),
                name: "Ana".to_string(),
                email: email.to_string(),
            },
        })
    }

    async fn routines(&self, _user_id: &str) -> Result<Vec<Routine>> {
        Ok(self.routines.lock().unwrap().clone())
    }

    async fn create_workout(&self, training_ids: &[String]) -> Result<Workout> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let workout = Workout {
            id: self.next_id("w"),
            start_time: Utc::now(),
            end_time: None,
            training_ids: training_ids.to_vec(),
            sets: vec![],
        };
        *self.in_progress.lock().unwrap() = Some(workout.clone());
        Ok(workout)
    }

    async fn stop_workout(&self, workout_id: &str) -> Result<Workout> {
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut workout = self
            .in_progress
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ApiError::Status { status: 404, message: "Workout not found".to_string() })?;
        workout.end_time = Some(Utc::now());
        self.stopped.lock().unwrap().push(workout_id.to_string());
        Ok(workout)
    }

    async fn workout_in_progress(&self, _training_ids: &[String]) -> Result<Option<Workout>> {
        Ok(self.in_progress.lock().unwrap().clone())
    }

    async fn upsert_set(&self, _workout_id: &str, set: &SetUpsert) -> Result<PersistedSet> {
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.upserts.lock().unwrap().push(set.clone());
        Ok(PersistedSet {
            id: set.set_id.clone().unwrap_or_else(|| self.next_id("s")),
            exercise_id: set.exercise_id.clone(),
            reps: set.reps,
            load: set.load,
        })
    }

    async fn exercise_history(&self, _user_id: &str) -> Result<Vec<ExerciseHistory>> {
        Ok(self.history.lock().unwrap().clone())
    }

    async fn workout_summary(&self, _workout_id: &str, _training_id: &str) -> Result<WorkoutSummary> {
        self.summary
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::Status { status: 404, message: "no summary".to_string() })
    }
}
