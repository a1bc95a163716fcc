//! Workout session controller
//!
//! NotStarted -> InProgress -> Stopped. Every transition goes through the
//! server first; if the call fails the state is left exactly as it was.

pub mod clock;
pub mod ledger;

pub use clock::{ElapsedTime, SessionClock};
pub use ledger::{ConfirmError, ConfirmOutcome, Field, FieldError, InvalidSet, SetEntry, SetLedger};

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::{ApiError, Workout, WorkoutApi};
use crate::progress::HistoryEpoch;
use crate::routine::Training;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    NotStarted,
    InProgress(Workout),
    Stopped(Workout),
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::NotStarted => "not started",
            SessionState::InProgress(_) => "in progress",
            SessionState::Stopped(_) => "finished",
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no workout in progress")]
    NotActive,

    #[error("a workout is already in progress")]
    AlreadyActive,

    #[error("exercise {0} is not part of this training")]
    UnknownExercise(String),

    #[error("set {0} has no recorded values")]
    NotRecorded(u32),

    #[error(transparent)]
    Invalid(#[from] InvalidSet),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<ConfirmError> for SessionError {
    fn from(error: ConfirmError) -> Self {
        match error {
            ConfirmError::NotRecorded(index) => SessionError::NotRecorded(index),
            ConfirmError::Api(e) => SessionError::Api(e),
        }
    }
}

pub struct SessionController {
    api: Arc<dyn WorkoutApi>,
    training: Training,
    state: SessionState,
    clock: SessionClock,
    /// One ledger per exercise, in training order
    ledgers: Vec<SetLedger>,
    history: HistoryEpoch,
}

impl SessionController {
    pub fn new(api: Arc<dyn WorkoutApi>, training: Training, history: HistoryEpoch) -> Self {
        let ledgers = training
            .exercises
            .iter()
            .map(|e| SetLedger::new(e.id.clone(), e.sets))
            .collect();

        Self {
            api,
            training,
            state: SessionState::NotStarted,
            clock: SessionClock::new(),
            ledgers,
            history,
        }
    }

    pub fn training(&self) -> &Training {
        &self.training
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn workout(&self) -> Option<&Workout> {
        match &self.state {
            SessionState::InProgress(w) | SessionState::Stopped(w) => Some(w),
            SessionState::NotStarted => None,
        }
    }

    /// Set inputs accept edits only while a workout runs
    pub fn is_editable(&self) -> bool {
        matches!(self.state, SessionState::InProgress(_))
    }

    pub fn elapsed(&self) -> ElapsedTime {
        self.clock.elapsed()
    }

    pub fn subscribe_clock(&self) -> watch::Receiver<ElapsedTime> {
        self.clock.subscribe()
    }

    pub fn ledgers(&self) -> &[SetLedger] {
        &self.ledgers
    }

    pub fn ledger(&self, exercise_id: &str) -> Option<&SetLedger> {
        self.ledgers.iter().find(|l| l.exercise_id() == exercise_id)
    }

    /// Volume of confirmed sets so far
    pub fn confirmed_volume(&self) -> f64 {
        self.ledgers
            .iter()
            .flat_map(|l| l.entries())
            .filter(|e| e.confirmed)
            .map(|e| e.volume())
            .sum()
    }

    fn training_ids(&self) -> Vec<String> {
        vec![self.training.id.clone()]
    }

    fn active_workout_id(&self) -> Result<String, SessionError> {
        match &self.state {
            SessionState::InProgress(w) => Ok(w.id.clone()),
            _ => Err(SessionError::NotActive),
        }
    }

    /// Pick up a workout left open on the server. Returns true if one was resumed.
    pub async fn resume(&mut self) -> Result<bool, SessionError> {
        match self.state {
            SessionState::InProgress(_) => return Ok(true),
            SessionState::Stopped(_) => return Ok(false),
            SessionState::NotStarted => {}
        }

        let Some(workout) = self.api.workout_in_progress(&self.training_ids()).await? else {
            return Ok(false);
        };

        for set in &workout.sets {
            let Some(ledger) = self.ledgers.iter_mut().find(|l| l.exercise_id() == set.exercise_id) else {
                warn!("Resumed set for unknown exercise {}", set.exercise_id);
                continue;
            };
            let index = ledger.entries().count() as u32 + 1;
            if !ledger.restore(index, set.clone()) {
                warn!("Resumed set {} of {} exceeds set count", index, set.exercise_id);
            }
        }

        self.clock.start(workout.start_time);
        info!("Resumed workout {} started at {}", workout.id, workout.start_time);
        self.state = SessionState::InProgress(workout);
        Ok(true)
    }

    /// Create a workout on the server and start the clock from its start time
    pub async fn start(&mut self) -> Result<&Workout, SessionError> {
        if self.is_editable() {
            return Err(SessionError::AlreadyActive);
        }

        let workout = self.api.create_workout(&self.training_ids()).await?;

        if matches!(self.state, SessionState::Stopped(_)) {
            self.ledgers.iter_mut().for_each(SetLedger::clear);
            self.clock.reset();
        }

        self.clock.start(workout.start_time);
        info!("Workout {} started ({})", workout.id, self.training.name);
        self.state = SessionState::InProgress(workout);

        self.workout().ok_or(SessionError::NotActive)
    }

    /// Finalize the workout on the server, then freeze the clock
    pub async fn stop(&mut self) -> Result<&Workout, SessionError> {
        let workout_id = self.active_workout_id()?;

        let finished = self.api.stop_workout(&workout_id).await?;

        self.clock.stop();
        self.history.bump();
        info!("Workout {} stopped after {}", workout_id, self.clock.elapsed());
        self.state = SessionState::Stopped(finished);

        self.workout().ok_or(SessionError::NotActive)
    }

    pub fn record_set(
        &mut self,
        exercise_id: &str,
        index: u32,
        load: &str,
        reps: &str,
    ) -> Result<&SetEntry, SessionError> {
        if !self.is_editable() {
            return Err(SessionError::NotActive);
        }
        let ledger = self
            .ledgers
            .iter_mut()
            .find(|l| l.exercise_id() == exercise_id)
            .ok_or_else(|| SessionError::UnknownExercise(exercise_id.to_string()))?;

        Ok(ledger.record_attempt(index, load, reps)?)
    }

    pub async fn confirm_set(&mut self, exercise_id: &str, index: u32) -> Result<ConfirmOutcome, SessionError> {
        let workout_id = self.active_workout_id()?;
        let ledger = self
            .ledgers
            .iter_mut()
            .find(|l| l.exercise_id() == exercise_id)
            .ok_or_else(|| SessionError::UnknownExercise(exercise_id.to_string()))?;

        Ok(ledger.confirm(self.api.as_ref(), &workout_id, index).await?)
    }
}
