//! Set ledger - recorded sets of one exercise during a workout
//!
//! A set is only "done" once the server has persisted it. Any edit that
//! changes load or reps drops it back to unconfirmed.

use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{self, PersistedSet, SetUpsert, WorkoutApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Index,
    Load,
    Reps,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Index => "set",
            Field::Load => "load",
            Field::Reps => "reps",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
    Missing,
    NotANumber,
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub problem: Problem,
}

impl FieldError {
    /// Inline message shown under the input
    pub fn message(&self) -> &'static str {
        match (self.field, self.problem) {
            (Field::Load, Problem::Missing) => "Enter the load",
            (Field::Reps, Problem::Missing) => "Enter the reps",
            (Field::Load, _) => "Load must be a number",
            (Field::Reps, _) => "Reps must be a whole number",
            (Field::Index, _) => "No such set",
        }
    }
}

/// Rejected set input, one entry per failing field
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid set: {}", describe(.errors))]
pub struct InvalidSet {
    pub errors: Vec<FieldError>,
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} ({})", e.field, e.message()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl InvalidSet {
    pub fn has(&self, field: Field) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetEntry {
    /// Server id, `None` until first persisted
    pub id: Option<String>,
    pub exercise_id: String,
    /// 1-based position within the exercise
    pub index: u32,
    pub load: f64,
    pub reps: u32,
    pub confirmed: bool,
    revision: u64,
}

impl SetEntry {
    pub fn volume(&self) -> f64 {
        self.load * self.reps as f64
    }
}

/// Snapshot of an entry taken when a confirmation request goes out
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConfirm {
    pub index: u32,
    pub request: SetUpsert,
    revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    AlreadyConfirmed,
    /// Entry changed while the request was in flight; it stays unconfirmed
    Superseded,
}

fn parse_load(raw: &str) -> Result<f64, Problem> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Problem::Missing);
    }
    let load: f64 = raw.replace(',', ".").parse().map_err(|_| Problem::NotANumber)?;
    if !load.is_finite() || load < 0.0 {
        return Err(Problem::OutOfRange);
    }
    Ok(load)
}

fn parse_reps(raw: &str) -> Result<u32, Problem> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Problem::Missing);
    }
    raw.parse().map_err(|_| Problem::NotANumber)
}

pub struct SetLedger {
    exercise_id: String,
    set_count: u32,
    entries: Vec<Option<SetEntry>>,
    next_revision: u64,
}

impl SetLedger {
    pub fn new(exercise_id: impl Into<String>, set_count: u32) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            set_count,
            entries: vec![None; set_count as usize],
            next_revision: 0,
        }
    }

    pub fn exercise_id(&self) -> &str {
        &self.exercise_id
    }

    pub fn set_count(&self) -> u32 {
        self.set_count
    }

    pub fn entry(&self, index: u32) -> Option<&SetEntry> {
        self.slot(index).and_then(|slot| self.entries[slot].as_ref())
    }

    /// Recorded entries in index order
    pub fn entries(&self) -> impl Iterator<Item = &SetEntry> {
        self.entries.iter().flatten()
    }

    pub fn done_count(&self) -> usize {
        self.entries().filter(|e| e.confirmed).count()
    }

    pub fn is_complete(&self) -> bool {
        self.done_count() == self.set_count as usize
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|e| *e = None);
    }

    fn slot(&self, index: u32) -> Option<usize> {
        (index >= 1 && index <= self.set_count).then(|| (index - 1) as usize)
    }

    fn bump_revision(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }

    /// Validate raw inputs and store them as the entry at `index`.
    ///
    /// Changing the values of a confirmed entry unconfirms it; re-entering the
    /// same values leaves it as it was.
    pub fn record_attempt(&mut self, index: u32, load: &str, reps: &str) -> Result<&SetEntry, InvalidSet> {
        let mut errors = Vec::new();

        let slot = self.slot(index);
        if slot.is_none() {
            errors.push(FieldError { field: Field::Index, problem: Problem::OutOfRange });
        }
        let load = parse_load(load)
            .map_err(|problem| errors.push(FieldError { field: Field::Load, problem }))
            .ok();
        let reps = parse_reps(reps)
            .map_err(|problem| errors.push(FieldError { field: Field::Reps, problem }))
            .ok();

        let (Some(slot), Some(load), Some(reps)) = (slot, load, reps) else {
            return Err(InvalidSet { errors });
        };

        let unchanged = self.entries[slot]
            .as_ref()
            .is_some_and(|e| e.load == load && e.reps == reps);

        if !unchanged {
            let revision = self.bump_revision();
            let id = self.entries[slot].as_ref().and_then(|e| e.id.clone());
            self.entries[slot] = Some(SetEntry {
                id,
                exercise_id: self.exercise_id.clone(),
                index,
                load,
                reps,
                confirmed: false,
                revision,
            });
            debug!("{} set {}: {} x {}", self.exercise_id, index, load, reps);
        }

        match &self.entries[slot] {
            Some(entry) => Ok(entry),
            None => Err(InvalidSet { errors }),
        }
    }

    /// Take a snapshot for persisting. `None` if there is nothing to send
    /// (no entry, or it is already confirmed).
    pub fn begin_confirm(&self, index: u32) -> Option<PendingConfirm> {
        let entry = self.entry(index)?;
        if entry.confirmed {
            return None;
        }
        Some(PendingConfirm {
            index,
            request: SetUpsert {
                exercise_id: entry.exercise_id.clone(),
                reps: entry.reps,
                load: entry.load,
                set_id: entry.id.clone(),
            },
            revision: entry.revision,
        })
    }

    /// Apply a server response to the entry it was taken from.
    ///
    /// The server id is always kept so a later retry updates instead of
    /// creating a duplicate; `confirmed` is set only if the entry is unchanged.
    pub fn apply_confirm(&mut self, pending: &PendingConfirm, persisted: PersistedSet) -> ConfirmOutcome {
        let Some(entry) = self.slot(pending.index).and_then(|slot| self.entries[slot].as_mut()) else {
            return ConfirmOutcome::Superseded;
        };

        entry.id = Some(persisted.id);
        if entry.revision != pending.revision {
            debug!("{} set {} edited in flight, stays unconfirmed", entry.exercise_id, entry.index);
            return ConfirmOutcome::Superseded;
        }

        entry.confirmed = true;
        ConfirmOutcome::Confirmed
    }

    /// Persist the entry at `index` and mark it confirmed on success.
    ///
    /// On failure the entry keeps its input and stays unconfirmed.
    pub async fn confirm(
        &mut self,
        api: &dyn WorkoutApi,
        workout_id: &str,
        index: u32,
    ) -> Result<ConfirmOutcome, ConfirmError> {
        let pending = match self.begin_confirm(index) {
            Some(pending) => pending,
            None if self.entry(index).is_some() => return Ok(ConfirmOutcome::AlreadyConfirmed),
            None => return Err(ConfirmError::NotRecorded(index)),
        };

        match api.upsert_set(workout_id, &pending.request).await {
            Ok(persisted) => Ok(self.apply_confirm(&pending, persisted)),
            Err(e) => {
                warn!("Failed to save {} set {}: {}", self.exercise_id, index, e);
                Err(ConfirmError::Api(e))
            }
        }
    }

    /// Seed an entry already persisted on the server (resumed workout)
    pub fn restore(&mut self, index: u32, set: PersistedSet) -> bool {
        let Some(slot) = self.slot(index) else {
            return false;
        };
        let revision = self.bump_revision();
        self.entries[slot] = Some(SetEntry {
            id: Some(set.id),
            exercise_id: self.exercise_id.clone(),
            index,
            load: set.load,
            reps: set.reps,
            confirmed: true,
            revision,
        });
        true
    }
}

#[derive(Debug, Error)]
pub enum ConfirmError {
    #[error("set {0} has no recorded values")]
    NotRecorded(u32),

    #[error(transparent)]
    Api(#[from] api::ApiError),
}
