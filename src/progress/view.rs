//! Progress view state - memoized series and stale-response filtering

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Local;
use tracing::debug;

use super::{ProgressSeries, aggregate};
use crate::api::{self, ExerciseHistory, WorkoutApi};

/// Generation counter for server-side history.
///
/// Bumped whenever a workout is finished, so any progress data fetched
/// before that point is known to be out of date.
#[derive(Debug, Clone, Default)]
pub struct HistoryEpoch(Arc<AtomicU64>);

impl HistoryEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// What the progress screen is currently showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressQuery {
    pub user_id: String,
    /// `None` for every exercise
    pub exercise_id: Option<String>,
}

/// Parameters a request was issued with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressTicket {
    query: ProgressQuery,
    epoch: u64,
}

impl ProgressTicket {
    pub fn query(&self) -> &ProgressQuery {
        &self.query
    }
}

struct Cached {
    ticket: ProgressTicket,
    series: ProgressSeries,
    exercises: Vec<(String, String)>,
}

pub struct ProgressView {
    epoch: HistoryEpoch,
    query: ProgressQuery,
    cached: Option<Cached>,
}

impl ProgressView {
    pub fn new(epoch: HistoryEpoch, query: ProgressQuery) -> Self {
        Self { epoch, query, cached: None }
    }

    pub fn query(&self) -> &ProgressQuery {
        &self.query
    }

    /// Switch what is shown; responses for the old query will be ignored
    pub fn set_query(&mut self, query: ProgressQuery) {
        self.query = query;
    }

    fn current_ticket(&self) -> ProgressTicket {
        ProgressTicket {
            query: self.query.clone(),
            epoch: self.epoch.current(),
        }
    }

    /// Cached series is for the current query and history generation
    pub fn is_fresh(&self) -> bool {
        self.cached
            .as_ref()
            .is_some_and(|c| c.ticket == self.current_ticket())
    }

    /// Series for the current query, if one has been accepted and is still fresh
    pub fn series(&self) -> Option<&ProgressSeries> {
        self.cached
            .as_ref()
            .filter(|c| c.ticket == self.current_ticket())
            .map(|c| &c.series)
    }

    /// (id, name) of every exercise in the last accepted response
    pub fn exercises(&self) -> &[(String, String)] {
        self.cached.as_ref().map_or(&[], |c| c.exercises.as_slice())
    }

    pub fn request(&self) -> ProgressTicket {
        self.current_ticket()
    }

    /// Store a response if it still matches what the view shows. Returns
    /// false when the response was superseded and dropped.
    pub fn accept(&mut self, ticket: ProgressTicket, history: &[ExerciseHistory]) -> bool {
        if ticket != self.current_ticket() {
            debug!("Dropping stale progress response for {:?}", ticket.query);
            return false;
        }

        let selected = history
            .iter()
            .filter(|h| {
                ticket
                    .query
                    .exercise_id
                    .as_deref()
                    .is_none_or(|id| h.exercise_id == id)
            })
            .flat_map(|h| h.workouts.iter());
        let series = aggregate(selected, &Local);

        let exercises = history
            .iter()
            .map(|h| (h.exercise_id.clone(), h.name.clone()))
            .collect();

        self.cached = Some(Cached { ticket, series, exercises });
        true
    }

    /// Fetch history unless the cached series is still fresh
    pub async fn refresh(&mut self, api: &dyn WorkoutApi) -> api::Result<&ProgressSeries> {
        if !self.is_fresh() {
            let ticket = self.request();
            let history = api.exercise_history(&ticket.query.user_id).await?;
            self.accept(ticket, &history);
        }

        Ok(self.series().unwrap_or(&EMPTY))
    }
}

static EMPTY: ProgressSeries = ProgressSeries {
    days: Vec::new(),
    max_load: 0.0,
    max_reps: 0.0,
    max_volume: 0.0,
};
