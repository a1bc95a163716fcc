//! Session clock - elapsed workout time, ticking once per second

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::debug;

const TICK: Duration = Duration::from_secs(1);

/// Elapsed time split into h/m/s
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElapsedTime {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl ElapsedTime {
    pub fn from_secs(total: u64) -> Self {
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    /// Whole seconds between `from` and `now`, zero if `from` is in the future
    pub fn since(from: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let secs = (now - from).num_seconds().max(0) as u64;
        Self::from_secs(secs)
    }

    pub fn total_secs(&self) -> u64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }

    /// Advance one second, carrying into minutes then hours
    pub fn tick(&mut self) {
        self.seconds += 1;
        if self.seconds == 60 {
            self.seconds = 0;
            self.minutes += 1;
            if self.minutes == 60 {
                self.minutes = 0;
                self.hours += 1;
            }
        }
    }
}

impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hours > 0 {
            write!(f, "{}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
        } else {
            write!(f, "{}:{:02}", self.minutes, self.seconds)
        }
    }
}

/// Owns the one recurring timer of a workout.
///
/// The tick task lives from `start` until `stop` or drop, whichever comes
/// first. Observers read the current value through [`SessionClock::subscribe`].
pub struct SessionClock {
    elapsed: Arc<watch::Sender<ElapsedTime>>,
    ticker: Option<JoinHandle<()>>,
}

impl SessionClock {
    pub fn new() -> Self {
        let (elapsed, _) = watch::channel(ElapsedTime::default());
        Self {
            elapsed: Arc::new(elapsed),
            ticker: None,
        }
    }

    /// Start ticking from a workout start time. Returns false if already running.
    pub fn start(&mut self, from: DateTime<Utc>) -> bool {
        self.start_at(from, Utc::now())
    }

    pub fn start_at(&mut self, from: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        if self.is_running() {
            debug!("Clock already running, start ignored");
            return false;
        }

        let initial = ElapsedTime::since(from, now);
        self.elapsed.send_replace(initial);

        let elapsed = Arc::clone(&self.elapsed);
        self.ticker = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
            loop {
                ticker.tick().await;
                elapsed.send_modify(ElapsedTime::tick);
            }
        }));

        debug!("Clock started at {}", initial);
        true
    }

    /// Stop ticking and release the timer task. Returns false if not running.
    pub fn stop(&mut self) -> bool {
        match self.ticker.take() {
            Some(handle) => {
                handle.abort();
                debug!("Clock stopped at {}", self.elapsed());
                true
            }
            None => false,
        }
    }

    /// Stop and zero the counter for a new session
    pub fn reset(&mut self) {
        self.stop();
        self.elapsed.send_replace(ElapsedTime::default());
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn elapsed(&self) -> ElapsedTime {
        *self.elapsed.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ElapsedTime> {
        self.elapsed.subscribe()
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}
