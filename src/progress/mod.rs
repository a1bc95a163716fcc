//! Progress aggregation - chart series from workout history
//!
//! Everything here is a pure function of its input. Days are calendar days
//! in the given time zone (the user's local zone in the app).

pub mod view;

pub use view::{HistoryEpoch, ProgressQuery, ProgressTicket, ProgressView};

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone};

use crate::api::HistoricalWorkout;

/// Average set of one calendar day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyAverage {
    pub date: NaiveDate,
    pub avg_load: f64,
    pub avg_reps: f64,
    /// Σ load × reps over the day
    pub volume: f64,
    pub sets: usize,
}

/// Point scaled to [0, 1] against the series maxima
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPoint {
    pub date: NaiveDate,
    pub load: f64,
    pub reps: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    NotEnoughData,
    Ready(Vec<NormalizedPoint>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSeries {
    /// Ascending by date
    pub days: Vec<DailyAverage>,
    pub max_load: f64,
    pub max_reps: f64,
    /// Largest daily volume
    pub max_volume: f64,
}

fn scale(value: f64, max: f64) -> f64 {
    if max > 0.0 { value / max } else { 0.0 }
}

impl ProgressSeries {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn normalized(&self) -> Vec<NormalizedPoint> {
        self.days
            .iter()
            .map(|d| NormalizedPoint {
                date: d.date,
                load: scale(d.avg_load, self.max_load),
                reps: scale(d.avg_reps, self.max_reps),
                volume: scale(d.volume, self.max_volume),
            })
            .collect()
    }

    /// Per-day total volume, ascending by date
    pub fn volume_series(&self) -> Vec<VolumePoint> {
        self.days
            .iter()
            .map(|d| VolumePoint { date: d.date, volume: d.volume })
            .collect()
    }

    pub fn chart(&self) -> Chart {
        if self.is_empty() {
            Chart::NotEnoughData
        } else {
            Chart::Ready(self.normalized())
        }
    }
}

/// Total volume of one day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumePoint {
    pub date: NaiveDate,
    pub volume: f64,
}

#[derive(Default)]
struct DayTotals {
    load: f64,
    reps: f64,
    volume: f64,
    sets: usize,
}

fn totals_by_day<'a, Tz, I>(workouts: I, tz: &Tz) -> BTreeMap<NaiveDate, DayTotals>
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a HistoricalWorkout>,
{
    let mut by_day: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();

    for workout in workouts {
        if workout.sets.is_empty() {
            continue;
        }
        let day = by_day
            .entry(workout.date.with_timezone(tz).date_naive())
            .or_default();
        for set in &workout.sets {
            day.load += set.load;
            day.reps += set.reps as f64;
            day.volume += set.volume();
            day.sets += 1;
        }
    }

    by_day
}

/// Per-day average load and reps with the day's volume, plus maxima over every
/// set in the input
pub fn aggregate<'a, Tz, I>(workouts: I, tz: &Tz) -> ProgressSeries
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a HistoricalWorkout> + Clone,
{
    let sets = || workouts.clone().into_iter().flat_map(|w| w.sets.iter());
    let max_load = sets().map(|s| s.load).fold(0.0, f64::max);
    let max_reps = sets().map(|s| s.reps as f64).fold(0.0, f64::max);

    let days: Vec<DailyAverage> = totals_by_day(workouts.clone(), tz)
        .into_iter()
        .map(|(date, t)| DailyAverage {
            date,
            avg_load: t.load / t.sets as f64,
            avg_reps: t.reps / t.sets as f64,
            volume: t.volume,
            sets: t.sets,
        })
        .collect();
    let max_volume = days.iter().map(|d| d.volume).fold(0.0, f64::max);

    ProgressSeries { days, max_load, max_reps, max_volume }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SetRecord;
    use chrono::{DateTime, FixedOffset, Utc};

    fn workout(at: &str, sets: &[(f64, u32)]) -> HistoricalWorkout {
        HistoricalWorkout {
            workout_id: at.to_string(),
            date: at.parse::<DateTime<Utc>>().unwrap(),
            sets: sets.iter().map(|&(load, reps)| SetRecord { load, reps }).collect(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_input() {
        let series = aggregate(&[] as &[HistoricalWorkout], &Utc);
        assert!(series.is_empty());
        assert_eq!(series.max_load, 0.0);
        assert_eq!(series.chart(), Chart::NotEnoughData);
        assert!(series.volume_series().is_empty());
    }

    #[test]
    fn test_single_point() {
        let workouts = vec![workout("2026-03-02T10:00:00Z", &[(60.0, 10)])];
        let series = aggregate(&workouts, &Utc);

        assert_eq!(series.days.len(), 1);
        assert_eq!(series.days[0].avg_load, 60.0);
        assert_eq!(series.days[0].avg_reps, 10.0);

        let points = series.normalized();
        assert_eq!(points[0].load, 1.0);
        assert_eq!(points[0].reps, 1.0);
    }

    #[test]
    fn test_same_day_workouts_averaged_together() {
        let workouts = vec![
            workout("2026-03-02T08:00:00Z", &[(60.0, 10), (70.0, 8)]),
            workout("2026-03-02T18:00:00Z", &[(80.0, 6)]),
            workout("2026-03-04T08:00:00Z", &[(50.0, 12)]),
        ];
        let series = aggregate(&workouts, &Utc);

        assert_eq!(series.days.len(), 2);
        assert_eq!(series.days[0].date, date(2026, 3, 2));
        assert_eq!(series.days[0].avg_load, 70.0);
        assert_eq!(series.days[0].avg_reps, 8.0);
        assert_eq!(series.days[0].sets, 3);
        assert_eq!(series.days[1].date, date(2026, 3, 4));
        assert_eq!(series.max_load, 80.0);
        assert_eq!(series.max_reps, 12.0);
    }

    #[test]
    fn test_days_sorted_regardless_of_input_order() {
        let workouts = vec![
            workout("2026-03-09T08:00:00Z", &[(65.0, 8)]),
            workout("2026-03-02T08:00:00Z", &[(60.0, 8)]),
        ];
        let series = aggregate(&workouts, &Utc);
        assert!(series.days[0].date < series.days[1].date);
    }

    #[test]
    fn test_grouping_uses_time_zone() {
        // 01:30 UTC on the 3rd is still the 2nd in UTC-3
        let workouts = vec![
            workout("2026-03-02T20:00:00Z", &[(60.0, 10)]),
            workout("2026-03-03T01:30:00Z", &[(80.0, 10)]),
        ];
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();

        let local = aggregate(&workouts, &brt);
        assert_eq!(local.days.len(), 1);
        assert_eq!(local.days[0].date, date(2026, 3, 2));

        let utc = aggregate(&workouts, &Utc);
        assert_eq!(utc.days.len(), 2);
    }

    #[test]
    fn test_zero_max_does_not_divide() {
        let workouts = vec![workout("2026-03-02T10:00:00Z", &[(0.0, 0)])];
        let series = aggregate(&workouts, &Utc);
        let points = series.normalized();
        assert_eq!(points[0].load, 0.0);
        assert_eq!(points[0].reps, 0.0);
        assert_eq!(points[0].volume, 0.0);
    }

    #[test]
    fn test_workouts_without_sets_skipped() {
        let workouts = vec![
            workout("2026-03-02T10:00:00Z", &[]),
            workout("2026-03-03T10:00:00Z", &[(40.0, 10)]),
        ];
        let series = aggregate(&workouts, &Utc);
        assert_eq!(series.days.len(), 1);
        assert_eq!(series.days[0].date, date(2026, 3, 3));
    }

    #[test]
    fn test_daily_volume() {
        let workouts = vec![
            workout("2026-03-05T08:00:00Z", &[(50.0, 12)]),
            workout("2026-03-02T08:00:00Z", &[(60.0, 10), (70.0, 8)]),
        ];
        let series = aggregate(&workouts, &Utc);
        assert_eq!(
            series.volume_series(),
            vec![
                VolumePoint { date: date(2026, 3, 2), volume: 1160.0 },
                VolumePoint { date: date(2026, 3, 5), volume: 600.0 },
            ]
        );
        assert_eq!(series.max_volume, 1160.0);

        let points = series.normalized();
        assert_eq!(points[0].volume, 1.0);
        assert!((points[1].volume - 600.0 / 1160.0).abs() < 1e-9);
    }
}
