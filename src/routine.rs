//! Routines - dated programs of trainings assigned per weekday

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// One exercise inside a training, with its configured set count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingExercise {
    pub id: String,
    pub name: String,
    pub sets: u32,
    #[serde(default)]
    pub target_reps: Option<String>,
    #[serde(default)]
    pub rest_seconds: Option<u32>,
}

/// A single day's workout definition (e.g. "Treino A")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Training {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub weekdays: Vec<Weekday>,
    #[serde(default)]
    pub exercises: Vec<TrainingExercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub trainings: Vec<Training>,
}

impl Routine {
    /// Routine covers the date (end date inclusive, open-ended if missing)
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.is_none_or(|end| date <= end)
    }

    /// Trainings scheduled for a weekday, in routine order
    pub fn trainings_for(&self, weekday: Weekday) -> Vec<&Training> {
        self.trainings
            .iter()
            .filter(|t| t.weekdays.contains(&weekday))
            .collect()
    }
}

/// Pick the training to run on a date: first active routine with a training that weekday
pub fn training_for_date(routines: &[Routine], date: NaiveDate) -> Option<&Training> {
    use chrono::Datelike;

    routines
        .iter()
        .filter(|r| r.is_active_on(date))
        .find_map(|r| r.trainings_for(date.weekday()).into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(id: &str, sets: u32) -> TrainingExercise {
        TrainingExercise {
            id: id.to_string(),
            name: id.to_string(),
            sets,
            target_reps: None,
            rest_seconds: Some(90),
        }
    }

    fn training(id: &str, weekdays: Vec<Weekday>) -> Training {
        Training {
            id: id.to_string(),
            name: format!("Treino {}", id),
            weekdays,
            exercises: vec![exercise("bench", 3), exercise("row", 4)],
        }
    }

    fn routine(start: NaiveDate, end: Option<NaiveDate>) -> Routine {
        Routine {
            id: "r1".to_string(),
            name: "Hipertrofia".to_string(),
            start_date: start,
            end_date: end,
            trainings: vec![
                training("A", vec![Weekday::Mon, Weekday::Thu]),
                training("B", vec![Weekday::Tue, Weekday::Fri]),
            ],
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_active_range_inclusive() {
        let r = routine(date(2026, 3, 1), Some(date(2026, 3, 31)));
        assert!(r.is_active_on(date(2026, 3, 1)));
        assert!(r.is_active_on(date(2026, 3, 31)));
        assert!(!r.is_active_on(date(2026, 4, 1)));
        assert!(!r.is_active_on(date(2026, 2, 28)));
    }

    #[test]
    fn test_open_ended_routine() {
        let r = routine(date(2026, 3, 1), None);
        assert!(r.is_active_on(date(2030, 1, 1)));
    }

    #[test]
    fn test_training_for_weekday() {
        let routines = vec![routine(date(2026, 3, 1), None)];
        // 2026-03-02 is a Monday
        let t = training_for_date(&routines, date(2026, 3, 2)).unwrap();
        assert_eq!(t.id, "A");
        // 2026-03-03 is a Tuesday
        let t = training_for_date(&routines, date(2026, 3, 3)).unwrap();
        assert_eq!(t.id, "B");
        // Sunday - rest day
        assert!(training_for_date(&routines, date(2026, 3, 8)).is_none());
    }

    #[test]
    fn test_inactive_routine_ignored() {
        let routines = vec![routine(date(2026, 3, 1), Some(date(2026, 3, 15)))];
        assert!(training_for_date(&routines, date(2026, 3, 16)).is_none());
    }

    #[tokio::test]
    async fn test_fetched_routines_pick_today() {
        use crate::api::WorkoutApi;
        use crate::api::testing::FakeApi;

        let api = FakeApi::default();
        api.set_routines(vec![routine(date(2026, 3, 1), None)]);
        let routines = api.routines("u1").await.unwrap();
        // 2026-03-05 is a Thursday
        assert_eq!(training_for_date(&routines, date(2026, 3, 5)).unwrap().id, "A");
    }

    #[test]
    fn test_routine_deserialize() {
        let json = r#"{
            "id": "r1", "name": "Força", "startDate": "2026-03-01",
            "trainings": [{
                "id": "A", "name": "Treino A", "weekdays": ["Mon", "Wed"],
                "exercises": [{"id": "squat", "name": "Agachamento", "sets": 4, "restSeconds": 120}]
            }]
        }"#;
        let r: Routine = serde_json::from_str(json).unwrap();
        assert!(r.end_date.is_none());
        assert_eq!(r.trainings[0].weekdays, vec![Weekday::Mon, Weekday::Wed]);
        let squat = &r.trainings[0].exercises[0];
        assert_eq!((squat.id.as_str(), squat.sets, squat.rest_seconds), ("squat", 4, Some(120)));
    }
}
