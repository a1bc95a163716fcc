//! Post-workout summary classification

use crate::api::WorkoutSummary;

/// Change beyond which a workout counts as better or worse than the last one
const STEADY_BAND_PERCENT: f64 = 5.0;

/// Headline shown on the summary screen. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryCondition {
    FirstWorkout,
    PersonalRecord,
    Increased,
    Steady,
    Decreased,
}

impl SummaryCondition {
    pub fn emoji(&self) -> &'static str {
        match self {
            SummaryCondition::FirstWorkout => "🎉",
            SummaryCondition::PersonalRecord => "🏆",
            SummaryCondition::Increased => "📈",
            SummaryCondition::Steady => "➡",
            SummaryCondition::Decreased => "📉",
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            SummaryCondition::FirstWorkout => "First time doing this training!",
            SummaryCondition::PersonalRecord => "New personal record!",
            SummaryCondition::Increased => "More volume than last time",
            SummaryCondition::Steady => "Holding steady",
            SummaryCondition::Decreased => "Less volume than last time",
        }
    }
}

/// Percent change from the previous workout, `None` without a usable baseline
pub fn percent_change(total: f64, previous: Option<f64>) -> Option<f64> {
    previous
        .filter(|p| *p > 0.0)
        .map(|p| (total - p) / p * 100.0)
}

/// First match wins: first workout, then PR, then change against the previous one
pub fn classify(summary: &WorkoutSummary) -> SummaryCondition {
    if summary.workouts_of_same_type_count == 1 {
        return SummaryCondition::FirstWorkout;
    }

    if summary
        .all_time_best_volume
        .is_some_and(|best| summary.total_volume > best)
    {
        return SummaryCondition::PersonalRecord;
    }

    match percent_change(summary.total_volume, summary.previous_total_volume) {
        Some(pct) if pct > STEADY_BAND_PERCENT => SummaryCondition::Increased,
        Some(pct) if pct < -STEADY_BAND_PERCENT => SummaryCondition::Decreased,
        _ => SummaryCondition::Steady,
    }
}

/// Multi-line text for the summary screen
pub fn format_summary(summary: &WorkoutSummary) -> String {
    let condition = classify(summary);
    let mut text = format!("{} {}\n", condition.emoji(), condition.headline());

    if let Some(name) = &summary.training_name {
        text.push_str(&format!("\nTraining: {}", name));
    }
    text.push_str(&format!("\nTotal volume: {:.0} kg", summary.total_volume));
    if let Some(pct) = percent_change(summary.total_volume, summary.previous_total_volume) {
        text.push_str(&format!(" ({:+.1}% vs last)", pct));
    }
    if let Some(best) = summary.all_time_best_volume {
        text.push_str(&format!("\nBest before: {:.0} kg", best));
    }
    if let Some(sets) = summary.total_sets {
        text.push_str(&format!("\nSets: {}", sets));
    }
    if let Some(secs) = summary.duration_seconds {
        text.push_str(&format!(
            "\nDuration: {}",
            crate::session::ElapsedTime::from_secs(secs)
        ));
    }
    text.push_str(&format!("\nTimes done: {}", summary.workouts_of_same_type_count));

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(total: f64, previous: Option<f64>, best: Option<f64>, count: u32) -> WorkoutSummary {
        WorkoutSummary {
            total_volume: total,
            previous_total_volume: previous,
            all_time_best_volume: best,
            workouts_of_same_type_count: count,
            training_name: None,
            duration_seconds: None,
            total_sets: None,
        }
    }

    #[test]
    fn test_first_workout_wins() {
        let s = summary(100.0, None, Some(50.0), 1);
        assert_eq!(classify(&s), SummaryCondition::FirstWorkout);

        let s = summary(100.0, Some(10.0), Some(50.0), 1);
        assert_eq!(classify(&s), SummaryCondition::FirstWorkout);
    }

    #[test]
    fn test_personal_record_beats_increase() {
        let s = summary(1000.0, Some(900.0), Some(950.0), 3);
        assert_eq!(classify(&s), SummaryCondition::PersonalRecord);
    }

    #[test]
    fn test_equal_to_best_is_not_record() {
        let s = summary(950.0, Some(900.0), Some(950.0), 3);
        assert_eq!(classify(&s), SummaryCondition::Increased);
    }

    #[test]
    fn test_within_band_is_steady() {
        let s = summary(1000.0, Some(1040.0), Some(1100.0), 5);
        let pct = percent_change(s.total_volume, s.previous_total_volume).unwrap();
        assert!((pct + 3.846).abs() < 0.01, "pct: {}", pct);
        assert_eq!(classify(&s), SummaryCondition::Steady);
    }

    #[test]
    fn test_increase_and_decrease() {
        assert_eq!(classify(&summary(1100.0, Some(1000.0), Some(1200.0), 4)), SummaryCondition::Increased);
        assert_eq!(classify(&summary(900.0, Some(1000.0), Some(1200.0), 4)), SummaryCondition::Decreased);
    }

    #[test]
    fn test_band_edges_are_steady() {
        assert_eq!(classify(&summary(1050.0, Some(1000.0), Some(2000.0), 4)), SummaryCondition::Steady);
        assert_eq!(classify(&summary(950.0, Some(1000.0), Some(2000.0), 4)), SummaryCondition::Steady);
    }

    #[test]
    fn test_no_baseline_is_steady() {
        assert_eq!(classify(&summary(500.0, None, None, 2)), SummaryCondition::Steady);
        assert_eq!(classify(&summary(500.0, Some(0.0), None, 2)), SummaryCondition::Steady);
        assert!(percent_change(500.0, Some(0.0)).is_none());
    }

    #[test]
    fn test_unknown_best_skips_record_check() {
        let s = summary(5000.0, Some(1000.0), None, 2);
        assert_eq!(classify(&s), SummaryCondition::Increased);
    }

    #[tokio::test]
    async fn test_classify_fetched_summary() {
        use crate::api::WorkoutApi;
        use crate::api::testing::FakeApi;

        let api = FakeApi::default();
        api.set_summary(summary(1000.0, Some(1040.0), Some(1100.0), 5));
        let fetched = api.workout_summary("w1", "A").await.unwrap();
        assert_eq!(classify(&fetched), SummaryCondition::Steady);
    }

    #[test]
    fn test_format_summary() {
        let mut s = summary(1000.0, Some(900.0), Some(950.0), 3);
        s.training_name = Some("Treino A".to_string());
        s.duration_seconds = Some(3725);

        let text = format_summary(&s);
        assert!(text.contains("New personal record!"));
        assert!(text.contains("Training: Treino A"));
        assert!(text.contains("(+11.1% vs last)"));
        assert!(text.contains("Duration: 1:02:05"));
    }
}
