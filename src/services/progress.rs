//! Derived plan statistics.
//!
//! Everything here is pure arithmetic over values already loaded from the
//! database so the rules can be exercised without a connection.

use chrono::NaiveDate;

use crate::models::{
    DailyLogEntry, LogEntryType, NutritionTargets, NutritionTotals, PlanProgress, PlanStatus,
    TargetAdherence,
};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Share of logs marked complete, as a percentage with two decimals
pub fn completion_percentage(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let completed = completed.clamp(0, total);
    round2(completed as f64 * 100.0 / total as f64)
}

/// 1-based plan day for `today`; 0 before the plan starts, never past the last day
pub fn current_day(start_date: NaiveDate, today: NaiveDate, duration_days: i32) -> i32 {
    if today < start_date || duration_days <= 0 {
        return 0;
    }
    let elapsed = (today - start_date).num_days() + 1;
    elapsed.min(duration_days as i64) as i32
}

pub fn days_remaining(start_date: NaiveDate, today: NaiveDate, duration_days: i32) -> i32 {
    if today < start_date {
        return duration_days.max(0);
    }
    (duration_days - current_day(start_date, today, duration_days)).max(0)
}

/// True once every plan day has elapsed
pub fn is_finished(start_date: NaiveDate, today: NaiveDate, duration_days: i32) -> bool {
    today >= start_date && (today - start_date).num_days() + 1 >= duration_days as i64
}

/// Last calendar day of a plan started on `start_date`
pub fn end_date(start_date: NaiveDate, duration_days: i32) -> NaiveDate {
    start_date + chrono::Duration::days((duration_days.max(1) - 1) as i64)
}

pub fn plan_progress(
    start_date: NaiveDate,
    today: NaiveDate,
    duration_days: i32,
    completed_logs: i64,
    total_logs: i64,
) -> PlanProgress {
    PlanProgress {
        current_day: current_day(start_date, today, duration_days),
        duration_days,
        days_remaining: days_remaining(start_date, today, duration_days),
        total_logs,
        completed_logs,
        completion_percentage: completion_percentage(completed_logs, total_logs),
    }
}

/// Status an open assignment is closed with when it gets replaced
pub fn closing_status(start_date: NaiveDate, today: NaiveDate, duration_days: i32) -> PlanStatus {
    if is_finished(start_date, today, duration_days) {
        PlanStatus::Completed
    } else {
        PlanStatus::Abandoned
    }
}

/// Share of finished assignments that were completed rather than abandoned
pub fn success_rate(completed: i64, abandoned: i64) -> Option<f64> {
    let finished = completed + abandoned;
    if finished <= 0 {
        return None;
    }
    Some(round2(completed as f64 * 100.0 / finished as f64))
}

/// Sum the macros of completed meal entries
pub fn nutrition_totals(entries: &[DailyLogEntry]) -> NutritionTotals {
    entries
        .iter()
        .filter(|entry| entry.entry_type == LogEntryType::Meal && entry.completed)
        .fold(NutritionTotals::default(), |mut totals, entry| {
            totals.calories += entry.calories.unwrap_or(0.0);
            totals.protein_g += entry.protein_g.unwrap_or(0.0);
            totals.carbs_g += entry.carbs_g.unwrap_or(0.0);
            totals.fat_g += entry.fat_g.unwrap_or(0.0);
            totals
        })
        .rounded()
}

impl NutritionTotals {
    fn rounded(self) -> Self {
        Self {
            calories: round2(self.calories),
            protein_g: round2(self.protein_g),
            carbs_g: round2(self.carbs_g),
            fat_g: round2(self.fat_g),
        }
    }
}

fn percent_of(actual: f64, target: Option<f64>) -> Option<f64> {
    match target {
        Some(target) if target > 0.0 => Some(round2(actual * 100.0 / target)),
        _ => None,
    }
}

pub fn target_adherence(totals: &NutritionTotals, targets: &NutritionTargets) -> TargetAdherence {
    TargetAdherence {
        calories_pct: percent_of(totals.calories, targets.daily_calories),
        protein_pct: percent_of(totals.protein_g, targets.protein_g),
        carbs_pct: percent_of(totals.carbs_g, targets.carbs_g),
        fat_pct: percent_of(totals.fat_g, targets.fat_g),
    }
}

/// Scale a meal's per-serving macros by the number of servings eaten
pub fn scale_macro(value: f64, servings: f64) -> f64 {
    round2(value * servings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn meal_entry(calories: f64, protein: f64, completed: bool) -> DailyLogEntry {
        DailyLogEntry {
            id: Uuid::new_v4(),
            daily_log_id: Uuid::new_v4(),
            entry_type: LogEntryType::Meal,
            meal_id: None,
            exercise_id: None,
            servings: 1.0,
            sets: None,
            reps: None,
            weight_kg: None,
            duration_minutes: None,
            calories: Some(calories),
            protein_g: Some(protein),
            carbs_g: None,
            fat_g: Some(10.0),
            completed,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_completion_percentage() {
        assert_eq!(completion_percentage(0, 0), 0.0);
        assert_eq!(completion_percentage(3, 4), 75.0);
        assert_eq!(completion_percentage(1, 3), 33.33);
        assert_eq!(completion_percentage(5, 5), 100.0);
        assert_eq!(completion_percentage(7, 5), 100.0);
    }

    #[test]
    fn test_current_day_before_start() {
        assert_eq!(current_day(date(2024, 5, 10), date(2024, 5, 9), 28), 0);
    }

    #[test]
    fn test_current_day_first_day_is_one() {
        assert_eq!(current_day(date(2024, 5, 10), date(2024, 5, 10), 28), 1);
        assert_eq!(current_day(date(2024, 5, 10), date(2024, 5, 16), 28), 7);
    }

    #[test]
    fn test_current_day_clamped_to_plan_length() {
        assert_eq!(current_day(date(2024, 1, 1), date(2024, 3, 1), 28), 28);
    }

    #[test]
    fn test_days_remaining() {
        assert_eq!(days_remaining(date(2024, 5, 10), date(2024, 5, 1), 14), 14);
        assert_eq!(days_remaining(date(2024, 5, 10), date(2024, 5, 10), 14), 13);
        assert_eq!(days_remaining(date(2024, 5, 10), date(2024, 6, 10), 14), 0);
    }

    #[test]
    fn test_end_date_is_inclusive() {
        assert_eq!(end_date(date(2024, 2, 1), 1), date(2024, 2, 1));
        assert_eq!(end_date(date(2024, 2, 1), 29), date(2024, 2, 29));
    }

    #[test]
    fn test_closing_status() {
        let start = date(2024, 4, 1);
        assert_eq!(closing_status(start, date(2024, 4, 5), 7), PlanStatus::Abandoned);
        assert_eq!(closing_status(start, date(2024, 4, 7), 7), PlanStatus::Completed);
        assert_eq!(closing_status(start, date(2024, 3, 30), 7), PlanStatus::Abandoned);
    }

    #[test]
    fn test_plan_progress() {
        let progress = plan_progress(date(2024, 4, 1), date(2024, 4, 10), 30, 6, 8);
        assert_eq!(
            progress,
            PlanProgress {
                current_day: 10,
                duration_days: 30,
                days_remaining: 20,
                total_logs: 8,
                completed_logs: 6,
                completion_percentage: 75.0,
            }
        );
    }

    #[test]
    fn test_success_rate() {
        assert_eq!(success_rate(0, 0), None);
        assert_eq!(success_rate(3, 1), Some(75.0));
        assert_eq!(success_rate(0, 2), Some(0.0));
    }

    #[test]
    fn test_nutrition_totals_skip_uncompleted_and_exercise_entries() {
        let mut exercise = meal_entry(500.0, 0.0, true);
        exercise.entry_type = LogEntryType::Exercise;

        let entries = vec![
            meal_entry(450.0, 30.0, true),
            meal_entry(300.5, 12.25, true),
            meal_entry(900.0, 50.0, false),
            exercise,
        ];

        let totals = nutrition_totals(&entries);
        assert_eq!(totals.calories, 750.5);
        assert_eq!(totals.protein_g, 42.25);
        assert_eq!(totals.carbs_g, 0.0);
        assert_eq!(totals.fat_g, 20.0);
    }

    #[test]
    fn test_target_adherence() {
        let totals = NutritionTotals {
            calories: 1500.0,
            protein_g: 90.0,
            carbs_g: 100.0,
            fat_g: 50.0,
        };
        let targets = NutritionTargets {
            daily_calories: Some(2000.0),
            protein_g: Some(120.0),
            carbs_g: None,
            fat_g: Some(0.0),
        };

        let adherence = target_adherence(&totals, &targets);
        assert_eq!(adherence.calories_pct, Some(75.0));
        assert_eq!(adherence.protein_pct, Some(75.0));
        assert_eq!(adherence.carbs_pct, None);
        assert_eq!(adherence.fat_pct, None);
    }

    #[test]
    fn test_scale_macro() {
        assert_eq!(scale_macro(250.0, 1.5), 375.0);
        assert_eq!(scale_macro(33.333, 1.0), 33.33);
    }
}
