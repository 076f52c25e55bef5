use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "log_entry_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LogEntryType {
    Meal,
    Exercise,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyLog {
    pub id: Uuid,
    pub client_profile_id: Uuid,
    pub log_date: NaiveDate,
    pub assigned_training_plan_id: Option<Uuid>,
    pub assigned_nutrition_plan_id: Option<Uuid>,
    pub is_completed: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyLogEntry {
    pub id: Uuid,
    pub daily_log_id: Uuid,
    pub entry_type: LogEntryType,
    pub meal_id: Option<Uuid>,
    pub exercise_id: Option<Uuid>,
    pub servings: f64,
    pub sets: Option<i32>,
    pub reps: Option<i32>,
    pub weight_kg: Option<f64>,
    pub duration_minutes: Option<i32>,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Summed macros for a day
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct NutritionTotals {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Daily plan targets for the same macros
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, FromRow)]
pub struct NutritionTargets {
    pub daily_calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
}

/// Percentage of each target reached; `None` when the plan sets no target
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct TargetAdherence {
    pub calories_pct: Option<f64>,
    pub protein_pct: Option<f64>,
    pub carbs_pct: Option<f64>,
    pub fat_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyLogDetail {
    #[serde(flatten)]
    pub log: DailyLog,
    pub entries: Vec<DailyLogEntry>,
    pub totals: NutritionTotals,
    pub targets: Option<NutritionTargets>,
    pub adherence: Option<TargetAdherence>,
    pub exercises_completed: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpsertDailyLogRequest {
    pub log_date: Option<NaiveDate>,
    pub is_completed: Option<bool>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateDailyLogRequest {
    pub is_completed: Option<bool>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLogEntryRequest {
    pub entry_type: LogEntryType,
    pub meal_id: Option<Uuid>,
    pub exercise_id: Option<Uuid>,
    #[validate(range(min = 0.1, max = 20.0, message = "must be between 0.1 and 20"))]
    pub servings: Option<f64>,
    #[validate(range(min = 0, max = 100, message = "must be between 0 and 100"))]
    pub sets: Option<i32>,
    #[validate(range(min = 0, max = 1000, message = "must be between 0 and 1000"))]
    pub reps: Option<i32>,
    #[validate(range(min = 0.0, max = 1000.0, message = "must be between 0 and 1000"))]
    pub weight_kg: Option<f64>,
    #[validate(range(min = 0, max = 1440, message = "must be between 0 and 1440"))]
    pub duration_minutes: Option<i32>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub calories: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub protein_g: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub carbs_g: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub fat_g: Option<f64>,
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DailyLogQuery {
    /// Trainers pass the client whose logs they want
    pub client_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
