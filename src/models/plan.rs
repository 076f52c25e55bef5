use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Difficulty, MealType};

/// Which family of plan a template or assignment belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    Training,
    Nutrition,
}

impl PlanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanKind::Training => "training",
            PlanKind::Nutrition => "nutrition",
        }
    }

    pub fn template_table(&self) -> &'static str {
        match self {
            PlanKind::Training => "training_plans",
            PlanKind::Nutrition => "nutrition_plans",
        }
    }

    pub fn assignment_table(&self) -> &'static str {
        match self {
            PlanKind::Training => "assigned_training_plans",
            PlanKind::Nutrition => "assigned_nutrition_plans",
        }
    }

    /// Column on `daily_logs` that links a log to an assignment of this kind
    pub fn daily_log_column(&self) -> &'static str {
        match self {
            PlanKind::Training => "assigned_training_plan_id",
            PlanKind::Nutrition => "assigned_nutrition_plan_id",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlanKind::Training => "Training plan",
            PlanKind::Nutrition => "Nutrition plan",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrainingPlan {
    pub id: Uuid,
    pub trainer_profile_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub duration_days: i32,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrainingPlanItem {
    pub id: Uuid,
    pub training_plan_id: Uuid,
    pub exercise_id: Uuid,
    pub exercise_name: String,
    pub day_number: i32,
    pub sets: Option<i32>,
    pub reps: Option<i32>,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingPlanDetail {
    #[serde(flatten)]
    pub plan: TrainingPlan,
    pub items: Vec<TrainingPlanItem>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TrainingPlanItemInput {
    pub exercise_id: Uuid,
    pub day_number: i32,
    #[validate(range(min = 1, max = 100, message = "must be between 1 and 100"))]
    pub sets: Option<i32>,
    #[validate(range(min = 1, max = 1000, message = "must be between 1 and 1000"))]
    pub reps: Option<i32>,
    #[validate(range(min = 0, max = 3600, message = "must be between 0 and 3600"))]
    pub rest_seconds: Option<i32>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTrainingPlanRequest {
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 365, message = "must be between 1 and 365"))]
    pub duration_days: i32,
    pub difficulty: Option<Difficulty>,
    #[validate(nested)]
    #[serde(default)]
    pub items: Vec<TrainingPlanItemInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTrainingPlanRequest {
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 365, message = "must be between 1 and 365"))]
    pub duration_days: Option<i32>,
    pub difficulty: Option<Difficulty>,
    /// When present, replaces the full item list
    #[validate(nested)]
    pub items: Option<Vec<TrainingPlanItemInput>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NutritionPlan {
    pub id: Uuid,
    pub trainer_profile_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub duration_days: i32,
    pub daily_calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NutritionPlanItem {
    pub id: Uuid,
    pub nutrition_plan_id: Uuid,
    pub meal_id: Uuid,
    pub meal_name: String,
    pub meal_type: MealType,
    pub day_number: i32,
    pub meal_time: Option<String>,
    pub servings: f64,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NutritionPlanDetail {
    #[serde(flatten)]
    pub plan: NutritionPlan,
    pub items: Vec<NutritionPlanItem>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NutritionPlanItemInput {
    pub meal_id: Uuid,
    pub day_number: i32,
    #[validate(length(max = 20))]
    pub meal_time: Option<String>,
    #[validate(range(min = 0.1, max = 20.0, message = "must be between 0.1 and 20"))]
    pub servings: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateNutritionPlanRequest {
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 365, message = "must be between 1 and 365"))]
    pub duration_days: i32,
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"))]
    pub daily_calories: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub protein_g: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub carbs_g: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub fat_g: Option<f64>,
    #[validate(nested)]
    #[serde(default)]
    pub items: Vec<NutritionPlanItemInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateNutritionPlanRequest {
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 365, message = "must be between 1 and 365"))]
    pub duration_days: Option<i32>,
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"))]
    pub daily_calories: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub protein_g: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub carbs_g: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub fat_g: Option<f64>,
    #[validate(nested)]
    pub items: Option<Vec<NutritionPlanItemInput>>,
}

#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_kind_tables() {
        assert_eq!(PlanKind::Training.assignment_table(), "assigned_training_plans");
        assert_eq!(PlanKind::Nutrition.template_table(), "nutrition_plans");
        assert_eq!(PlanKind::Nutrition.daily_log_column(), "assigned_nutrition_plan_id");
    }

    #[test]
    fn test_plan_kind_from_path_segment() {
        let kind: PlanKind = serde_json::from_str("\"training\"").unwrap();
        assert_eq!(kind, PlanKind::Training);
        assert!(serde_json::from_str::<PlanKind>("\"cardio\"").is_err());
    }
}
