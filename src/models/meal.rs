use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "meal_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub trainer_profile_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub meal_type: MealType,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMealRequest {
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub meal_type: Option<MealType>,
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"))]
    pub calories: f64,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub protein_g: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub carbs_g: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub fat_g: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateMealRequest {
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub meal_type: Option<MealType>,
    #[validate(range(min = 0.0, max = 10000.0, message = "must be between 0 and 10000"))]
    pub calories: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub protein_g: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub carbs_g: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub fat_g: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct MealQuery {
    pub q: Option<String>,
    pub meal_type: Option<MealType>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
