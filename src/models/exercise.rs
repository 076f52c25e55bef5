use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "difficulty_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exercise {
    pub id: Uuid,
    pub trainer_profile_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
    pub difficulty: Difficulty,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateExerciseRequest {
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 60))]
    pub muscle_group: Option<String>,
    #[validate(length(max = 120))]
    pub equipment: Option<String>,
    pub difficulty: Option<Difficulty>,
    #[validate(url(message = "must be a valid URL"))]
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateExerciseRequest {
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 60))]
    pub muscle_group: Option<String>,
    #[validate(length(max = 120))]
    pub equipment: Option<String>,
    pub difficulty: Option<Difficulty>,
    #[validate(url(message = "must be a valid URL"))]
    pub video_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseQuery {
    pub q: Option<String>,
    pub muscle_group: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
