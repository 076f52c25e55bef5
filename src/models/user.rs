use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::auth::UserRole;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 120, message = "must be between 1 and 120 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<UserRole>,
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrainerProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bio: Option<String>,
    pub specialties: Vec<String>,
    pub years_experience: Option<i32>,
    pub hourly_rate: Option<f64>,
    pub accepting_clients: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTrainerProfile {
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    pub specialties: Option<Vec<String>>,
    #[validate(range(min = 0, max = 80, message = "must be between 0 and 80"))]
    pub years_experience: Option<i32>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub hourly_rate: Option<f64>,
    pub accepting_clients: Option<bool>,
}

/// Public directory entry for a trainer
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TrainerListing {
    pub trainer_profile_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub specialties: Vec<String>,
    pub years_experience: Option<i32>,
    pub hourly_rate: Option<f64>,
    pub accepting_clients: bool,
    pub client_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct TrainerListQuery {
    pub q: Option<String>,
    pub specialty: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub trainer_profile_id: Option<Uuid>,
    pub date_of_birth: Option<NaiveDate>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub fitness_goal: Option<String>,
    pub activity_level: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClientProfile {
    pub date_of_birth: Option<NaiveDate>,
    #[validate(range(min = 50.0, max = 272.0, message = "must be between 50 and 272 cm"))]
    pub height_cm: Option<f64>,
    #[validate(range(min = 20.0, max = 400.0, message = "must be between 20 and 400 kg"))]
    pub weight_kg: Option<f64>,
    #[validate(length(max = 500))]
    pub fitness_goal: Option<String>,
    #[validate(length(max = 50))]
    pub activity_level: Option<String>,
}

/// A trainer's view of one of their clients
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClientSummary {
    pub client_profile_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub fitness_goal: Option<String>,
    pub active_training_plan: Option<String>,
    pub active_nutrition_plan: Option<String>,
    pub last_log_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ClientListQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
