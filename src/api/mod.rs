// API routes and handlers

pub mod assignments;
pub mod auth;
pub mod coaching_requests;
pub mod daily_logs;
pub mod dashboard;
pub mod exercises;
pub mod health;
pub mod health_metrics;
pub mod meals;
pub mod nutrition_plans;
pub mod response;
pub mod routes;
pub mod todo_categories;
pub mod todos;
pub mod training_plans;
pub mod users;

use axum::extract::FromRef;
use sqlx::PgPool;
use std::time::Duration;

use crate::auth::{AuthService, RateLimiter};
use crate::config::AppConfig;
use crate::services::{
    AssignmentService, CoachingRequestService, DailyLogService, DashboardService,
    ExerciseService, HealthMetricService, MealService, PlanService, ProfileService,
    TodoCategoryService, TodoService, UserService,
};

/// Login/register attempts allowed per client address per minute
const CREDENTIAL_ATTEMPTS_PER_MINUTE: usize = 10;

/// Shared router state; handlers extract the piece they need via `FromRef`
#[derive(Clone, FromRef)]
pub struct AppState {
    pub db: PgPool,
    pub auth_service: AuthService,
    pub rate_limiter: RateLimiter,
    pub users: UserService,
    pub profiles: ProfileService,
    pub exercises: ExerciseService,
    pub meals: MealService,
    pub todos: TodoService,
    pub todo_categories: TodoCategoryService,
    pub plans: PlanService,
    pub assignments: AssignmentService,
    pub daily_logs: DailyLogService,
    pub health_metrics: HealthMetricService,
    pub coaching_requests: CoachingRequestService,
    pub dashboard: DashboardService,
}

impl AppState {
    pub fn new(db: PgPool, config: &AppConfig) -> Self {
        Self {
            auth_service: AuthService::with_token_lifetimes(
                db.clone(),
                &config.jwt_secret,
                config.access_token_ttl_minutes,
                config.refresh_token_ttl_days,
            ),
            rate_limiter: RateLimiter::new(CREDENTIAL_ATTEMPTS_PER_MINUTE, Duration::from_secs(60)),
            users: UserService::new(db.clone()),
            profiles: ProfileService::new(db.clone()),
            exercises: ExerciseService::new(db.clone()),
            meals: MealService::new(db.clone()),
            todos: TodoService::new(db.clone()),
            todo_categories: TodoCategoryService::new(db.clone()),
            plans: PlanService::new(db.clone()),
            assignments: AssignmentService::new(db.clone()),
            daily_logs: DailyLogService::new(db.clone()),
            health_metrics: HealthMetricService::new(db.clone()),
            coaching_requests: CoachingRequestService::new(db.clone()),
            dashboard: DashboardService::new(db.clone()),
            db,
        }
    }
}
