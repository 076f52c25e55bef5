use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::auth::{admin_routes, auth_routes};
use super::health::{health_check, readiness_check};
use super::{
    assignments, coaching_requests, daily_logs, dashboard, exercises, health_metrics, meals,
    nutrition_plans, todo_categories, todos, training_plans, users,
};
use crate::api::AppState;
use crate::auth::{cors_layer, security_headers_layer};

pub fn create_routes(state: AppState, cors_origin: Option<&str>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check).with_state(state.db.clone()))
        .nest("/api/auth", auth_routes(state.clone()))
        .nest("/api/admin", admin_routes(state.clone()))
        .nest("/api/users", users::user_routes(state.clone()))
        .nest("/api/exercises", exercises::exercise_routes(state.clone()))
        .nest("/api/meals", meals::meal_routes(state.clone()))
        .nest("/api/todos", todos::todo_routes(state.clone()))
        .nest("/api/todo-categories", todo_categories::category_routes(state.clone()))
        .nest("/api/training-plans", training_plans::training_plan_routes(state.clone()))
        .nest("/api/nutrition-plans", nutrition_plans::nutrition_plan_routes(state.clone()))
        .nest("/api/clients", assignments::client_plan_routes(state.clone()))
        .nest("/api/assignments", assignments::assignment_routes(state.clone()))
        .nest("/api/daily-logs", daily_logs::daily_log_routes(state.clone()))
        .nest("/api/health-metrics", health_metrics::health_metric_routes(state.clone()))
        .nest("/api/coaching-requests", coaching_requests::coaching_request_routes(state.clone()))
        .nest("/api/dashboard", dashboard::dashboard_routes(state))
        .layer(security_headers_layer())
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
}
