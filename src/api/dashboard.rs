use axum::{extract::State, middleware, routing::get, Router};

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::AppState;
use crate::auth::{jwt_auth_middleware, AuthUser};
use crate::models::{ClientDashboard, TrainerDashboard};
use crate::services::{DashboardService, ProfileService};

pub fn dashboard_routes(state: AppState) -> Router {
    Router::new()
        .route("/trainer", get(trainer_dashboard))
        .route("/client", get(client_dashboard))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

async fn trainer_dashboard(
    State(profiles): State<ProfileService>,
    State(dashboard): State<DashboardService>,
    user: AuthUser,
) -> ApiResult<TrainerDashboard> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(dashboard.trainer(&trainer).await?))
}

async fn client_dashboard(
    State(profiles): State<ProfileService>,
    State(dashboard): State<DashboardService>,
    user: AuthUser,
) -> ApiResult<ClientDashboard> {
    let client = profiles.client_for(&user).await?;
    Ok(ApiResponse::ok(dashboard.client(&client).await?))
}
