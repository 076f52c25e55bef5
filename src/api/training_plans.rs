use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult, CreatedResult, ValidatedJson};
use crate::api::AppState;
use crate::auth::{jwt_auth_middleware, AuthUser, MessageResponse};
use crate::models::{
    CreateTrainingPlanRequest, Paginated, PlanQuery, TrainingPlan, TrainingPlanDetail,
    UpdateTrainingPlanRequest,
};
use crate::services::{PlanService, ProfileService};

/// Training plan templates owned by the calling trainer
pub fn training_plan_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_plans).post(create_plan))
        .route("/:id", get(get_plan).put(update_plan).delete(delete_plan))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

async fn list_plans(
    State(profiles): State<ProfileService>,
    State(plans): State<PlanService>,
    user: AuthUser,
    Query(query): Query<PlanQuery>,
) -> ApiResult<Paginated<TrainingPlan>> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(plans.list_training(trainer.id, query).await?))
}

#[tracing::instrument(skip(profiles, plans, request), fields(user_id = %user.user_id))]
async fn create_plan(
    State(profiles): State<ProfileService>,
    State(plans): State<PlanService>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateTrainingPlanRequest>,
) -> CreatedResult<TrainingPlanDetail> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::created(plans.create_training(trainer.id, request).await?))
}

async fn get_plan(
    State(profiles): State<ProfileService>,
    State(plans): State<PlanService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<TrainingPlanDetail> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(plans.get_training(trainer.id, id).await?))
}

#[tracing::instrument(skip(profiles, plans, request), fields(user_id = %user.user_id))]
async fn update_plan(
    State(profiles): State<ProfileService>,
    State(plans): State<PlanService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateTrainingPlanRequest>,
) -> ApiResult<TrainingPlanDetail> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(plans.update_training(trainer.id, id, request).await?))
}

#[tracing::instrument(skip(profiles, plans), fields(user_id = %user.user_id))]
async fn delete_plan(
    State(profiles): State<ProfileService>,
    State(plans): State<PlanService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<MessageResponse> {
    let trainer = profiles.trainer_for(&user).await?;
    plans.delete_training(trainer.id, id).await?;
    Ok(ApiResponse::ok(MessageResponse {
        message: "Training plan deleted".to_string(),
    }))
}
