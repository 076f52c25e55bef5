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
    CreateNutritionPlanRequest, Paginated, PlanQuery, NutritionPlan, NutritionPlanDetail,
    UpdateNutritionPlanRequest,
};
use crate::services::{PlanService, ProfileService};

/// Nutrition plan templates owned by the calling trainer
pub fn nutrition_plan_routes(state: AppState) -> Router {
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
) -> ApiResult<Paginated<NutritionPlan>> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(plans.list_nutrition(trainer.id, query).await?))
}

#[tracing::instrument(skip(profiles, plans, request), fields(user_id = %user.user_id))]
async fn create_plan(
    State(profiles): State<ProfileService>,
    State(plans): State<PlanService>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateNutritionPlanRequest>,
) -> CreatedResult<NutritionPlanDetail> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::created(plans.create_nutrition(trainer.id, request).await?))
}

async fn get_plan(
    State(profiles): State<ProfileService>,
    State(plans): State<PlanService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<NutritionPlanDetail> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(plans.get_nutrition(trainer.id, id).await?))
}

#[tracing::instrument(skip(profiles, plans, request), fields(user_id = %user.user_id))]
async fn update_plan(
    State(profiles): State<ProfileService>,
    State(plans): State<PlanService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateNutritionPlanRequest>,
) -> ApiResult<NutritionPlanDetail> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(plans.update_nutrition(trainer.id, id, request).await?))
}

#[tracing::instrument(skip(profiles, plans), fields(user_id = %user.user_id))]
async fn delete_plan(
    State(profiles): State<ProfileService>,
    State(plans): State<PlanService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<MessageResponse> {
    let trainer = profiles.trainer_for(&user).await?;
    plans.delete_nutrition(trainer.id, id).await?;
    Ok(ApiResponse::ok(MessageResponse {
        message: "Nutrition plan deleted".to_string(),
    }))
}
