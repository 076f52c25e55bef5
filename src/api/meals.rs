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
use crate::models::{CreateMealRequest, Meal, MealQuery, Paginated, UpdateMealRequest};
use crate::services::{MealService, ProfileService};

pub fn meal_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_meals).post(create_meal))
        .route(
            "/:id",
            get(get_meal).put(update_meal).delete(delete_meal),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

async fn list_meals(
    State(profiles): State<ProfileService>,
    State(meals): State<MealService>,
    user: AuthUser,
    Query(query): Query<MealQuery>,
) -> ApiResult<Paginated<Meal>> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(meals.list(trainer.id, query).await?))
}

#[tracing::instrument(skip(profiles, meals, request), fields(user_id = %user.user_id))]
async fn create_meal(
    State(profiles): State<ProfileService>,
    State(meals): State<MealService>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateMealRequest>,
) -> CreatedResult<Meal> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::created(meals.create(trainer.id, request).await?))
}

async fn get_meal(
    State(profiles): State<ProfileService>,
    State(meals): State<MealService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Meal> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(meals.get(trainer.id, id).await?))
}

#[tracing::instrument(skip(profiles, meals, request), fields(user_id = %user.user_id))]
async fn update_meal(
    State(profiles): State<ProfileService>,
    State(meals): State<MealService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateMealRequest>,
) -> ApiResult<Meal> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(meals.update(trainer.id, id, request).await?))
}

#[tracing::instrument(skip(profiles, meals), fields(user_id = %user.user_id))]
async fn delete_meal(
    State(profiles): State<ProfileService>,
    State(meals): State<MealService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<MessageResponse> {
    let trainer = profiles.trainer_for(&user).await?;
    meals.delete(trainer.id, id).await?;
    Ok(ApiResponse::ok(MessageResponse {
        message: "Meal deleted".to_string(),
    }))
}
