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
use crate::models::{CreateExerciseRequest, Exercise, ExerciseQuery, Paginated, UpdateExerciseRequest};
use crate::services::{ExerciseService, ProfileService};

pub fn exercise_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_exercises).post(create_exercise))
        .route(
            "/:id",
            get(get_exercise).put(update_exercise).delete(delete_exercise),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

async fn list_exercises(
    State(profiles): State<ProfileService>,
    State(exercises): State<ExerciseService>,
    user: AuthUser,
    Query(query): Query<ExerciseQuery>,
) -> ApiResult<Paginated<Exercise>> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(exercises.list(trainer.id, query).await?))
}

#[tracing::instrument(skip(profiles, exercises, request), fields(user_id = %user.user_id))]
async fn create_exercise(
    State(profiles): State<ProfileService>,
    State(exercises): State<ExerciseService>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateExerciseRequest>,
) -> CreatedResult<Exercise> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::created(exercises.create(trainer.id, request).await?))
}

async fn get_exercise(
    State(profiles): State<ProfileService>,
    State(exercises): State<ExerciseService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Exercise> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(exercises.get(trainer.id, id).await?))
}

#[tracing::instrument(skip(profiles, exercises, request), fields(user_id = %user.user_id))]
async fn update_exercise(
    State(profiles): State<ProfileService>,
    State(exercises): State<ExerciseService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateExerciseRequest>,
) -> ApiResult<Exercise> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(exercises.update(trainer.id, id, request).await?))
}

#[tracing::instrument(skip(profiles, exercises), fields(user_id = %user.user_id))]
async fn delete_exercise(
    State(profiles): State<ProfileService>,
    State(exercises): State<ExerciseService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<MessageResponse> {
    let trainer = profiles.trainer_for(&user).await?;
    exercises.delete(trainer.id, id).await?;
    Ok(ApiResponse::ok(MessageResponse {
        message: "Exercise deleted".to_string(),
    }))
}
