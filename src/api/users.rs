use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult, ValidatedJson};
use crate::api::AppState;
use crate::auth::{jwt_auth_middleware, AuthUser, MessageResponse};
use crate::models::{
    ClientListQuery, ClientProfile, ClientSummary, Paginated, TrainerListQuery, TrainerListing,
    TrainerProfile, UpdateClientProfile, UpdateTrainerProfile, UpdateUser, User,
};
use crate::services::{ProfileService, UserService};

pub fn user_routes(state: AppState) -> Router {
    Router::new()
        .route("/me", get(get_me).put(update_me))
        .route("/me/trainer-profile", get(get_trainer_profile).put(update_trainer_profile))
        .route("/me/client-profile", get(get_client_profile).put(update_client_profile))
        .route("/trainers", get(list_trainers))
        .route("/clients", get(list_clients))
        .route("/clients/:client_id", get(get_client).delete(release_client))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

async fn get_me(State(users): State<UserService>, user: AuthUser) -> ApiResult<User> {
    Ok(ApiResponse::ok(users.get_user(user.user_id).await?))
}

#[tracing::instrument(skip(users, request), fields(user_id = %user.user_id))]
async fn update_me(
    State(users): State<UserService>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateUser>,
) -> ApiResult<User> {
    Ok(ApiResponse::ok(users.update_user(user.user_id, request).await?))
}

async fn get_trainer_profile(
    State(profiles): State<ProfileService>,
    user: AuthUser,
) -> ApiResult<TrainerProfile> {
    Ok(ApiResponse::ok(profiles.trainer_for(&user).await?))
}

#[tracing::instrument(skip(profiles, request), fields(user_id = %user.user_id))]
async fn update_trainer_profile(
    State(profiles): State<ProfileService>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateTrainerProfile>,
) -> ApiResult<TrainerProfile> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(profiles.update_trainer_profile(trainer.id, request).await?))
}

async fn get_client_profile(
    State(profiles): State<ProfileService>,
    user: AuthUser,
) -> ApiResult<ClientProfile> {
    Ok(ApiResponse::ok(profiles.client_for(&user).await?))
}

#[tracing::instrument(skip(profiles, request), fields(user_id = %user.user_id))]
async fn update_client_profile(
    State(profiles): State<ProfileService>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateClientProfile>,
) -> ApiResult<ClientProfile> {
    let client = profiles.client_for(&user).await?;
    Ok(ApiResponse::ok(profiles.update_client_profile(client.id, request).await?))
}

/// Trainer directory for clients looking for a coach
async fn list_trainers(
    State(profiles): State<ProfileService>,
    _user: AuthUser,
    Query(query): Query<TrainerListQuery>,
) -> ApiResult<Paginated<TrainerListing>> {
    Ok(ApiResponse::ok(profiles.list_trainers(query).await?))
}

async fn list_clients(
    State(profiles): State<ProfileService>,
    user: AuthUser,
    Query(query): Query<ClientListQuery>,
) -> ApiResult<Paginated<ClientSummary>> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(profiles.list_clients(trainer.id, query).await?))
}

async fn get_client(
    State(profiles): State<ProfileService>,
    user: AuthUser,
    Path(client_id): Path<Uuid>,
) -> ApiResult<ClientProfile> {
    let trainer = profiles.trainer_for(&user).await?;
    Ok(ApiResponse::ok(profiles.client_of_trainer(&trainer, client_id).await?))
}

#[tracing::instrument(skip(profiles), fields(user_id = %user.user_id))]
async fn release_client(
    State(profiles): State<ProfileService>,
    user: AuthUser,
    Path(client_id): Path<Uuid>,
) -> ApiResult<MessageResponse> {
    let trainer = profiles.trainer_for(&user).await?;
    profiles.release_client(&trainer, client_id).await?;
    Ok(ApiResponse::ok(MessageResponse {
        message: "Client released".to_string(),
    }))
}
