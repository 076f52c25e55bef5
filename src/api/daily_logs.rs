use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{delete, get, post},
    Router,
};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult, CreatedResult, ValidatedJson};
use crate::api::AppState;
use crate::auth::{jwt_auth_middleware, AuthUser, MessageResponse};
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateLogEntryRequest, DailyLog, DailyLogDetail, DailyLogEntry, DailyLogQuery, Paginated,
    UpdateDailyLogRequest, UpsertDailyLogRequest,
};
use crate::services::{DailyLogService, ProfileService};

pub fn daily_log_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_logs).post(upsert_log))
        .route("/:id", get(get_log).put(update_log).delete(delete_log))
        .route("/:id/entries", post(add_entry))
        .route("/:id/entries/:entry_id", delete(remove_entry))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

/// A log owned by the calling client; other clients' logs read as missing
async fn own_log(
    profiles: &ProfileService,
    daily_logs: &DailyLogService,
    user: &AuthUser,
    log_id: Uuid,
) -> AppResult<DailyLog> {
    let client = profiles.client_for(user).await?;
    let log = daily_logs.get(log_id).await?;
    if log.client_profile_id != client.id {
        return Err(AppError::NotFound("Daily log"));
    }
    Ok(log)
}

async fn list_logs(
    State(profiles): State<ProfileService>,
    State(daily_logs): State<DailyLogService>,
    user: AuthUser,
    Query(query): Query<DailyLogQuery>,
) -> ApiResult<Paginated<DailyLog>> {
    let client = profiles.resolve_client_scope(&user, query.client_id).await?;
    Ok(ApiResponse::ok(daily_logs.list(client.id, query).await?))
}

#[tracing::instrument(skip(profiles, daily_logs, request), fields(user_id = %user.user_id))]
async fn upsert_log(
    State(profiles): State<ProfileService>,
    State(daily_logs): State<DailyLogService>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<UpsertDailyLogRequest>,
) -> ApiResult<DailyLog> {
    let client = profiles.client_for(&user).await?;
    Ok(ApiResponse::ok(daily_logs.upsert(&client, request).await?))
}

/// Clients read their own logs; trainers read their clients' logs
async fn get_log(
    State(profiles): State<ProfileService>,
    State(daily_logs): State<DailyLogService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<DailyLogDetail> {
    let log = daily_logs.get(id).await?;
    profiles.readable_client(&user, log.client_profile_id).await?;
    Ok(ApiResponse::ok(daily_logs.detail(log).await?))
}

#[tracing::instrument(skip(profiles, daily_logs, request), fields(user_id = %user.user_id))]
async fn update_log(
    State(profiles): State<ProfileService>,
    State(daily_logs): State<DailyLogService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateDailyLogRequest>,
) -> ApiResult<DailyLog> {
    let log = own_log(&profiles, &daily_logs, &user, id).await?;
    Ok(ApiResponse::ok(daily_logs.update(&log, request).await?))
}

#[tracing::instrument(skip(profiles, daily_logs), fields(user_id = %user.user_id))]
async fn delete_log(
    State(profiles): State<ProfileService>,
    State(daily_logs): State<DailyLogService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<MessageResponse> {
    let log = own_log(&profiles, &daily_logs, &user, id).await?;
    daily_logs.delete(&log).await?;
    Ok(ApiResponse::ok(MessageResponse {
        message: "Daily log deleted".to_string(),
    }))
}

#[tracing::instrument(skip(profiles, daily_logs, request), fields(user_id = %user.user_id))]
async fn add_entry(
    State(profiles): State<ProfileService>,
    State(daily_logs): State<DailyLogService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateLogEntryRequest>,
) -> CreatedResult<DailyLogEntry> {
    let log = own_log(&profiles, &daily_logs, &user, id).await?;
    Ok(ApiResponse::created(daily_logs.add_entry(&log, request).await?))
}

async fn remove_entry(
    State(profiles): State<ProfileService>,
    State(daily_logs): State<DailyLogService>,
    user: AuthUser,
    Path((id, entry_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<MessageResponse> {
    let log = own_log(&profiles, &daily_logs, &user, id).await?;
    daily_logs.remove_entry(&log, entry_id).await?;
    Ok(ApiResponse::ok(MessageResponse {
        message: "Log entry removed".to_string(),
    }))
}
