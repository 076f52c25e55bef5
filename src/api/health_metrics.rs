use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{delete, get},
    Router,
};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult, CreatedResult, ValidatedJson};
use crate::api::AppState;
use crate::auth::{jwt_auth_middleware, AuthUser, MessageResponse};
use crate::models::{CreateHealthMetricRequest, HealthMetric, HealthMetricQuery, HealthMetricSummary};
use crate::services::{HealthMetricService, ProfileService};

pub fn health_metric_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_metrics).post(record_metric))
        .route("/summary", get(metric_summary))
        .route("/:id", delete(delete_metric))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

async fn list_metrics(
    State(profiles): State<ProfileService>,
    State(metrics): State<HealthMetricService>,
    user: AuthUser,
    Query(query): Query<HealthMetricQuery>,
) -> ApiResult<Vec<HealthMetric>> {
    let client = profiles.resolve_client_scope(&user, query.client_id).await?;
    Ok(ApiResponse::ok(metrics.list(client.id, &query).await?))
}

#[tracing::instrument(skip(profiles, metrics, request), fields(user_id = %user.user_id))]
async fn record_metric(
    State(profiles): State<ProfileService>,
    State(metrics): State<HealthMetricService>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateHealthMetricRequest>,
) -> CreatedResult<HealthMetric> {
    let client = profiles.client_for(&user).await?;
    Ok(ApiResponse::created(metrics.record(client.id, request).await?))
}

async fn metric_summary(
    State(profiles): State<ProfileService>,
    State(metrics): State<HealthMetricService>,
    user: AuthUser,
    Query(query): Query<HealthMetricQuery>,
) -> ApiResult<HealthMetricSummary> {
    let client = profiles.resolve_client_scope(&user, query.client_id).await?;
    Ok(ApiResponse::ok(metrics.summary(client.id, &query).await?))
}

async fn delete_metric(
    State(profiles): State<ProfileService>,
    State(metrics): State<HealthMetricService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<MessageResponse> {
    let client = profiles.client_for(&user).await?;
    metrics.delete(client.id, id).await?;
    Ok(ApiResponse::ok(MessageResponse {
        message: "Health metric deleted".to_string(),
    }))
}
