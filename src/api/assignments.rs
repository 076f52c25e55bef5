use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, patch},
    Router,
};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult, CreatedResult, ValidatedJson};
use crate::api::AppState;
use crate::auth::{jwt_auth_middleware, AuthUser};
use crate::models::{
    AssignPlanRequest, AssignmentWithProgress, PlanAssignment, PlanKind, PlanProgress,
    ReplacementOutcome, UpdateAssignmentStatusRequest,
};
use crate::services::{AssignmentService, ProfileService};

/// `/api/clients/:client_id/plans/:kind`
pub fn client_plan_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/:client_id/plans/:kind",
            get(current_plan).post(assign_plan).put(replace_plan),
        )
        .route("/:client_id/plans/:kind/history", get(plan_history))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

/// `/api/assignments/:kind/:id`
pub fn assignment_routes(state: AppState) -> Router {
    Router::new()
        .route("/:kind/:id/status", patch(update_status))
        .route("/:kind/:id/progress", get(assignment_progress))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

/// The client's open plan of this kind, or `null`
async fn current_plan(
    State(profiles): State<ProfileService>,
    State(assignments): State<AssignmentService>,
    user: AuthUser,
    Path((client_id, kind)): Path<(Uuid, PlanKind)>,
) -> ApiResult<Option<AssignmentWithProgress>> {
    let client = profiles.readable_client(&user, client_id).await?;
    Ok(ApiResponse::ok(assignments.current(client.id, kind).await?))
}

#[tracing::instrument(skip(profiles, assignments, request), fields(user_id = %user.user_id))]
async fn assign_plan(
    State(profiles): State<ProfileService>,
    State(assignments): State<AssignmentService>,
    user: AuthUser,
    Path((client_id, kind)): Path<(Uuid, PlanKind)>,
    ValidatedJson(request): ValidatedJson<AssignPlanRequest>,
) -> CreatedResult<AssignmentWithProgress> {
    let trainer = profiles.trainer_for(&user).await?;
    let client = profiles.client_of_trainer(&trainer, client_id).await?;
    let assignment = assignments.assign(&trainer, &client, kind, request).await?;
    Ok(ApiResponse::created(assignment))
}

#[tracing::instrument(skip(profiles, assignments, request), fields(user_id = %user.user_id))]
async fn replace_plan(
    State(profiles): State<ProfileService>,
    State(assignments): State<AssignmentService>,
    user: AuthUser,
    Path((client_id, kind)): Path<(Uuid, PlanKind)>,
    ValidatedJson(request): ValidatedJson<AssignPlanRequest>,
) -> ApiResult<ReplacementOutcome> {
    let trainer = profiles.trainer_for(&user).await?;
    let client = profiles.client_of_trainer(&trainer, client_id).await?;
    let outcome = assignments.replace(&trainer, &client, kind, request).await?;
    Ok(ApiResponse::ok(outcome))
}

async fn plan_history(
    State(profiles): State<ProfileService>,
    State(assignments): State<AssignmentService>,
    user: AuthUser,
    Path((client_id, kind)): Path<(Uuid, PlanKind)>,
) -> ApiResult<Vec<PlanAssignment>> {
    let client = profiles.readable_client(&user, client_id).await?;
    Ok(ApiResponse::ok(assignments.history(client.id, kind).await?))
}

#[tracing::instrument(skip(profiles, assignments, request), fields(user_id = %user.user_id))]
async fn update_status(
    State(profiles): State<ProfileService>,
    State(assignments): State<AssignmentService>,
    user: AuthUser,
    Path((kind, id)): Path<(PlanKind, Uuid)>,
    ValidatedJson(request): ValidatedJson<UpdateAssignmentStatusRequest>,
) -> ApiResult<PlanAssignment> {
    let assignment = assignments.get(kind, id).await?;
    profiles.readable_client(&user, assignment.client_profile_id).await?;
    let updated = assignments.update_status(kind, &assignment, request.status).await?;
    Ok(ApiResponse::ok(updated))
}

async fn assignment_progress(
    State(profiles): State<ProfileService>,
    State(assignments): State<AssignmentService>,
    user: AuthUser,
    Path((kind, id)): Path<(PlanKind, Uuid)>,
) -> ApiResult<PlanProgress> {
    let assignment = assignments.get(kind, id).await?;
    profiles.readable_client(&user, assignment.client_profile_id).await?;
    Ok(ApiResponse::ok(assignments.progress(kind, &assignment).await?))
}
