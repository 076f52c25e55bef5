use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult, CreatedResult, ValidatedJson};
use crate::api::AppState;
use crate::auth::{jwt_auth_middleware, AuthUser, UserRole};
use crate::error::{AppError, AppResult};
use crate::models::{
    CoachingDecision, CoachingRequest, CoachingRequestQuery, CreateCoachingRequest,
};
use crate::services::{CoachingRequestService, ProfileService, RequestParty};

pub fn coaching_request_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_requests).post(create_request))
        .route("/:id/accept", post(accept_request))
        .route("/:id/reject", post(reject_request))
        .route("/:id/cancel", post(cancel_request))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

async fn party_for(profiles: &ProfileService, user: &AuthUser) -> AppResult<RequestParty> {
    match user.role {
        UserRole::Client => Ok(RequestParty::Client(profiles.client_for(user).await?.id)),
        UserRole::Trainer => Ok(RequestParty::Trainer(profiles.trainer_for(user).await?.id)),
        UserRole::Admin => Err(AppError::Forbidden(
            "Coaching requests are between clients and trainers",
        )),
    }
}

async fn list_requests(
    State(profiles): State<ProfileService>,
    State(requests): State<CoachingRequestService>,
    user: AuthUser,
    Query(query): Query<CoachingRequestQuery>,
) -> ApiResult<Vec<CoachingRequest>> {
    let party = party_for(&profiles, &user).await?;
    Ok(ApiResponse::ok(requests.list(party, query).await?))
}

#[tracing::instrument(skip(profiles, requests, request), fields(user_id = %user.user_id))]
async fn create_request(
    State(profiles): State<ProfileService>,
    State(requests): State<CoachingRequestService>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateCoachingRequest>,
) -> CreatedResult<CoachingRequest> {
    let client = profiles.client_for(&user).await?;
    Ok(ApiResponse::created(requests.create(&client, request).await?))
}

async fn decide(
    profiles: &ProfileService,
    requests: &CoachingRequestService,
    user: &AuthUser,
    id: Uuid,
    decision: CoachingDecision,
) -> ApiResult<CoachingRequest> {
    let party = party_for(profiles, user).await?;
    Ok(ApiResponse::ok(requests.decide(party, id, decision).await?))
}

async fn accept_request(
    State(profiles): State<ProfileService>,
    State(requests): State<CoachingRequestService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<CoachingRequest> {
    decide(&profiles, &requests, &user, id, CoachingDecision::Accept).await
}

async fn reject_request(
    State(profiles): State<ProfileService>,
    State(requests): State<CoachingRequestService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<CoachingRequest> {
    decide(&profiles, &requests, &user, id, CoachingDecision::Reject).await
}

async fn cancel_request(
    State(profiles): State<ProfileService>,
    State(requests): State<CoachingRequestService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<CoachingRequest> {
    decide(&profiles, &requests, &user, id, CoachingDecision::Cancel).await
}
