use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult, ValidatedJson};
use crate::api::AppState;
use crate::auth::{
    admin_only_middleware, jwt_auth_middleware, rate_limit_middleware, token_from_headers,
    AuthResponse, AuthService, AuthUser, ChangePasswordRequest, LoginRequest, MessageResponse,
    RefreshTokenRequest, RegisterRequest, TokenResponse, UserInfo, SESSION_COOKIE,
};
use crate::error::AppResult;
use crate::models::{Paginated, UpdateRoleRequest, User, UserListQuery};
use crate::services::UserService;

/// Authentication routes
pub fn auth_routes(state: AppState) -> Router {
    let credentials = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));

    let session = Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/change-password", post(change_password))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ));

    credentials.merge(session).with_state(state)
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Register a new user
#[tracing::instrument(skip(auth_service, jar, request))]
async fn register(
    State(auth_service): State<AuthService>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<ApiResponse<AuthResponse>>)> {
    let response = auth_service.register(request).await?;
    let jar = jar.add(session_cookie(response.access_token.clone()));
    Ok((StatusCode::CREATED, jar, ApiResponse::ok(response)))
}

/// Login user
#[tracing::instrument(skip(auth_service, jar, request))]
async fn login(
    State(auth_service): State<AuthService>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<AuthResponse>>)> {
    let response = auth_service.login(request).await?;
    let jar = jar.add(session_cookie(response.access_token.clone()));
    Ok((jar, ApiResponse::ok(response)))
}

/// Refresh access token
#[tracing::instrument(skip(auth_service, request))]
async fn refresh_token(
    State(auth_service): State<AuthService>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<TokenResponse> {
    let response = auth_service.refresh_token(request).await?;
    Ok(ApiResponse::ok(response))
}

/// Logout user and clear the session cookie
#[tracing::instrument(skip(auth_service, headers, jar))]
async fn logout(
    State(auth_service): State<AuthService>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<ApiResponse<MessageResponse>>)> {
    let token = token_from_headers(&headers)?;
    let response = auth_service.logout(&token).await?;
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, ApiResponse::ok(response)))
}

async fn me(State(auth_service): State<AuthService>, user: AuthUser) -> ApiResult<UserInfo> {
    let info = auth_service.current_user(&user).await?;
    Ok(ApiResponse::ok(info))
}

/// Change user password
#[tracing::instrument(skip(auth_service, request), fields(user_id = %user.user_id))]
async fn change_password(
    State(auth_service): State<AuthService>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<MessageResponse> {
    let response = auth_service.change_password(&user, request).await?;
    Ok(ApiResponse::ok(response))
}

/// Admin endpoints
pub fn admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id/role", put(update_user_role))
        // the outer jwt layer runs first and inserts the session
        .route_layer(middleware::from_fn(admin_only_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

/// List all users (admin only)
async fn list_users(
    State(users): State<UserService>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Paginated<User>> {
    let page = users.list_users(query).await?;
    Ok(ApiResponse::ok(page))
}

/// Update user role (admin only)
#[tracing::instrument(skip(users, request))]
async fn update_user_role(
    State(users): State<UserService>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateRoleRequest>,
) -> ApiResult<User> {
    let user = users.update_role(user_id, request.role).await?;
    Ok(ApiResponse::ok(user))
}
