use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, patch},
    Router,
};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult, CreatedResult, ValidatedJson};
use crate::api::AppState;
use crate::auth::{jwt_auth_middleware, AuthUser, MessageResponse};
use crate::models::{CreateTodoRequest, Paginated, Todo, TodoQuery, UpdateTodoRequest};
use crate::services::TodoService;

pub fn todo_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/:id", get(get_todo).put(update_todo).delete(delete_todo))
        .route("/:id/toggle", patch(toggle_todo))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

async fn list_todos(
    State(todos): State<TodoService>,
    user: AuthUser,
    Query(query): Query<TodoQuery>,
) -> ApiResult<Paginated<Todo>> {
    Ok(ApiResponse::ok(todos.list(user.user_id, query).await?))
}

#[tracing::instrument(skip(todos, request), fields(user_id = %user.user_id))]
async fn create_todo(
    State(todos): State<TodoService>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateTodoRequest>,
) -> CreatedResult<Todo> {
    Ok(ApiResponse::created(todos.create(user.user_id, request).await?))
}

async fn get_todo(
    State(todos): State<TodoService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Todo> {
    Ok(ApiResponse::ok(todos.get(user.user_id, id).await?))
}

#[tracing::instrument(skip(todos, request), fields(user_id = %user.user_id))]
async fn update_todo(
    State(todos): State<TodoService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateTodoRequest>,
) -> ApiResult<Todo> {
    Ok(ApiResponse::ok(todos.update(user.user_id, id, request).await?))
}

async fn toggle_todo(
    State(todos): State<TodoService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Todo> {
    Ok(ApiResponse::ok(todos.toggle(user.user_id, id).await?))
}

async fn delete_todo(
    State(todos): State<TodoService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<MessageResponse> {
    todos.delete(user.user_id, id).await?;
    Ok(ApiResponse::ok(MessageResponse {
        message: "Todo deleted".to_string(),
    }))
}
