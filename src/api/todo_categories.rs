use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, put},
    Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult, CreatedResult, ValidatedJson};
use crate::api::AppState;
use crate::auth::{jwt_auth_middleware, AuthUser};
use crate::models::{
    CreateTodoCategoryRequest, TodoCategory, TodoCategoryWithCount, UpdateTodoCategoryRequest,
};
use crate::services::TodoCategoryService;

#[derive(Debug, Serialize)]
struct CategoryDeleted {
    message: String,
    detached_todos: u64,
}

pub fn category_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:id", put(update_category).delete(delete_category))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

async fn list_categories(
    State(categories): State<TodoCategoryService>,
    user: AuthUser,
) -> ApiResult<Vec<TodoCategoryWithCount>> {
    Ok(ApiResponse::ok(categories.list(user.user_id).await?))
}

async fn create_category(
    State(categories): State<TodoCategoryService>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateTodoCategoryRequest>,
) -> CreatedResult<TodoCategory> {
    Ok(ApiResponse::created(categories.create(user.user_id, request).await?))
}

async fn update_category(
    State(categories): State<TodoCategoryService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateTodoCategoryRequest>,
) -> ApiResult<TodoCategory> {
    Ok(ApiResponse::ok(categories.update(user.user_id, id, request).await?))
}

#[tracing::instrument(skip(categories), fields(user_id = %user.user_id))]
async fn delete_category(
    State(categories): State<TodoCategoryService>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<CategoryDeleted> {
    let detached_todos = categories.delete(user.user_id, id).await?;
    Ok(ApiResponse::ok(CategoryDeleted {
        message: "Category deleted".to_string(),
        detached_todos,
    }))
}
