use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    optional_text, reconcile_completion, require_text, CreateTodoRequest, Paginated, Pagination,
    Todo, TodoQuery, TodoStatus, UpdateTodoRequest,
};

const TODO_COLUMNS: &str = "id, user_id, category_id, title, description, completed, status, \
     priority, due_date, created_at, updated_at";

#[derive(Clone)]
pub struct TodoService {
    db: PgPool,
}

impl TodoService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn ensure_category(&self, user_id: Uuid, category_id: Option<Uuid>) -> AppResult<()> {
        let Some(category_id) = category_id else {
            return Ok(());
        };

        let owned: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM todo_categories WHERE id = $1 AND user_id = $2)",
        )
        .bind(category_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        if !owned {
            return Err(AppError::NotFound("Todo category"));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, user_id: Uuid, request: CreateTodoRequest) -> AppResult<Todo> {
        let title = require_text("title", &request.title)?;
        self.ensure_category(user_id, request.category_id).await?;

        let status = request.status.unwrap_or(TodoStatus::Pending);

        let todo = sqlx::query_as::<_, Todo>(&format!(
            r#"
            INSERT INTO todos (id, user_id, category_id, title, description, completed, status, priority, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(request.category_id)
        .bind(title)
        .bind(request.description)
        .bind(status == TodoStatus::Completed)
        .bind(status)
        .bind(request.priority.unwrap_or_default())
        .bind(request.due_date)
        .fetch_one(&self.db)
        .await?;

        Ok(todo)
    }

    pub async fn get(&self, user_id: Uuid, todo_id: Uuid) -> AppResult<Todo> {
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND user_id = $2"
        ))
        .bind(todo_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound("Todo"))
    }

    pub async fn list(&self, user_id: Uuid, query: TodoQuery) -> AppResult<Paginated<Todo>> {
        let pagination = Pagination::new(query.page, query.limit);
        let pattern = query.q.map(|q| format!("%{}%", q.trim()));

        let filter = r#"
            user_id = $1
            AND ($2::todo_status IS NULL OR status = $2)
            AND ($3::UUID IS NULL OR category_id = $3)
            AND ($4::BOOLEAN IS NULL OR completed = $4)
            AND ($5::TEXT IS NULL OR title ILIKE $5)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM todos WHERE {filter}"))
            .bind(user_id)
            .bind(query.status)
            .bind(query.category_id)
            .bind(query.completed)
            .bind(&pattern)
            .fetch_one(&self.db)
            .await?;

        let todos = sqlx::query_as::<_, Todo>(&format!(
            r#"
            SELECT {TODO_COLUMNS} FROM todos WHERE {filter}
            ORDER BY completed ASC, due_date ASC NULLS LAST, created_at DESC
            LIMIT $6 OFFSET $7
            "#
        ))
        .bind(user_id)
        .bind(query.status)
        .bind(query.category_id)
        .bind(query.completed)
        .bind(&pattern)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated::new(todos, total, pagination))
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update(&self, user_id: Uuid, todo_id: Uuid, request: UpdateTodoRequest) -> AppResult<Todo> {
        let current = self.get(user_id, todo_id).await?;
        let title = optional_text("title", request.title.as_deref())?;
        if let Some(Some(description)) = &request.description {
            if description.chars().count() > 2000 {
                return Err(AppError::field("description", "must be at most 2000 characters"));
            }
        }
        self.ensure_category(user_id, request.category_id.flatten()).await?;

        let (completed, status) = reconcile_completion(
            (current.completed, current.status),
            request.completed,
            request.status,
        );

        let todo = sqlx::query_as::<_, Todo>(&format!(
            r#"
            UPDATE todos
            SET title = COALESCE($3, title),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                category_id = CASE WHEN $6 THEN $7 ELSE category_id END,
                priority = COALESCE($8, priority),
                due_date = CASE WHEN $9 THEN $10 ELSE due_date END,
                completed = $11,
                status = $12,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(current.id)
        .bind(user_id)
        .bind(title)
        .bind(request.description.is_some())
        .bind(request.description.flatten())
        .bind(request.category_id.is_some())
        .bind(request.category_id.flatten())
        .bind(request.priority)
        .bind(request.due_date.is_some())
        .bind(request.due_date.flatten())
        .bind(completed)
        .bind(status)
        .fetch_one(&self.db)
        .await?;

        Ok(todo)
    }

    /// Flip the completed flag; status follows it
    #[tracing::instrument(skip(self))]
    pub async fn toggle(&self, user_id: Uuid, todo_id: Uuid) -> AppResult<Todo> {
        sqlx::query_as::<_, Todo>(&format!(
            r#"
            UPDATE todos
            SET completed = NOT completed,
                status = CASE WHEN completed THEN 'pending'::todo_status ELSE 'completed'::todo_status END,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(todo_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound("Todo"))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user_id: Uuid, todo_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
            .bind(todo_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Todo"));
        }
        Ok(())
    }

    pub async fn open_count(&self, user_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM todos WHERE user_id = $1 AND NOT completed")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}
