use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    optional_text, require_text, validate_color, CreateTodoCategoryRequest, TodoCategory,
    TodoCategoryWithCount, UpdateTodoCategoryRequest,
};

const CATEGORY_COLUMNS: &str = "id, user_id, name, color, created_at, updated_at";

#[derive(Clone)]
pub struct TodoCategoryService {
    db: PgPool,
}

impl TodoCategoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<TodoCategoryWithCount>> {
        let categories = sqlx::query_as::<_, TodoCategoryWithCount>(
            r#"
            SELECT c.id, c.name, c.color, COUNT(t.id) AS todo_count, c.created_at, c.updated_at
            FROM todo_categories c
            LEFT JOIN todos t ON t.category_id = c.id
            WHERE c.user_id = $1
            GROUP BY c.id
            ORDER BY c.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    /// Duplicate names per user are rejected by the unique index (409)
    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, user_id: Uuid, request: CreateTodoCategoryRequest) -> AppResult<TodoCategory> {
        let name = require_text("name", &request.name)?;
        if let Some(color) = request.color.as_deref() {
            validate_color(color)?;
        }

        let category = sqlx::query_as::<_, TodoCategory>(&format!(
            r#"
            INSERT INTO todo_categories (id, user_id, name, color)
            VALUES ($1, $2, $3, $4)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .bind(request.color)
        .fetch_one(&self.db)
        .await?;

        Ok(category)
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        request: UpdateTodoCategoryRequest,
    ) -> AppResult<TodoCategory> {
        let name = optional_text("name", request.name.as_deref())?;
        if let Some(color) = request.color.as_deref() {
            validate_color(color)?;
        }

        sqlx::query_as::<_, TodoCategory>(&format!(
            r#"
            UPDATE todo_categories
            SET name = COALESCE($3, name),
                color = COALESCE($4, color),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(category_id)
        .bind(user_id)
        .bind(name)
        .bind(request.color)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound("Todo category"))
    }

    /// Detach the category's todos, then remove it
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user_id: Uuid, category_id: Uuid) -> AppResult<u64> {
        let mut tx = self.db.begin().await?;

        let locked: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM todo_categories WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(category_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if locked.is_none() {
            return Err(AppError::NotFound("Todo category"));
        }

        let detached = sqlx::query(
            "UPDATE todos SET category_id = NULL, updated_at = NOW() WHERE category_id = $1 AND user_id = $2",
        )
        .bind(category_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM todo_categories WHERE id = $1")
            .bind(category_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(detached, "todo category deleted");
        Ok(detached)
    }
}
