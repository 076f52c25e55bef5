use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    optional_text, require_text, CreateMealRequest, Meal, MealQuery, MealType, Paginated,
    Pagination, UpdateMealRequest,
};

const MEAL_COLUMNS: &str =
    "id, trainer_profile_id, name, description, meal_type, calories, protein_g, carbs_g, fat_g, created_at, updated_at";

#[derive(Clone)]
pub struct MealService {
    db: PgPool,
}

impl MealService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, trainer_profile_id: Uuid, request: CreateMealRequest) -> AppResult<Meal> {
        let name = require_text("name", &request.name)?;

        let meal = sqlx::query_as::<_, Meal>(&format!(
            r#"
            INSERT INTO meals (id, trainer_profile_id, name, description, meal_type, calories, protein_g, carbs_g, fat_g)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(trainer_profile_id)
        .bind(name)
        .bind(request.description)
        .bind(request.meal_type.unwrap_or(MealType::Lunch))
        .bind(request.calories)
        .bind(request.protein_g.unwrap_or(0.0))
        .bind(request.carbs_g.unwrap_or(0.0))
        .bind(request.fat_g.unwrap_or(0.0))
        .fetch_one(&self.db)
        .await?;

        Ok(meal)
    }

    pub async fn get(&self, trainer_profile_id: Uuid, meal_id: Uuid) -> AppResult<Meal> {
        sqlx::query_as::<_, Meal>(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1 AND trainer_profile_id = $2"
        ))
        .bind(meal_id)
        .bind(trainer_profile_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound("Meal"))
    }

    pub async fn list(&self, trainer_profile_id: Uuid, query: MealQuery) -> AppResult<Paginated<Meal>> {
        let pagination = Pagination::new(query.page, query.limit);
        let pattern = query.q.map(|q| format!("%{}%", q.trim()));

        let filter = r#"
            trainer_profile_id = $1
            AND ($2::TEXT IS NULL OR name ILIKE $2)
            AND ($3::meal_type IS NULL OR meal_type = $3)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM meals WHERE {filter}"))
            .bind(trainer_profile_id)
            .bind(&pattern)
            .bind(query.meal_type)
            .fetch_one(&self.db)
            .await?;

        let meals = sqlx::query_as::<_, Meal>(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals WHERE {filter} ORDER BY name ASC LIMIT $4 OFFSET $5"
        ))
        .bind(trainer_profile_id)
        .bind(&pattern)
        .bind(query.meal_type)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated::new(meals, total, pagination))
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update(&self, trainer_profile_id: Uuid, meal_id: Uuid, request: UpdateMealRequest) -> AppResult<Meal> {
        let name = optional_text("name", request.name.as_deref())?;

        sqlx::query_as::<_, Meal>(&format!(
            r#"
            UPDATE meals
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                meal_type = COALESCE($5, meal_type),
                calories = COALESCE($6, calories),
                protein_g = COALESCE($7, protein_g),
                carbs_g = COALESCE($8, carbs_g),
                fat_g = COALESCE($9, fat_g),
                updated_at = NOW()
            WHERE id = $1 AND trainer_profile_id = $2
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(meal_id)
        .bind(trainer_profile_id)
        .bind(name)
        .bind(request.description)
        .bind(request.meal_type)
        .bind(request.calories)
        .bind(request.protein_g)
        .bind(request.carbs_g)
        .bind(request.fat_g)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound("Meal"))
    }

    /// Meals used by a nutrition plan cannot be removed
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, trainer_profile_id: Uuid, meal_id: Uuid) -> AppResult<()> {
        let meal = self.get(trainer_profile_id, meal_id).await?;

        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM nutrition_plan_items WHERE meal_id = $1)",
        )
        .bind(meal.id)
        .fetch_one(&self.db)
        .await?;

        if in_use {
            return Err(AppError::Conflict("Meal is used by a nutrition plan".to_string()));
        }

        sqlx::query("DELETE FROM meals WHERE id = $1")
            .bind(meal.id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    pub async fn count(&self, trainer_profile_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM meals WHERE trainer_profile_id = $1")
            .bind(trainer_profile_id)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}
