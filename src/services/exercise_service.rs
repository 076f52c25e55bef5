use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    optional_text, require_text, CreateExerciseRequest, Exercise, ExerciseQuery, Paginated,
    Pagination, UpdateExerciseRequest,
};

const EXERCISE_COLUMNS: &str = "id, trainer_profile_id, name, description, muscle_group, equipment, \
     difficulty, video_url, created_at, updated_at";

#[derive(Clone)]
pub struct ExerciseService {
    db: PgPool,
}

impl ExerciseService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, trainer_profile_id: Uuid, request: CreateExerciseRequest) -> AppResult<Exercise> {
        let name = require_text("name", &request.name)?;

        let exercise = sqlx::query_as::<_, Exercise>(&format!(
            r#"
            INSERT INTO exercises (id, trainer_profile_id, name, description, muscle_group, equipment, difficulty, video_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {EXERCISE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(trainer_profile_id)
        .bind(name)
        .bind(request.description)
        .bind(request.muscle_group.map(|m| m.trim().to_lowercase()))
        .bind(request.equipment)
        .bind(request.difficulty.unwrap_or_default())
        .bind(request.video_url)
        .fetch_one(&self.db)
        .await?;

        Ok(exercise)
    }

    pub async fn get(&self, trainer_profile_id: Uuid, exercise_id: Uuid) -> AppResult<Exercise> {
        sqlx::query_as::<_, Exercise>(&format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = $1 AND trainer_profile_id = $2"
        ))
        .bind(exercise_id)
        .bind(trainer_profile_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound("Exercise"))
    }

    pub async fn list(&self, trainer_profile_id: Uuid, query: ExerciseQuery) -> AppResult<Paginated<Exercise>> {
        let pagination = Pagination::new(query.page, query.limit);
        let pattern = query.q.map(|q| format!("%{}%", q.trim()));
        let muscle_group = query.muscle_group.map(|m| m.trim().to_lowercase());

        let filter = r#"
            trainer_profile_id = $1
            AND ($2::TEXT IS NULL OR name ILIKE $2)
            AND ($3::TEXT IS NULL OR muscle_group = $3)
            AND ($4::difficulty_level IS NULL OR difficulty = $4)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM exercises WHERE {filter}"))
            .bind(trainer_profile_id)
            .bind(&pattern)
            .bind(&muscle_group)
            .bind(query.difficulty)
            .fetch_one(&self.db)
            .await?;

        let exercises = sqlx::query_as::<_, Exercise>(&format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises WHERE {filter} ORDER BY name ASC LIMIT $5 OFFSET $6"
        ))
        .bind(trainer_profile_id)
        .bind(&pattern)
        .bind(&muscle_group)
        .bind(query.difficulty)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated::new(exercises, total, pagination))
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update(
        &self,
        trainer_profile_id: Uuid,
        exercise_id: Uuid,
        request: UpdateExerciseRequest,
    ) -> AppResult<Exercise> {
        let name = optional_text("name", request.name.as_deref())?;

        sqlx::query_as::<_, Exercise>(&format!(
            r#"
            UPDATE exercises
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                muscle_group = COALESCE($5, muscle_group),
                equipment = COALESCE($6, equipment),
                difficulty = COALESCE($7, difficulty),
                video_url = COALESCE($8, video_url),
                updated_at = NOW()
            WHERE id = $1 AND trainer_profile_id = $2
            RETURNING {EXERCISE_COLUMNS}
            "#
        ))
        .bind(exercise_id)
        .bind(trainer_profile_id)
        .bind(name)
        .bind(request.description)
        .bind(request.muscle_group.map(|m| m.trim().to_lowercase()))
        .bind(request.equipment)
        .bind(request.difficulty)
        .bind(request.video_url)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound("Exercise"))
    }

    /// Exercises used by a training plan cannot be removed
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, trainer_profile_id: Uuid, exercise_id: Uuid) -> AppResult<()> {
        let exercise = self.get(trainer_profile_id, exercise_id).await?;

        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM training_plan_items WHERE exercise_id = $1)",
        )
        .bind(exercise.id)
        .fetch_one(&self.db)
        .await?;

        if in_use {
            return Err(AppError::Conflict(
                "Exercise is used by a training plan".to_string(),
            ));
        }

        sqlx::query("DELETE FROM exercises WHERE id = $1")
            .bind(exercise.id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    pub async fn count(&self, trainer_profile_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM exercises WHERE trainer_profile_id = $1")
            .bind(trainer_profile_id)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}
