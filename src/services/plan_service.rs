//! Training and nutrition plan templates.
//!
//! A template is owned by one trainer and carries an ordered list of items.
//! Writing a template always rewrites its whole item list inside the same
//! transaction as the header row.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    optional_text, require_text, validate_day_number, CreateNutritionPlanRequest,
    CreateTrainingPlanRequest, NutritionPlan, NutritionPlanDetail, NutritionPlanItem,
    NutritionPlanItemInput, Paginated, Pagination, PlanKind, PlanQuery, TrainingPlan,
    TrainingPlanDetail, TrainingPlanItem, TrainingPlanItemInput, UpdateNutritionPlanRequest,
    UpdateTrainingPlanRequest,
};

const TRAINING_COLUMNS: &str =
    "id, trainer_profile_id, title, description, duration_days, difficulty, created_at, updated_at";
const NUTRITION_COLUMNS: &str = "id, trainer_profile_id, title, description, duration_days, \
     daily_calories, protein_g, carbs_g, fat_g, created_at, updated_at";

#[derive(Clone)]
pub struct PlanService {
    db: PgPool,
}

impl PlanService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // Training templates

    #[tracing::instrument(skip(self, request))]
    pub async fn create_training(
        &self,
        trainer_profile_id: Uuid,
        request: CreateTrainingPlanRequest,
    ) -> AppResult<TrainingPlanDetail> {
        let title = require_text("title", &request.title)?;
        check_days(&request.items, request.duration_days, |item| item.day_number)?;

        let mut tx = self.db.begin().await?;
        ensure_owned(
            &mut tx,
            "exercises",
            request.items.iter().map(|item| item.exercise_id),
            trainer_profile_id,
        )
        .await?;

        let plan = sqlx::query_as::<_, TrainingPlan>(&format!(
            r#"
            INSERT INTO training_plans (id, trainer_profile_id, title, description, duration_days, difficulty)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TRAINING_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(trainer_profile_id)
        .bind(title)
        .bind(request.description)
        .bind(request.duration_days)
        .bind(request.difficulty.unwrap_or_default())
        .fetch_one(&mut *tx)
        .await?;

        write_training_items(&mut tx, plan.id, &request.items).await?;
        let items = training_items(&mut tx, plan.id).await?;
        tx.commit().await?;

        Ok(TrainingPlanDetail { plan, items })
    }

    pub async fn get_training(&self, trainer_profile_id: Uuid, plan_id: Uuid) -> AppResult<TrainingPlanDetail> {
        let mut conn = self.db.acquire().await?;
        let plan = find_training(&mut conn, trainer_profile_id, plan_id, false).await?;
        let items = training_items(&mut conn, plan.id).await?;
        Ok(TrainingPlanDetail { plan, items })
    }

    pub async fn list_training(
        &self,
        trainer_profile_id: Uuid,
        query: PlanQuery,
    ) -> AppResult<Paginated<TrainingPlan>> {
        let pagination = Pagination::new(query.page, query.limit);
        let pattern = query.q.map(|q| format!("%{}%", q.trim()));

        let total = count_templates(&self.db, PlanKind::Training, trainer_profile_id, &pattern).await?;
        let plans = sqlx::query_as::<_, TrainingPlan>(&format!(
            r#"
            SELECT {TRAINING_COLUMNS} FROM training_plans
            WHERE trainer_profile_id = $1 AND ($2::TEXT IS NULL OR title ILIKE $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(trainer_profile_id)
        .bind(&pattern)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated::new(plans, total, pagination))
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update_training(
        &self,
        trainer_profile_id: Uuid,
        plan_id: Uuid,
        request: UpdateTrainingPlanRequest,
    ) -> AppResult<TrainingPlanDetail> {
        let title = optional_text("title", request.title.as_deref())?;

        let mut tx = self.db.begin().await?;
        let current = find_training(&mut tx, trainer_profile_id, plan_id, true).await?;
        let duration_days = request.duration_days.unwrap_or(current.duration_days);

        match &request.items {
            Some(items) => {
                check_days(items, duration_days, |item| item.day_number)?;
                ensure_owned(
                    &mut tx,
                    "exercises",
                    items.iter().map(|item| item.exercise_id),
                    trainer_profile_id,
                )
                .await?;
            }
            None => ensure_items_fit(&mut tx, PlanKind::Training, current.id, duration_days).await?,
        }

        let plan = sqlx::query_as::<_, TrainingPlan>(&format!(
            r#"
            UPDATE training_plans
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                duration_days = $4,
                difficulty = COALESCE($5, difficulty),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TRAINING_COLUMNS}
            "#
        ))
        .bind(current.id)
        .bind(title)
        .bind(request.description)
        .bind(duration_days)
        .bind(request.difficulty)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(items) = &request.items {
            sqlx::query("DELETE FROM training_plan_items WHERE training_plan_id = $1")
                .bind(plan.id)
                .execute(&mut *tx)
                .await?;
            write_training_items(&mut tx, plan.id, items).await?;
        }

        let items = training_items(&mut tx, plan.id).await?;
        tx.commit().await?;

        Ok(TrainingPlanDetail { plan, items })
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_training(&self, trainer_profile_id: Uuid, plan_id: Uuid) -> AppResult<()> {
        self.delete_template(PlanKind::Training, trainer_profile_id, plan_id).await
    }

    // Nutrition templates

    #[tracing::instrument(skip(self, request))]
    pub async fn create_nutrition(
        &self,
        trainer_profile_id: Uuid,
        request: CreateNutritionPlanRequest,
    ) -> AppResult<NutritionPlanDetail> {
        let title = require_text("title", &request.title)?;
        check_days(&request.items, request.duration_days, |item| item.day_number)?;

        let mut tx = self.db.begin().await?;
        ensure_owned(
            &mut tx,
            "meals",
            request.items.iter().map(|item| item.meal_id),
            trainer_profile_id,
        )
        .await?;

        let plan = sqlx::query_as::<_, NutritionPlan>(&format!(
            r#"
            INSERT INTO nutrition_plans (id, trainer_profile_id, title, description, duration_days,
                                         daily_calories, protein_g, carbs_g, fat_g)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {NUTRITION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(trainer_profile_id)
        .bind(title)
        .bind(request.description)
        .bind(request.duration_days)
        .bind(request.daily_calories)
        .bind(request.protein_g)
        .bind(request.carbs_g)
        .bind(request.fat_g)
        .fetch_one(&mut *tx)
        .await?;

        write_nutrition_items(&mut tx, plan.id, &request.items).await?;
        let items = nutrition_items(&mut tx, plan.id).await?;
        tx.commit().await?;

        Ok(NutritionPlanDetail { plan, items })
    }

    pub async fn get_nutrition(&self, trainer_profile_id: Uuid, plan_id: Uuid) -> AppResult<NutritionPlanDetail> {
        let mut conn = self.db.acquire().await?;
        let plan = find_nutrition(&mut conn, trainer_profile_id, plan_id, false).await?;
        let items = nutrition_items(&mut conn, plan.id).await?;
        Ok(NutritionPlanDetail { plan, items })
    }

    pub async fn list_nutrition(
        &self,
        trainer_profile_id: Uuid,
        query: PlanQuery,
    ) -> AppResult<Paginated<NutritionPlan>> {
        let pagination = Pagination::new(query.page, query.limit);
        let pattern = query.q.map(|q| format!("%{}%", q.trim()));

        let total = count_templates(&self.db, PlanKind::Nutrition, trainer_profile_id, &pattern).await?;
        let plans = sqlx::query_as::<_, NutritionPlan>(&format!(
            r#"
            SELECT {NUTRITION_COLUMNS} FROM nutrition_plans
            WHERE trainer_profile_id = $1 AND ($2::TEXT IS NULL OR title ILIKE $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(trainer_profile_id)
        .bind(&pattern)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated::new(plans, total, pagination))
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update_nutrition(
        &self,
        trainer_profile_id: Uuid,
        plan_id: Uuid,
        request: UpdateNutritionPlanRequest,
    ) -> AppResult<NutritionPlanDetail> {
        let title = optional_text("title", request.title.as_deref())?;

        let mut tx = self.db.begin().await?;
        let current = find_nutrition(&mut tx, trainer_profile_id, plan_id, true).await?;
        let duration_days = request.duration_days.unwrap_or(current.duration_days);

        match &request.items {
            Some(items) => {
                check_days(items, duration_days, |item| item.day_number)?;
                ensure_owned(
                    &mut tx,
                    "meals",
                    items.iter().map(|item| item.meal_id),
                    trainer_profile_id,
                )
                .await?;
            }
            None => ensure_items_fit(&mut tx, PlanKind::Nutrition, current.id, duration_days).await?,
        }

        let plan = sqlx::query_as::<_, NutritionPlan>(&format!(
            r#"
            UPDATE nutrition_plans
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                duration_days = $4,
                daily_calories = COALESCE($5, daily_calories),
                protein_g = COALESCE($6, protein_g),
                carbs_g = COALESCE($7, carbs_g),
                fat_g = COALESCE($8, fat_g),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {NUTRITION_COLUMNS}
            "#
        ))
        .bind(current.id)
        .bind(title)
        .bind(request.description)
        .bind(duration_days)
        .bind(request.daily_calories)
        .bind(request.protein_g)
        .bind(request.carbs_g)
        .bind(request.fat_g)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(items) = &request.items {
            sqlx::query("DELETE FROM nutrition_plan_items WHERE nutrition_plan_id = $1")
                .bind(plan.id)
                .execute(&mut *tx)
                .await?;
            write_nutrition_items(&mut tx, plan.id, items).await?;
        }

        let items = nutrition_items(&mut tx, plan.id).await?;
        tx.commit().await?;

        Ok(NutritionPlanDetail { plan, items })
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_nutrition(&self, trainer_profile_id: Uuid, plan_id: Uuid) -> AppResult<()> {
        self.delete_template(PlanKind::Nutrition, trainer_profile_id, plan_id).await
    }

    async fn delete_template(&self, kind: PlanKind, trainer_profile_id: Uuid, plan_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let locked: Option<Uuid> = sqlx::query_scalar(&format!(
            "SELECT id FROM {} WHERE id = $1 AND trainer_profile_id = $2 FOR UPDATE",
            kind.template_table()
        ))
        .bind(plan_id)
        .bind(trainer_profile_id)
        .fetch_optional(&mut *tx)
        .await?;

        if locked.is_none() {
            return Err(AppError::NotFound(kind.label()));
        }

        let open: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE plan_id = $1 AND status IN ('assigned', 'active'))",
            kind.assignment_table()
        ))
        .bind(plan_id)
        .fetch_one(&mut *tx)
        .await?;

        if open {
            return Err(AppError::Conflict(format!(
                "{} is assigned to a client",
                kind.label()
            )));
        }

        // finished assignments still reference the template; the foreign key reports those as 409
        sqlx::query(&format!("DELETE FROM {} WHERE id = $1", kind.template_table()))
            .bind(plan_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn check_days<T>(items: &[T], duration_days: i32, day_number: impl Fn(&T) -> i32) -> AppResult<()> {
    items
        .iter()
        .try_for_each(|item| validate_day_number(day_number(item), duration_days))
}

async fn ensure_owned(
    conn: &mut PgConnection,
    table: &str,
    ids: impl Iterator<Item = Uuid>,
    trainer_profile_id: Uuid,
) -> AppResult<()> {
    let mut ids: Vec<Uuid> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(());
    }

    let owned: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {table} WHERE id = ANY($1) AND trainer_profile_id = $2"
    ))
    .bind(&ids)
    .bind(trainer_profile_id)
    .fetch_one(&mut *conn)
    .await?;

    if owned != ids.len() as i64 {
        return Err(AppError::field(
            "items",
            &format!("items reference {table} that do not exist or belong to another trainer"),
        ));
    }
    Ok(())
}

/// Shrinking a plan must not strand items past its new last day
async fn ensure_items_fit(
    conn: &mut PgConnection,
    kind: PlanKind,
    plan_id: Uuid,
    duration_days: i32,
) -> AppResult<()> {
    let (table, column) = match kind {
        PlanKind::Training => ("training_plan_items", "training_plan_id"),
        PlanKind::Nutrition => ("nutrition_plan_items", "nutrition_plan_id"),
    };

    let last_day: Option<i32> = sqlx::query_scalar(&format!(
        "SELECT MAX(day_number) FROM {table} WHERE {column} = $1"
    ))
    .bind(plan_id)
    .fetch_one(&mut *conn)
    .await?;

    match last_day {
        Some(day) => validate_day_number(day, duration_days).map_err(|_| {
            AppError::field(
                "duration_days",
                &format!("duration_days must cover existing items up to day {}", day),
            )
        }),
        None => Ok(()),
    }
}

async fn count_templates(
    db: &PgPool,
    kind: PlanKind,
    trainer_profile_id: Uuid,
    pattern: &Option<String>,
) -> AppResult<i64> {
    let total = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE trainer_profile_id = $1 AND ($2::TEXT IS NULL OR title ILIKE $2)",
        kind.template_table()
    ))
    .bind(trainer_profile_id)
    .bind(pattern)
    .fetch_one(db)
    .await?;
    Ok(total)
}

async fn find_training(
    conn: &mut PgConnection,
    trainer_profile_id: Uuid,
    plan_id: Uuid,
    lock: bool,
) -> AppResult<TrainingPlan> {
    sqlx::query_as::<_, TrainingPlan>(&format!(
        "SELECT {TRAINING_COLUMNS} FROM training_plans WHERE id = $1 AND trainer_profile_id = $2{}",
        if lock { " FOR UPDATE" } else { "" }
    ))
    .bind(plan_id)
    .bind(trainer_profile_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound("Training plan"))
}

async fn find_nutrition(
    conn: &mut PgConnection,
    trainer_profile_id: Uuid,
    plan_id: Uuid,
    lock: bool,
) -> AppResult<NutritionPlan> {
    sqlx::query_as::<_, NutritionPlan>(&format!(
        "SELECT {NUTRITION_COLUMNS} FROM nutrition_plans WHERE id = $1 AND trainer_profile_id = $2{}",
        if lock { " FOR UPDATE" } else { "" }
    ))
    .bind(plan_id)
    .bind(trainer_profile_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound("Nutrition plan"))
}

async fn write_training_items(
    conn: &mut PgConnection,
    plan_id: Uuid,
    items: &[TrainingPlanItemInput],
) -> AppResult<()> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO training_plan_items (id, training_plan_id, exercise_id, day_number, sets, reps, rest_seconds, notes, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(plan_id)
        .bind(item.exercise_id)
        .bind(item.day_number)
        .bind(item.sets)
        .bind(item.reps)
        .bind(item.rest_seconds)
        .bind(item.notes.as_deref())
        .bind(position as i32)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn write_nutrition_items(
    conn: &mut PgConnection,
    plan_id: Uuid,
    items: &[NutritionPlanItemInput],
) -> AppResult<()> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO nutrition_plan_items (id, nutrition_plan_id, meal_id, day_number, meal_time, servings, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(plan_id)
        .bind(item.meal_id)
        .bind(item.day_number)
        .bind(item.meal_time.as_deref())
        .bind(item.servings.unwrap_or(1.0))
        .bind(position as i32)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn training_items(conn: &mut PgConnection, plan_id: Uuid) -> AppResult<Vec<TrainingPlanItem>> {
    let items = sqlx::query_as::<_, TrainingPlanItem>(
        r#"
        SELECT i.id, i.training_plan_id, i.exercise_id, e.name AS exercise_name, i.day_number,
               i.sets, i.reps, i.rest_seconds, i.notes, i.position
        FROM training_plan_items i
        JOIN exercises e ON e.id = i.exercise_id
        WHERE i.training_plan_id = $1
        ORDER BY i.day_number ASC, i.position ASC
        "#,
    )
    .bind(plan_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(items)
}

async fn nutrition_items(conn: &mut PgConnection, plan_id: Uuid) -> AppResult<Vec<NutritionPlanItem>> {
    let items = sqlx::query_as::<_, NutritionPlanItem>(
        r#"
        SELECT i.id, i.nutrition_plan_id, i.meal_id, m.name AS meal_name, m.meal_type, i.day_number,
               i.meal_time, i.servings, i.position
        FROM nutrition_plan_items i
        JOIN meals m ON m.id = i.meal_id
        WHERE i.nutrition_plan_id = $1
        ORDER BY i.day_number ASC, i.position ASC
        "#,
    )
    .bind(plan_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_days_rejects_out_of_range_items() {
        let days = vec![1, 3, 7];
        assert!(check_days(&days, 7, |d| *d).is_ok());
        assert!(check_days(&days, 6, |d| *d).is_err());
        assert!(check_days(&[0], 7, |d: &i32| *d).is_err());
        assert!(check_days::<i32>(&[], 1, |d| *d).is_ok());
    }
}
