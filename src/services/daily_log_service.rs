use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    ClientProfile, CreateLogEntryRequest, DailyLog, DailyLogDetail, DailyLogEntry, DailyLogQuery,
    LogEntryType, Meal, NutritionTargets, Paginated, Pagination, UpdateDailyLogRequest,
    UpsertDailyLogRequest,
};
use crate::services::progress;

const LOG_COLUMNS: &str = "id, client_profile_id, log_date, assigned_training_plan_id, \
     assigned_nutrition_plan_id, is_completed, notes, created_at, updated_at";
const ENTRY_COLUMNS: &str = "id, daily_log_id, entry_type, meal_id, exercise_id, servings, sets, reps, \
     weight_kg, duration_minutes, calories, protein_g, carbs_g, fat_g, completed, created_at";

#[derive(Clone)]
pub struct DailyLogService {
    db: PgPool,
}

impl DailyLogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create or update the client's log for a date.
    ///
    /// Every write re-resolves the link to the client's open training and
    /// nutrition assignments whose date window contains the log date, so
    /// progress can be counted per assignment. An existing link is kept when
    /// no open assignment covers the date.
    #[tracing::instrument(skip(self, client, request), fields(client_id = %client.id))]
    pub async fn upsert(&self, client: &ClientProfile, request: UpsertDailyLogRequest) -> AppResult<DailyLog> {
        let log_date = request.log_date.unwrap_or_else(|| Utc::now().date_naive());

        let log = sqlx::query_as::<_, DailyLog>(&format!(
            r#"
            INSERT INTO daily_logs (id, client_profile_id, log_date, assigned_training_plan_id,
                                    assigned_nutrition_plan_id, is_completed, notes)
            VALUES ($1, $2, $3, {training}, {nutrition}, COALESCE($4, FALSE), $5)
            ON CONFLICT (client_profile_id, log_date) DO UPDATE
            SET assigned_training_plan_id = COALESCE(EXCLUDED.assigned_training_plan_id,
                                                     daily_logs.assigned_training_plan_id),
                assigned_nutrition_plan_id = COALESCE(EXCLUDED.assigned_nutrition_plan_id,
                                                      daily_logs.assigned_nutrition_plan_id),
                is_completed = COALESCE($4, daily_logs.is_completed),
                notes = COALESCE($5, daily_logs.notes),
                updated_at = NOW()
            RETURNING {LOG_COLUMNS}
            "#,
            training = covering_assignment("assigned_training_plans"),
            nutrition = covering_assignment("assigned_nutrition_plans"),
        ))
        .bind(Uuid::new_v4())
        .bind(client.id)
        .bind(log_date)
        .bind(request.is_completed)
        .bind(request.notes)
        .fetch_one(&self.db)
        .await?;

        Ok(log)
    }

    pub async fn get(&self, log_id: Uuid) -> AppResult<DailyLog> {
        sqlx::query_as::<_, DailyLog>(&format!("SELECT {LOG_COLUMNS} FROM daily_logs WHERE id = $1"))
            .bind(log_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::NotFound("Daily log"))
    }

    /// The log with its entries, nutrition totals and plan targets
    pub async fn detail(&self, log: DailyLog) -> AppResult<DailyLogDetail> {
        let mut conn = self.db.acquire().await?;
        let entries = entries_for(&mut conn, log.id).await?;

        let targets = match log.assigned_nutrition_plan_id {
            Some(assignment_id) => {
                sqlx::query_as::<_, NutritionTargets>(
                    r#"
                    SELECT p.daily_calories, p.protein_g, p.carbs_g, p.fat_g
                    FROM assigned_nutrition_plans a
                    JOIN nutrition_plans p ON p.id = a.plan_id
                    WHERE a.id = $1
                    "#,
                )
                .bind(assignment_id)
                .fetch_optional(&mut *conn)
                .await?
            }
            None => None,
        };

        let totals = progress::nutrition_totals(&entries);
        let adherence = targets.map(|t| progress::target_adherence(&totals, &t));
        let exercises_completed = entries
            .iter()
            .filter(|e| e.entry_type == LogEntryType::Exercise && e.completed)
            .count() as i64;

        Ok(DailyLogDetail {
            log,
            entries,
            totals,
            targets,
            adherence,
            exercises_completed,
        })
    }

    pub async fn list(&self, client_profile_id: Uuid, query: DailyLogQuery) -> AppResult<Paginated<DailyLog>> {
        let pagination = Pagination::new(query.page, query.limit);
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(AppError::field("from", "from must not be after to"));
            }
        }

        let filter = r#"
            client_profile_id = $1
            AND ($2::DATE IS NULL OR log_date >= $2)
            AND ($3::DATE IS NULL OR log_date <= $3)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM daily_logs WHERE {filter}"))
            .bind(client_profile_id)
            .bind(query.from)
            .bind(query.to)
            .fetch_one(&self.db)
            .await?;

        let logs = sqlx::query_as::<_, DailyLog>(&format!(
            "SELECT {LOG_COLUMNS} FROM daily_logs WHERE {filter} ORDER BY log_date DESC LIMIT $4 OFFSET $5"
        ))
        .bind(client_profile_id)
        .bind(query.from)
        .bind(query.to)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated::new(logs, total, pagination))
    }

    #[tracing::instrument(skip(self, log, request), fields(log_id = %log.id))]
    pub async fn update(&self, log: &DailyLog, request: UpdateDailyLogRequest) -> AppResult<DailyLog> {
        let updated = sqlx::query_as::<_, DailyLog>(&format!(
            r#"
            UPDATE daily_logs
            SET assigned_training_plan_id = COALESCE({training}, assigned_training_plan_id),
                assigned_nutrition_plan_id = COALESCE({nutrition}, assigned_nutrition_plan_id),
                is_completed = COALESCE($4, is_completed),
                notes = COALESCE($5, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LOG_COLUMNS}
            "#,
            training = covering_assignment("assigned_training_plans"),
            nutrition = covering_assignment("assigned_nutrition_plans"),
        ))
        .bind(log.id)
        .bind(log.client_profile_id)
        .bind(log.log_date)
        .bind(request.is_completed)
        .bind(request.notes)
        .fetch_one(&self.db)
        .await?;

        Ok(updated)
    }

    #[tracing::instrument(skip(self, log), fields(log_id = %log.id))]
    pub async fn delete(&self, log: &DailyLog) -> AppResult<()> {
        sqlx::query("DELETE FROM daily_logs WHERE id = $1")
            .bind(log.id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Record a meal or exercise from the client's trainer's catalogue; meal
    /// entries default to the meal's macros scaled by servings
    #[tracing::instrument(skip(self, log, request), fields(log_id = %log.id))]
    pub async fn add_entry(&self, log: &DailyLog, request: CreateLogEntryRequest) -> AppResult<DailyLogEntry> {
        let servings = request.servings.unwrap_or(1.0);

        let (meal_id, exercise_id, macros) = match request.entry_type {
            LogEntryType::Meal => {
                let meal_id = request
                    .meal_id
                    .ok_or_else(|| AppError::field("meal_id", "meal_id is required for meal entries"))?;
                let meal = sqlx::query_as::<_, Meal>(
                    r#"
                    SELECT m.id, m.trainer_profile_id, m.name, m.description, m.meal_type, m.calories,
                           m.protein_g, m.carbs_g, m.fat_g, m.created_at, m.updated_at
                    FROM meals m
                    JOIN client_profiles c ON c.trainer_profile_id = m.trainer_profile_id
                    WHERE m.id = $1 AND c.id = $2
                    "#,
                )
                .bind(meal_id)
                .bind(log.client_profile_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or(AppError::NotFound("Meal"))?;

                let macros = EntryMacros {
                    calories: Some(request.calories.unwrap_or_else(|| progress::scale_macro(meal.calories, servings))),
                    protein_g: Some(request.protein_g.unwrap_or_else(|| progress::scale_macro(meal.protein_g, servings))),
                    carbs_g: Some(request.carbs_g.unwrap_or_else(|| progress::scale_macro(meal.carbs_g, servings))),
                    fat_g: Some(request.fat_g.unwrap_or_else(|| progress::scale_macro(meal.fat_g, servings))),
                };
                (Some(meal.id), None, macros)
            }
            LogEntryType::Exercise => {
                let exercise_id = request.exercise_id.ok_or_else(|| {
                    AppError::field("exercise_id", "exercise_id is required for exercise entries")
                })?;
                let exists: bool = sqlx::query_scalar(
                    r#"
                    SELECT EXISTS(
                        SELECT 1 FROM exercises e
                        JOIN client_profiles c ON c.trainer_profile_id = e.trainer_profile_id
                        WHERE e.id = $1 AND c.id = $2
                    )
                    "#,
                )
                .bind(exercise_id)
                .bind(log.client_profile_id)
                .fetch_one(&self.db)
                .await?;
                if !exists {
                    return Err(AppError::NotFound("Exercise"));
                }
                let macros = EntryMacros {
                    // calories burned
                    calories: request.calories,
                    protein_g: None,
                    carbs_g: None,
                    fat_g: None,
                };
                (None, Some(exercise_id), macros)
            }
        };

        let entry = sqlx::query_as::<_, DailyLogEntry>(&format!(
            r#"
            INSERT INTO daily_log_entries (id, daily_log_id, entry_type, meal_id, exercise_id, servings,
                                           sets, reps, weight_kg, duration_minutes,
                                           calories, protein_g, carbs_g, fat_g, completed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(log.id)
        .bind(request.entry_type)
        .bind(meal_id)
        .bind(exercise_id)
        .bind(servings)
        .bind(request.sets)
        .bind(request.reps)
        .bind(request.weight_kg)
        .bind(request.duration_minutes)
        .bind(macros.calories)
        .bind(macros.protein_g)
        .bind(macros.carbs_g)
        .bind(macros.fat_g)
        .bind(request.completed.unwrap_or(true))
        .fetch_one(&self.db)
        .await?;

        Ok(entry)
    }

    #[tracing::instrument(skip(self, log), fields(log_id = %log.id))]
    pub async fn remove_entry(&self, log: &DailyLog, entry_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM daily_log_entries WHERE id = $1 AND daily_log_id = $2")
            .bind(entry_id)
            .bind(log.id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Log entry"));
        }
        Ok(())
    }

    /// Today's log for the client dashboard, if one was started
    pub async fn today(&self, client_profile_id: Uuid) -> AppResult<Option<DailyLogDetail>> {
        let log = sqlx::query_as::<_, DailyLog>(&format!(
            "SELECT {LOG_COLUMNS} FROM daily_logs WHERE client_profile_id = $1 AND log_date = $2"
        ))
        .bind(client_profile_id)
        .bind(Utc::now().date_naive())
        .fetch_optional(&self.db)
        .await?;

        match log {
            Some(log) => self.detail(log).await.map(Some),
            None => Ok(None),
        }
    }
}

/// Subquery for the open assignment covering the log date; binds the client as `$2` and the date as `$3`
fn covering_assignment(table: &str) -> String {
    format!(
        "(SELECT id FROM {table}
           WHERE client_profile_id = $2
             AND status IN ('assigned', 'active')
             AND $3::DATE BETWEEN start_date AND end_date
           LIMIT 1)"
    )
}

struct EntryMacros {
    calories: Option<f64>,
    protein_g: Option<f64>,
    carbs_g: Option<f64>,
    fat_g: Option<f64>,
}

async fn entries_for(conn: &mut PgConnection, log_id: Uuid) -> AppResult<Vec<DailyLogEntry>> {
    let entries = sqlx::query_as::<_, DailyLogEntry>(&format!(
        "SELECT {ENTRY_COLUMNS} FROM daily_log_entries WHERE daily_log_id = $1 ORDER BY created_at ASC"
    ))
    .bind(log_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(entries)
}
