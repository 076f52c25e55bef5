use sqlx::{FromRow, PgPool};

use crate::error::AppResult;
use crate::models::{ClientDashboard, ClientProfile, NutritionTotals, TrainerDashboard, TrainerProfile};
use crate::services::{
    progress, AssignmentService, CoachingRequestService, DailyLogService, ExerciseService,
    HealthMetricService, MealService, TodoService,
};

#[derive(Debug, FromRow)]
struct AssignmentCounts {
    open_training: i64,
    open_nutrition: i64,
    completed: i64,
    abandoned: i64,
}

#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
    assignments: AssignmentService,
    coaching_requests: CoachingRequestService,
    daily_logs: DailyLogService,
    exercises: ExerciseService,
    health_metrics: HealthMetricService,
    meals: MealService,
    todos: TodoService,
}

impl DashboardService {
    pub fn new(db: PgPool) -> Self {
        Self {
            assignments: AssignmentService::new(db.clone()),
            coaching_requests: CoachingRequestService::new(db.clone()),
            daily_logs: DailyLogService::new(db.clone()),
            exercises: ExerciseService::new(db.clone()),
            health_metrics: HealthMetricService::new(db.clone()),
            meals: MealService::new(db.clone()),
            todos: TodoService::new(db.clone()),
            db,
        }
    }

    pub async fn trainer(&self, trainer: &TrainerProfile) -> AppResult<TrainerDashboard> {
        let client_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM client_profiles WHERE trainer_profile_id = $1")
                .bind(trainer.id)
                .fetch_one(&self.db)
                .await?;

        let counts = sqlx::query_as::<_, AssignmentCounts>(
            r#"
            WITH all_assignments AS (
                SELECT 'training' AS kind, status FROM assigned_training_plans WHERE trainer_profile_id = $1
                UNION ALL
                SELECT 'nutrition' AS kind, status FROM assigned_nutrition_plans WHERE trainer_profile_id = $1
            )
            SELECT
                COUNT(*) FILTER (WHERE kind = 'training' AND status IN ('assigned', 'active')) AS open_training,
                COUNT(*) FILTER (WHERE kind = 'nutrition' AND status IN ('assigned', 'active')) AS open_nutrition,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COUNT(*) FILTER (WHERE status = 'abandoned') AS abandoned
            FROM all_assignments
            "#,
        )
        .bind(trainer.id)
        .fetch_one(&self.db)
        .await?;

        Ok(TrainerDashboard {
            client_count,
            open_training_assignments: counts.open_training,
            open_nutrition_assignments: counts.open_nutrition,
            pending_requests: self.coaching_requests.pending_count(trainer.id).await?,
            completed_assignments: counts.completed,
            abandoned_assignments: counts.abandoned,
            success_rate: progress::success_rate(counts.completed, counts.abandoned),
            exercise_count: self.exercises.count(trainer.id).await?,
            meal_count: self.meals.count(trainer.id).await?,
        })
    }

    pub async fn client(&self, client: &ClientProfile) -> AppResult<ClientDashboard> {
        let open_assignments = self.assignments.open_assignments(client.id).await?;
        let today = self.daily_logs.today(client.id).await?;

        let (today_totals, today_adherence, today_completed) = match today {
            Some(detail) => (detail.totals, detail.adherence, detail.log.is_completed),
            None => (NutritionTotals::default(), None, false),
        };

        Ok(ClientDashboard {
            trainer_profile_id: client.trainer_profile_id,
            open_assignments,
            today_totals,
            today_adherence,
            today_completed,
            latest_health_metric: self.health_metrics.latest(client.id).await?,
            open_todos: self.todos.open_count(client.user_id).await?,
        })
    }
}
