use serde::Serialize;
use uuid::Uuid;

use crate::models::{AssignmentWithProgress, HealthMetric, NutritionTotals, TargetAdherence};

#[derive(Debug, Clone, Serialize)]
pub struct TrainerDashboard {
    pub client_count: i64,
    pub open_training_assignments: i64,
    pub open_nutrition_assignments: i64,
    pub pending_requests: i64,
    pub completed_assignments: i64,
    pub abandoned_assignments: i64,
    /// Completed share of finished assignments; absent until one finishes
    pub success_rate: Option<f64>,
    pub exercise_count: i64,
    pub meal_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientDashboard {
    pub trainer_profile_id: Option<Uuid>,
    pub open_assignments: Vec<AssignmentWithProgress>,
    pub today_totals: NutritionTotals,
    pub today_adherence: Option<TargetAdherence>,
    pub today_completed: bool,
    pub latest_health_metric: Option<HealthMetric>,
    pub open_todos: i64,
}
