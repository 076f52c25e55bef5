use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HealthMetric {
    pub id: Uuid,
    pub client_profile_id: Uuid,
    pub recorded_on: NaiveDate,
    pub weight_kg: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub resting_heart_rate: Option<i32>,
    pub sleep_hours: Option<f64>,
    pub steps: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateHealthMetricRequest {
    pub recorded_on: Option<NaiveDate>,
    #[validate(range(min = 20.0, max = 400.0, message = "must be between 20 and 400 kg"))]
    pub weight_kg: Option<f64>,
    #[validate(range(min = 2.0, max = 70.0, message = "must be between 2 and 70 percent"))]
    pub body_fat_pct: Option<f64>,
    #[validate(range(min = 25, max = 220, message = "must be between 25 and 220 bpm"))]
    pub resting_heart_rate: Option<i32>,
    #[validate(range(min = 0.0, max = 24.0, message = "must be between 0 and 24 hours"))]
    pub sleep_hours: Option<f64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub steps: Option<i32>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl CreateHealthMetricRequest {
    pub fn has_measurement(&self) -> bool {
        self.weight_kg.is_some()
            || self.body_fat_pct.is_some()
            || self.resting_heart_rate.is_some()
            || self.sleep_hours.is_some()
            || self.steps.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct HealthMetricQuery {
    pub client_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Latest value and change across a range for one measurement
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct MetricTrend {
    pub first: f64,
    pub latest: f64,
    pub change: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthMetricSummary {
    pub entries: usize,
    pub latest: Option<HealthMetric>,
    pub weight: Option<MetricTrend>,
    pub body_fat: Option<MetricTrend>,
    pub average_sleep_hours: Option<f64>,
    pub average_steps: Option<f64>,
}
