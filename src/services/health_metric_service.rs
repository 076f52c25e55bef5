use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    CreateHealthMetricRequest, HealthMetric, HealthMetricQuery, HealthMetricSummary, MetricTrend,
};

const METRIC_COLUMNS: &str = "id, client_profile_id, recorded_on, weight_kg, body_fat_pct, \
     resting_heart_rate, sleep_hours, steps, notes, created_at";

#[derive(Clone)]
pub struct HealthMetricService {
    db: PgPool,
}

impl HealthMetricService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn record(&self, client_profile_id: Uuid, request: CreateHealthMetricRequest) -> AppResult<HealthMetric> {
        if !request.has_measurement() {
            return Err(AppError::field(
                "metrics",
                "at least one measurement is required",
            ));
        }

        let metric = sqlx::query_as::<_, HealthMetric>(&format!(
            r#"
            INSERT INTO health_metrics (id, client_profile_id, recorded_on, weight_kg, body_fat_pct,
                                        resting_heart_rate, sleep_hours, steps, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {METRIC_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(client_profile_id)
        .bind(request.recorded_on.unwrap_or_else(|| Utc::now().date_naive()))
        .bind(request.weight_kg)
        .bind(request.body_fat_pct)
        .bind(request.resting_heart_rate)
        .bind(request.sleep_hours)
        .bind(request.steps)
        .bind(request.notes)
        .fetch_one(&self.db)
        .await?;

        Ok(metric)
    }

    /// Metrics in the date range, newest first
    pub async fn list(&self, client_profile_id: Uuid, query: &HealthMetricQuery) -> AppResult<Vec<HealthMetric>> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(AppError::field("from", "from must not be after to"));
            }
        }

        let metrics = sqlx::query_as::<_, HealthMetric>(&format!(
            r#"
            SELECT {METRIC_COLUMNS} FROM health_metrics
            WHERE client_profile_id = $1
              AND ($2::DATE IS NULL OR recorded_on >= $2)
              AND ($3::DATE IS NULL OR recorded_on <= $3)
            ORDER BY recorded_on DESC, created_at DESC
            "#
        ))
        .bind(client_profile_id)
        .bind(query.from)
        .bind(query.to)
        .fetch_all(&self.db)
        .await?;

        Ok(metrics)
    }

    pub async fn summary(&self, client_profile_id: Uuid, query: &HealthMetricQuery) -> AppResult<HealthMetricSummary> {
        let metrics = self.list(client_profile_id, query).await?;
        Ok(summarize(metrics))
    }

    pub async fn latest(&self, client_profile_id: Uuid) -> AppResult<Option<HealthMetric>> {
        let metric = sqlx::query_as::<_, HealthMetric>(&format!(
            r#"
            SELECT {METRIC_COLUMNS} FROM health_metrics
            WHERE client_profile_id = $1
            ORDER BY recorded_on DESC, created_at DESC
            LIMIT 1
            "#
        ))
        .bind(client_profile_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(metric)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, client_profile_id: Uuid, metric_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM health_metrics WHERE id = $1 AND client_profile_id = $2")
            .bind(metric_id)
            .bind(client_profile_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Health metric"));
        }
        Ok(())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn trend(values: impl Iterator<Item = f64>) -> Option<MetricTrend> {
    let values: Vec<f64> = values.collect();
    let first = *values.first()?;
    let latest = *values.last()?;
    Some(MetricTrend {
        first,
        latest,
        change: round2(latest - first),
    })
}

fn average(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| round2(sum / count as f64))
}

/// Summarize metrics given newest first
pub fn summarize(metrics: Vec<HealthMetric>) -> HealthMetricSummary {
    // oldest to newest for trends
    let chronological = || metrics.iter().rev();

    HealthMetricSummary {
        entries: metrics.len(),
        weight: trend(chronological().filter_map(|m| m.weight_kg)),
        body_fat: trend(chronological().filter_map(|m| m.body_fat_pct)),
        average_sleep_hours: average(metrics.iter().filter_map(|m| m.sleep_hours)),
        average_steps: average(metrics.iter().filter_map(|m| m.steps.map(f64::from))),
        latest: metrics.first().cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn metric(day: u32, weight: Option<f64>, sleep: Option<f64>) -> HealthMetric {
        HealthMetric {
            id: Uuid::new_v4(),
            client_profile_id: Uuid::nil(),
            recorded_on: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            weight_kg: weight,
            body_fat_pct: None,
            resting_heart_rate: None,
            sleep_hours: sleep,
            steps: Some(8000),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_of_empty_range() {
        let summary = summarize(vec![]);
        assert_eq!(summary.entries, 0);
        assert!(summary.latest.is_none());
        assert!(summary.weight.is_none());
        assert!(summary.average_steps.is_none());
    }

    #[test]
    fn test_weight_trend_uses_oldest_and_newest_readings() {
        // newest first, as returned by the list query
        let metrics = vec![
            metric(20, Some(81.4), Some(7.0)),
            metric(10, None, Some(8.0)),
            metric(1, Some(84.0), None),
        ];

        let summary = summarize(metrics);
        assert_eq!(summary.entries, 3);
        assert_eq!(
            summary.weight,
            Some(MetricTrend {
                first: 84.0,
                latest: 81.4,
                change: -2.6,
            })
        );
        assert_eq!(summary.body_fat, None);
        assert_eq!(summary.average_sleep_hours, Some(7.5));
        assert_eq!(summary.average_steps, Some(8000.0));
        assert_eq!(summary.latest.map(|m| m.recorded_on.to_string()), Some("2024-06-20".to_string()));
    }
}
