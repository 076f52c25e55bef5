use chrono::{NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    AssignPlanRequest, AssignmentWithProgress, ClientProfile, PlanAssignment, PlanKind,
    PlanProgress, PlanStatus, ReplacementOutcome, TrainerProfile,
};
use crate::services::progress;

/// Minimal view of a plan template needed to schedule an assignment
#[derive(Debug, FromRow)]
struct TemplateRef {
    id: Uuid,
    duration_days: i32,
}

fn select_assignments(kind: PlanKind) -> String {
    format!(
        "SELECT a.id, a.client_profile_id, a.plan_id, a.trainer_profile_id,
                p.title AS plan_title, p.duration_days, a.status, a.start_date,
                a.end_date, a.notes, a.assigned_at, a.ended_at
         FROM {} a
         JOIN {} p ON p.id = a.plan_id",
        kind.assignment_table(),
        kind.template_table()
    )
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[derive(Clone)]
pub struct AssignmentService {
    db: PgPool,
}

impl AssignmentService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Assign a plan template to a client.
    ///
    /// A client holds at most one open assignment per kind. With
    /// `replace: true` the open one is ended instead of rejecting the call.
    #[tracing::instrument(skip(self, trainer, client, request), fields(trainer_id = %trainer.id, client_id = %client.id))]
    pub async fn assign(
        &self,
        trainer: &TrainerProfile,
        client: &ClientProfile,
        kind: PlanKind,
        request: AssignPlanRequest,
    ) -> AppResult<AssignmentWithProgress> {
        if request.replace {
            return self
                .replace(trainer, client, kind, request)
                .await
                .map(|outcome| outcome.current);
        }

        ensure_coaches(trainer, client)?;

        let mut conn = self.db.acquire().await?;

        let template = find_template(&mut conn, kind, request.plan_id, trainer.id).await?;

        if open_assignment(&mut conn, kind, client.id, false).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Client already has an open {} assignment",
                kind.as_str()
            )));
        }

        let assignment = insert_assignment(&mut conn, kind, trainer, client, &template, &request).await?;
        drop(conn);

        tracing::info!(assignment_id = %assignment.id, kind = kind.as_str(), "plan assigned");
        self.with_progress(kind, assignment).await
    }

    /// End the client's open assignment and start a new one in a single transaction
    #[tracing::instrument(skip(self, trainer, client, request), fields(trainer_id = %trainer.id, client_id = %client.id))]
    pub async fn replace(
        &self,
        trainer: &TrainerProfile,
        client: &ClientProfile,
        kind: PlanKind,
        request: AssignPlanRequest,
    ) -> AppResult<ReplacementOutcome> {
        ensure_coaches(trainer, client)?;

        let mut tx = self.db.begin().await?;

        let open = open_assignment(&mut tx, kind, client.id, true)
            .await?
            .ok_or(AppError::NotFound("Open plan assignment"))?;

        let template = find_template(&mut tx, kind, request.plan_id, trainer.id).await?;

        let closing = progress::closing_status(open.start_date, today(), open.duration_days);
        let previous = sqlx::query_as::<_, PlanAssignment>(&format!(
            "WITH ended AS (
                UPDATE {} SET status = $2, ended_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT a.id, a.client_profile_id, a.plan_id, a.trainer_profile_id,
                    p.title AS plan_title, p.duration_days, a.status, a.start_date,
                    a.end_date, a.notes, a.assigned_at, a.ended_at
             FROM ended a
             JOIN {} p ON p.id = a.plan_id",
            kind.assignment_table(),
            kind.template_table()
        ))
        .bind(open.id)
        .bind(closing)
        .fetch_one(&mut *tx)
        .await?;

        let current = insert_assignment(&mut tx, kind, trainer, client, &template, &request).await?;

        tx.commit().await?;

        tracing::info!(
            previous_id = %previous.id,
            previous_status = ?previous.status,
            assignment_id = %current.id,
            kind = kind.as_str(),
            "plan replaced"
        );

        Ok(ReplacementOutcome {
            previous,
            current: self.with_progress(kind, current).await?,
        })
    }

    /// The client's open assignment, activating it once its start date has arrived
    pub async fn current(
        &self,
        client_profile_id: Uuid,
        kind: PlanKind,
    ) -> AppResult<Option<AssignmentWithProgress>> {
        let mut conn = self.db.acquire().await?;
        let Some(mut assignment) = open_assignment(&mut conn, kind, client_profile_id, false).await? else {
            return Ok(None);
        };

        if assignment.status == PlanStatus::Assigned && assignment.start_date <= today() {
            sqlx::query(&format!(
                "UPDATE {} SET status = 'active' WHERE id = $1 AND status = 'assigned'",
                kind.assignment_table()
            ))
            .bind(assignment.id)
            .execute(&mut *conn)
            .await?;
            assignment.status = PlanStatus::Active;
        }
        drop(conn);

        self.with_progress(kind, assignment).await.map(Some)
    }

    /// Every assignment of this kind for the client, newest first
    pub async fn history(&self, client_profile_id: Uuid, kind: PlanKind) -> AppResult<Vec<PlanAssignment>> {
        let query = format!(
            "{} WHERE a.client_profile_id = $1 ORDER BY a.assigned_at DESC",
            select_assignments(kind)
        );
        let assignments = sqlx::query_as::<_, PlanAssignment>(&query)
            .bind(client_profile_id)
            .fetch_all(&self.db)
            .await?;
        Ok(assignments)
    }

    pub async fn get(&self, kind: PlanKind, assignment_id: Uuid) -> AppResult<PlanAssignment> {
        let query = format!("{} WHERE a.id = $1", select_assignments(kind));
        sqlx::query_as::<_, PlanAssignment>(&query)
            .bind(assignment_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::NotFound("Plan assignment"))
    }

    /// Move an assignment along its lifecycle; terminal states stamp `ended_at`
    #[tracing::instrument(skip(self, assignment), fields(assignment_id = %assignment.id))]
    pub async fn update_status(
        &self,
        kind: PlanKind,
        assignment: &PlanAssignment,
        next: PlanStatus,
    ) -> AppResult<PlanAssignment> {
        if assignment.status.is_terminal() {
            return Err(AppError::BadRequest(format!(
                "Assignment is already {}",
                status_label(assignment.status)
            )));
        }
        if !assignment.status.can_transition_to(next) {
            return Err(AppError::BadRequest(format!(
                "Cannot move assignment from {} to {}",
                status_label(assignment.status),
                status_label(next)
            )));
        }

        let updated = sqlx::query(&format!(
            "UPDATE {} SET status = $3,
                ended_at = CASE WHEN $4 THEN NOW() ELSE ended_at END
             WHERE id = $1 AND status = $2",
            kind.assignment_table()
        ))
        .bind(assignment.id)
        .bind(assignment.status)
        .bind(next)
        .bind(next.is_terminal())
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Assignment status changed concurrently".to_string(),
            ));
        }

        tracing::info!(from = ?assignment.status, to = ?next, "assignment status updated");
        self.get(kind, assignment.id).await
    }

    /// Progress of an assignment from the daily logs linked to it
    pub async fn progress(&self, kind: PlanKind, assignment: &PlanAssignment) -> AppResult<PlanProgress> {
        let (total, completed): (i64, i64) = sqlx::query_as(&format!(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_completed)
             FROM daily_logs WHERE {} = $1",
            kind.daily_log_column()
        ))
        .bind(assignment.id)
        .fetch_one(&self.db)
        .await?;

        Ok(progress::plan_progress(
            assignment.start_date,
            today(),
            assignment.duration_days,
            completed,
            total,
        ))
    }

    pub async fn with_progress(
        &self,
        kind: PlanKind,
        assignment: PlanAssignment,
    ) -> AppResult<AssignmentWithProgress> {
        let progress = self.progress(kind, &assignment).await?;
        Ok(AssignmentWithProgress {
            kind,
            assignment,
            progress,
        })
    }

    /// Open assignments of both kinds for the client dashboard
    pub async fn open_assignments(&self, client_profile_id: Uuid) -> AppResult<Vec<AssignmentWithProgress>> {
        let mut open = Vec::with_capacity(2);
        for kind in [PlanKind::Training, PlanKind::Nutrition] {
            if let Some(assignment) = self.current(client_profile_id, kind).await? {
                open.push(assignment);
            }
        }
        Ok(open)
    }
}

fn ensure_coaches(trainer: &TrainerProfile, client: &ClientProfile) -> AppResult<()> {
    if client.trainer_profile_id != Some(trainer.id) {
        return Err(AppError::Forbidden("Client is not coached by this trainer"));
    }
    Ok(())
}

fn status_label(status: PlanStatus) -> &'static str {
    match status {
        PlanStatus::Assigned => "assigned",
        PlanStatus::Active => "active",
        PlanStatus::Completed => "completed",
        PlanStatus::Abandoned => "abandoned",
    }
}

async fn open_assignment(
    conn: &mut PgConnection,
    kind: PlanKind,
    client_profile_id: Uuid,
    lock: bool,
) -> AppResult<Option<PlanAssignment>> {
    let query = format!(
        "{} WHERE a.client_profile_id = $1 AND a.status IN ('assigned', 'active'){}",
        select_assignments(kind),
        if lock { " FOR UPDATE OF a" } else { "" }
    );
    let assignment = sqlx::query_as::<_, PlanAssignment>(&query)
        .bind(client_profile_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(assignment)
}

async fn find_template(
    conn: &mut PgConnection,
    kind: PlanKind,
    plan_id: Uuid,
    trainer_profile_id: Uuid,
) -> AppResult<TemplateRef> {
    sqlx::query_as::<_, TemplateRef>(&format!(
        "SELECT id, duration_days FROM {} WHERE id = $1 AND trainer_profile_id = $2",
        kind.template_table()
    ))
    .bind(plan_id)
    .bind(trainer_profile_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound(kind.label()))
}

async fn insert_assignment(
    conn: &mut PgConnection,
    kind: PlanKind,
    trainer: &TrainerProfile,
    client: &ClientProfile,
    template: &TemplateRef,
    request: &AssignPlanRequest,
) -> AppResult<PlanAssignment> {
    let start_date = request.start_date.unwrap_or_else(today);
    let end_date = progress::end_date(start_date, template.duration_days);
    let status = PlanStatus::initial(start_date, today());
    let notes = request
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let assignment = sqlx::query_as::<_, PlanAssignment>(&format!(
        "WITH inserted AS (
            INSERT INTO {} (id, client_profile_id, plan_id, trainer_profile_id, status, start_date, end_date, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
         )
         SELECT a.id, a.client_profile_id, a.plan_id, a.trainer_profile_id,
                p.title AS plan_title, p.duration_days, a.status, a.start_date,
                a.end_date, a.notes, a.assigned_at, a.ended_at
         FROM inserted a
         JOIN {} p ON p.id = a.plan_id",
        kind.assignment_table(),
        kind.template_table()
    ))
    .bind(Uuid::new_v4())
    .bind(client.id)
    .bind(template.id)
    .bind(trainer.id)
    .bind(status)
    .bind(start_date)
    .bind(end_date)
    .bind(notes)
    .fetch_one(&mut *conn)
    .await?;

    // Claim logs already written inside the window that no assignment owns yet
    sqlx::query(&format!(
        "UPDATE daily_logs SET {column} = $1
         WHERE client_profile_id = $2 AND log_date BETWEEN $3 AND $4 AND {column} IS NULL",
        column = kind.daily_log_column()
    ))
    .bind(assignment.id)
    .bind(client.id)
    .bind(start_date)
    .bind(end_date)
    .execute(&mut *conn)
    .await?;

    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trainer(id: Uuid) -> TrainerProfile {
        TrainerProfile {
            id,
            user_id: Uuid::new_v4(),
            bio: None,
            specialties: vec![],
            years_experience: None,
            hourly_rate: None,
            accepting_clients: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn client(trainer_profile_id: Option<Uuid>) -> ClientProfile {
        ClientProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            trainer_profile_id,
            date_of_birth: None,
            height_cm: None,
            weight_kg: None,
            fitness_goal: None,
            activity_level: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_ensure_coaches() {
        let coach = trainer(Uuid::new_v4());
        assert!(ensure_coaches(&coach, &client(Some(coach.id))).is_ok());
        assert!(matches!(
            ensure_coaches(&coach, &client(Some(Uuid::new_v4()))),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(ensure_coaches(&coach, &client(None)), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_select_joins_matching_template() {
        let sql = select_assignments(PlanKind::Nutrition);
        assert!(sql.contains("FROM assigned_nutrition_plans a"));
        assert!(sql.contains("JOIN nutrition_plans p"));
    }
}
