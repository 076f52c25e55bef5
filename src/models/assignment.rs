use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

use crate::models::PlanKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "plan_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Assigned,
    Active,
    Completed,
    Abandoned,
}

impl PlanStatus {
    /// Assigned and active assignments count against the one-open-plan rule
    pub fn is_open(&self) -> bool {
        matches!(self, PlanStatus::Assigned | PlanStatus::Active)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_open()
    }

    pub fn can_transition_to(&self, next: PlanStatus) -> bool {
        matches!(
            (self, next),
            (PlanStatus::Assigned, PlanStatus::Active)
                | (PlanStatus::Assigned, PlanStatus::Abandoned)
                | (PlanStatus::Active, PlanStatus::Completed)
                | (PlanStatus::Active, PlanStatus::Abandoned)
        )
    }

    /// Status a new assignment starts in
    pub fn initial(start_date: NaiveDate, today: NaiveDate) -> Self {
        if start_date <= today {
            PlanStatus::Active
        } else {
            PlanStatus::Assigned
        }
    }
}

/// A client's assignment of a training or nutrition plan template
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanAssignment {
    pub id: Uuid,
    pub client_profile_id: Uuid,
    pub plan_id: Uuid,
    pub trainer_profile_id: Uuid,
    pub plan_title: String,
    pub duration_days: i32,
    pub status: PlanStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanProgress {
    pub current_day: i32,
    pub duration_days: i32,
    pub days_remaining: i32,
    pub total_logs: i64,
    pub completed_logs: i64,
    pub completion_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentWithProgress {
    pub kind: PlanKind,
    #[serde(flatten)]
    pub assignment: PlanAssignment,
    pub progress: PlanProgress,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplacementOutcome {
    pub previous: PlanAssignment,
    pub current: AssignmentWithProgress,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignPlanRequest {
    pub plan_id: Uuid,
    pub start_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    /// End an open assignment instead of rejecting the request
    #[serde(default)]
    pub replace: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateAssignmentStatusRequest {
    pub status: PlanStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_states() {
        assert!(PlanStatus::Assigned.is_open());
        assert!(PlanStatus::Active.is_open());
        assert!(PlanStatus::Completed.is_terminal());
        assert!(PlanStatus::Abandoned.is_terminal());
    }

    #[test]
    fn test_allowed_transitions() {
        assert!(PlanStatus::Assigned.can_transition_to(PlanStatus::Active));
        assert!(PlanStatus::Assigned.can_transition_to(PlanStatus::Abandoned));
        assert!(PlanStatus::Active.can_transition_to(PlanStatus::Completed));
        assert!(PlanStatus::Active.can_transition_to(PlanStatus::Abandoned));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!PlanStatus::Assigned.can_transition_to(PlanStatus::Completed));
        assert!(!PlanStatus::Active.can_transition_to(PlanStatus::Assigned));
        assert!(!PlanStatus::Active.can_transition_to(PlanStatus::Active));
        for terminal in [PlanStatus::Completed, PlanStatus::Abandoned] {
            for next in [
                PlanStatus::Assigned,
                PlanStatus::Active,
                PlanStatus::Completed,
                PlanStatus::Abandoned,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_initial_status_depends_on_start_date() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(PlanStatus::initial(today, today), PlanStatus::Active);
        assert_eq!(
            PlanStatus::initial(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), today),
            PlanStatus::Active
        );
        assert_eq!(
            PlanStatus::initial(NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(), today),
            PlanStatus::Assigned
        );
    }
}
