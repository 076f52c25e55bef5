use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "coaching_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CoachingRequestStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CoachingRequest {
    pub id: Uuid,
    pub client_profile_id: Uuid,
    pub trainer_profile_id: Uuid,
    pub client_name: String,
    pub trainer_name: String,
    pub message: Option<String>,
    pub status: CoachingRequestStatus,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCoachingRequest {
    pub trainer_profile_id: Uuid,
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoachingRequestQuery {
    pub status: Option<CoachingRequestStatus>,
}

/// What a participant wants to do with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoachingDecision {
    Accept,
    Reject,
    Cancel,
}

impl CoachingDecision {
    pub fn resulting_status(&self) -> CoachingRequestStatus {
        match self {
            CoachingDecision::Accept => CoachingRequestStatus::Accepted,
            CoachingDecision::Reject => CoachingRequestStatus::Rejected,
            CoachingDecision::Cancel => CoachingRequestStatus::Cancelled,
        }
    }
}
