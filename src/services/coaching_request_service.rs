use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    CoachingDecision, CoachingRequest, CoachingRequestQuery, CoachingRequestStatus, ClientProfile,
    CreateCoachingRequest,
};

const SELECT_REQUESTS: &str = r#"
    SELECT r.id, r.client_profile_id, r.trainer_profile_id,
           cu.name AS client_name, tu.name AS trainer_name,
           r.message, r.status, r.responded_at, r.created_at, r.updated_at
    FROM coaching_requests r
    JOIN client_profiles cp ON cp.id = r.client_profile_id
    JOIN users cu ON cu.id = cp.user_id
    JOIN trainer_profiles tp ON tp.id = r.trainer_profile_id
    JOIN users tu ON tu.id = tp.user_id
"#;

/// Which side of a request the caller is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestParty {
    Client(Uuid),
    Trainer(Uuid),
}

impl RequestParty {
    /// Trainers answer requests addressed to them; clients may only withdraw their own
    fn may_decide(&self, request: &CoachingRequest, decision: CoachingDecision) -> bool {
        match (self, decision) {
            (RequestParty::Trainer(id), CoachingDecision::Accept | CoachingDecision::Reject) => {
                request.trainer_profile_id == *id
            }
            (RequestParty::Client(id), CoachingDecision::Cancel) => request.client_profile_id == *id,
            _ => false,
        }
    }
}

#[derive(Clone)]
pub struct CoachingRequestService {
    db: PgPool,
}

impl CoachingRequestService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self, client, request), fields(client_id = %client.id))]
    pub async fn create(&self, client: &ClientProfile, request: CreateCoachingRequest) -> AppResult<CoachingRequest> {
        if client.trainer_profile_id.is_some() {
            return Err(AppError::Conflict("Client already has a trainer".to_string()));
        }

        let accepting: Option<bool> =
            sqlx::query_scalar("SELECT accepting_clients FROM trainer_profiles WHERE id = $1")
                .bind(request.trainer_profile_id)
                .fetch_optional(&self.db)
                .await?;

        match accepting {
            None => return Err(AppError::NotFound("Trainer")),
            Some(false) => {
                return Err(AppError::BadRequest(
                    "Trainer is not accepting new clients".to_string(),
                ))
            }
            Some(true) => {}
        }

        let pending: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM coaching_requests
                WHERE client_profile_id = $1 AND trainer_profile_id = $2 AND status = 'pending'
            )
            "#,
        )
        .bind(client.id)
        .bind(request.trainer_profile_id)
        .fetch_one(&self.db)
        .await?;

        if pending {
            return Err(AppError::Conflict(
                "A pending request to this trainer already exists".to_string(),
            ));
        }

        let message = request
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty());

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO coaching_requests (id, client_profile_id, trainer_profile_id, message)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(client.id)
        .bind(request.trainer_profile_id)
        .bind(message)
        .execute(&self.db)
        .await?;

        self.get(id).await
    }

    pub async fn get(&self, request_id: Uuid) -> AppResult<CoachingRequest> {
        let mut conn = self.db.acquire().await?;
        find_request(&mut conn, request_id, false).await
    }

    pub async fn list(&self, party: RequestParty, query: CoachingRequestQuery) -> AppResult<Vec<CoachingRequest>> {
        let (column, id) = match party {
            RequestParty::Client(id) => ("r.client_profile_id", id),
            RequestParty::Trainer(id) => ("r.trainer_profile_id", id),
        };

        let requests = sqlx::query_as::<_, CoachingRequest>(&format!(
            r#"{SELECT_REQUESTS}
            WHERE {column} = $1 AND ($2::coaching_request_status IS NULL OR r.status = $2)
            ORDER BY r.created_at DESC"#
        ))
        .bind(id)
        .bind(query.status)
        .fetch_all(&self.db)
        .await?;

        Ok(requests)
    }

    pub async fn pending_count(&self, trainer_profile_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM coaching_requests WHERE trainer_profile_id = $1 AND status = 'pending'",
        )
        .bind(trainer_profile_id)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    /// Accept, reject or cancel a pending request.
    ///
    /// Accepting links the client to the trainer and cancels the client's
    /// other pending requests in the same transaction.
    #[tracing::instrument(skip(self))]
    pub async fn decide(
        &self,
        party: RequestParty,
        request_id: Uuid,
        decision: CoachingDecision,
    ) -> AppResult<CoachingRequest> {
        let mut tx = self.db.begin().await?;

        let request = find_request(&mut tx, request_id, true).await?;

        if !party.may_decide(&request, decision) {
            return Err(AppError::Forbidden("Not allowed to act on this coaching request"));
        }
        if request.status != CoachingRequestStatus::Pending {
            return Err(AppError::BadRequest(
                "Coaching request is no longer pending".to_string(),
            ));
        }

        if decision == CoachingDecision::Accept {
            let linked = sqlx::query(
                r#"
                UPDATE client_profiles SET trainer_profile_id = $2, updated_at = NOW()
                WHERE id = $1 AND trainer_profile_id IS NULL
                "#,
            )
            .bind(request.client_profile_id)
            .bind(request.trainer_profile_id)
            .execute(&mut *tx)
            .await?;

            if linked.rows_affected() == 0 {
                return Err(AppError::Conflict("Client already has a trainer".to_string()));
            }

            sqlx::query(
                r#"
                UPDATE coaching_requests SET status = 'cancelled', responded_at = NOW(), updated_at = NOW()
                WHERE client_profile_id = $1 AND id <> $2 AND status = 'pending'
                "#,
            )
            .bind(request.client_profile_id)
            .bind(request.id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            UPDATE coaching_requests SET status = $2, responded_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(request.id)
        .bind(decision.resulting_status())
        .execute(&mut *tx)
        .await?;

        let updated = find_request(&mut tx, request.id, false).await?;
        tx.commit().await?;

        tracing::info!(request_id = %updated.id, status = ?updated.status, "coaching request answered");
        Ok(updated)
    }
}

async fn find_request(conn: &mut PgConnection, request_id: Uuid, lock: bool) -> AppResult<CoachingRequest> {
    sqlx::query_as::<_, CoachingRequest>(&format!(
        "{SELECT_REQUESTS} WHERE r.id = $1{}",
        if lock { " FOR UPDATE OF r" } else { "" }
    ))
    .bind(request_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound("Coaching request"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn request(client: Uuid, trainer: Uuid) -> CoachingRequest {
        CoachingRequest {
            id: Uuid::new_v4(),
            client_profile_id: client,
            trainer_profile_id: trainer,
            client_name: "Casey".into(),
            trainer_name: "Jordan".into(),
            message: None,
            status: CoachingRequestStatus::Pending,
            responded_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_trainer_answers_only_own_requests() {
        let (client, trainer) = (Uuid::new_v4(), Uuid::new_v4());
        let req = request(client, trainer);

        assert!(RequestParty::Trainer(trainer).may_decide(&req, CoachingDecision::Accept));
        assert!(RequestParty::Trainer(trainer).may_decide(&req, CoachingDecision::Reject));
        assert!(!RequestParty::Trainer(trainer).may_decide(&req, CoachingDecision::Cancel));
        assert!(!RequestParty::Trainer(Uuid::new_v4()).may_decide(&req, CoachingDecision::Accept));
    }

    #[test]
    fn test_client_can_only_cancel() {
        let (client, trainer) = (Uuid::new_v4(), Uuid::new_v4());
        let req = request(client, trainer);

        assert!(RequestParty::Client(client).may_decide(&req, CoachingDecision::Cancel));
        assert!(!RequestParty::Client(client).may_decide(&req, CoachingDecision::Accept));
        assert!(!RequestParty::Client(Uuid::new_v4()).may_decide(&req, CoachingDecision::Cancel));
    }
}
