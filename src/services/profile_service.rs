use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{UserRole, UserSession};
use crate::error::{AppError, AppResult};
use crate::models::{
    ClientListQuery, ClientProfile, ClientSummary, Paginated, Pagination, TrainerListQuery,
    TrainerListing, TrainerProfile, UpdateClientProfile, UpdateTrainerProfile,
};

const TRAINER_COLUMNS: &str = "id, user_id, bio, specialties, years_experience, hourly_rate, \
     accepting_clients, created_at, updated_at";
const CLIENT_COLUMNS: &str = "id, user_id, trainer_profile_id, date_of_birth, height_cm, weight_kg, \
     fitness_goal, activity_level, created_at, updated_at";

#[derive(Clone)]
pub struct ProfileService {
    db: PgPool,
}

impl ProfileService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Trainer profile of the caller; 403 for non-trainers
    pub async fn trainer_for(&self, session: &UserSession) -> AppResult<TrainerProfile> {
        if session.role != UserRole::Trainer {
            return Err(AppError::Forbidden("Trainer account required"));
        }
        let query = format!("SELECT {TRAINER_COLUMNS} FROM trainer_profiles WHERE user_id = $1");
        sqlx::query_as::<_, TrainerProfile>(&query)
            .bind(session.user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::NotFound("Trainer profile"))
    }

    /// Client profile of the caller; 403 for non-clients
    pub async fn client_for(&self, session: &UserSession) -> AppResult<ClientProfile> {
        if session.role != UserRole::Client {
            return Err(AppError::Forbidden("Client account required"));
        }
        let query = format!("SELECT {CLIENT_COLUMNS} FROM client_profiles WHERE user_id = $1");
        sqlx::query_as::<_, ClientProfile>(&query)
            .bind(session.user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::NotFound("Client profile"))
    }

    pub async fn get_client(&self, client_profile_id: Uuid) -> AppResult<ClientProfile> {
        let query = format!("SELECT {CLIENT_COLUMNS} FROM client_profiles WHERE id = $1");
        sqlx::query_as::<_, ClientProfile>(&query)
            .bind(client_profile_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::NotFound("Client"))
    }

    pub async fn get_trainer(&self, trainer_profile_id: Uuid) -> AppResult<TrainerProfile> {
        let query = format!("SELECT {TRAINER_COLUMNS} FROM trainer_profiles WHERE id = $1");
        sqlx::query_as::<_, TrainerProfile>(&query)
            .bind(trainer_profile_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::NotFound("Trainer"))
    }

    /// A client coached by `trainer`; other trainers' clients are forbidden
    pub async fn client_of_trainer(
        &self,
        trainer: &TrainerProfile,
        client_profile_id: Uuid,
    ) -> AppResult<ClientProfile> {
        let client = self.get_client(client_profile_id).await?;
        if client.trainer_profile_id != Some(trainer.id) {
            return Err(AppError::Forbidden("Client is not coached by this trainer"));
        }
        Ok(client)
    }

    /// Resolve a client the caller may read: themselves, their trainee, or anyone for admins
    pub async fn readable_client(
        &self,
        session: &UserSession,
        client_profile_id: Uuid,
    ) -> AppResult<ClientProfile> {
        match session.role {
            UserRole::Client => {
                let own = self.client_for(session).await?;
                if own.id != client_profile_id {
                    return Err(AppError::Forbidden("Cannot access another client's data"));
                }
                Ok(own)
            }
            UserRole::Trainer => {
                let trainer = self.trainer_for(session).await?;
                self.client_of_trainer(&trainer, client_profile_id).await
            }
            UserRole::Admin => self.get_client(client_profile_id).await,
        }
    }

    /// Client targeted by a listing endpoint: the caller, or `client_id` for trainers/admins
    pub async fn resolve_client_scope(
        &self,
        session: &UserSession,
        client_id: Option<Uuid>,
    ) -> AppResult<ClientProfile> {
        match (session.role, client_id) {
            (UserRole::Client, None) => self.client_for(session).await,
            (_, Some(client_id)) => self.readable_client(session, client_id).await,
            (_, None) => Err(AppError::field("client_id", "client_id is required")),
        }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update_trainer_profile(
        &self,
        trainer_profile_id: Uuid,
        request: UpdateTrainerProfile,
    ) -> AppResult<TrainerProfile> {
        let specialties = request.specialties.map(|items| {
            items
                .into_iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        });

        let query = format!(
            "UPDATE trainer_profiles SET
                bio = COALESCE($2, bio),
                specialties = COALESCE($3, specialties),
                years_experience = COALESCE($4, years_experience),
                hourly_rate = COALESCE($5, hourly_rate),
                accepting_clients = COALESCE($6, accepting_clients),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {TRAINER_COLUMNS}"
        );

        sqlx::query_as::<_, TrainerProfile>(&query)
            .bind(trainer_profile_id)
            .bind(request.bio)
            .bind(specialties)
            .bind(request.years_experience)
            .bind(request.hourly_rate)
            .bind(request.accepting_clients)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::NotFound("Trainer profile"))
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update_client_profile(
        &self,
        client_profile_id: Uuid,
        request: UpdateClientProfile,
    ) -> AppResult<ClientProfile> {
        let query = format!(
            "UPDATE client_profiles SET
                date_of_birth = COALESCE($2, date_of_birth),
                height_cm = COALESCE($3, height_cm),
                weight_kg = COALESCE($4, weight_kg),
                fitness_goal = COALESCE($5, fitness_goal),
                activity_level = COALESCE($6, activity_level),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {CLIENT_COLUMNS}"
        );

        sqlx::query_as::<_, ClientProfile>(&query)
            .bind(client_profile_id)
            .bind(request.date_of_birth)
            .bind(request.height_cm)
            .bind(request.weight_kg)
            .bind(request.fitness_goal)
            .bind(request.activity_level)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::NotFound("Client profile"))
    }

    /// Trainers currently accepting clients, optionally filtered by name or specialty
    pub async fn list_trainers(&self, query: TrainerListQuery) -> AppResult<Paginated<TrainerListing>> {
        let pagination = Pagination::new(query.page, query.limit);
        let name_pattern = query.q.map(|q| format!("%{}%", q.trim()));
        let specialty = query.specialty.map(|s| s.trim().to_lowercase());

        let filter = "tp.accepting_clients
            AND ($1::TEXT IS NULL OR u.name ILIKE $1)
            AND ($2::TEXT IS NULL OR $2 = ANY(tp.specialties))";

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM trainer_profiles tp JOIN users u ON u.id = tp.user_id WHERE {filter}"
        ))
        .bind(&name_pattern)
        .bind(&specialty)
        .fetch_one(&self.db)
        .await?;

        let trainers = sqlx::query_as::<_, TrainerListing>(&format!(
            "SELECT tp.id AS trainer_profile_id, tp.user_id, u.name, tp.bio, tp.specialties,
                    tp.years_experience, tp.hourly_rate, tp.accepting_clients,
                    (SELECT COUNT(*) FROM client_profiles cp WHERE cp.trainer_profile_id = tp.id) AS client_count
             FROM trainer_profiles tp
             JOIN users u ON u.id = tp.user_id
             WHERE {filter}
             ORDER BY u.name ASC
             LIMIT $3 OFFSET $4"
        ))
        .bind(&name_pattern)
        .bind(&specialty)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated::new(trainers, total, pagination))
    }

    /// The trainer's clients with the titles of their open plans
    pub async fn list_clients(
        &self,
        trainer_profile_id: Uuid,
        query: ClientListQuery,
    ) -> AppResult<Paginated<ClientSummary>> {
        let pagination = Pagination::new(query.page, query.limit);
        let pattern = query.q.map(|q| format!("%{}%", q.trim()));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM client_profiles cp JOIN users u ON u.id = cp.user_id
             WHERE cp.trainer_profile_id = $1 AND ($2::TEXT IS NULL OR u.name ILIKE $2 OR u.email ILIKE $2)",
        )
        .bind(trainer_profile_id)
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        let clients = sqlx::query_as::<_, ClientSummary>(
            "SELECT cp.id AS client_profile_id, cp.user_id, u.name, u.email, cp.fitness_goal,
                    (SELECT tp.title FROM assigned_training_plans a
                       JOIN training_plans tp ON tp.id = a.plan_id
                      WHERE a.client_profile_id = cp.id AND a.status IN ('assigned', 'active')
                      LIMIT 1) AS active_training_plan,
                    (SELECT np.title FROM assigned_nutrition_plans a
                       JOIN nutrition_plans np ON np.id = a.plan_id
                      WHERE a.client_profile_id = cp.id AND a.status IN ('assigned', 'active')
                      LIMIT 1) AS active_nutrition_plan,
                    (SELECT MAX(l.log_date) FROM daily_logs l WHERE l.client_profile_id = cp.id) AS last_log_date
             FROM client_profiles cp
             JOIN users u ON u.id = cp.user_id
             WHERE cp.trainer_profile_id = $1 AND ($2::TEXT IS NULL OR u.name ILIKE $2 OR u.email ILIKE $2)
             ORDER BY u.name ASC
             LIMIT $3 OFFSET $4",
        )
        .bind(trainer_profile_id)
        .bind(&pattern)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated::new(clients, total, pagination))
    }

    /// Stop coaching a client: detach it and abandon its open assignments
    #[tracing::instrument(skip(self, trainer), fields(trainer_id = %trainer.id))]
    pub async fn release_client(&self, trainer: &TrainerProfile, client_profile_id: Uuid) -> AppResult<()> {
        let client = self.client_of_trainer(trainer, client_profile_id).await?;

        let mut tx = self.db.begin().await?;

        for table in ["assigned_training_plans", "assigned_nutrition_plans"] {
            sqlx::query(&format!(
                "UPDATE {table} SET status = 'abandoned', ended_at = NOW()
                 WHERE client_profile_id = $1 AND status IN ('assigned', 'active')"
            ))
            .bind(client.id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE client_profiles SET trainer_profile_id = NULL, updated_at = NOW()
             WHERE id = $1 AND trainer_profile_id = $2",
        )
        .bind(client.id)
        .bind(trainer.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(client_id = %client.id, "client released");
        Ok(())
    }
}
