use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::UserRole;
use crate::error::{AppError, AppResult};
use crate::models::{optional_text, Paginated, Pagination, UpdateUser, User, UserListQuery};

#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, user_id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, name, role, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound("User"))
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update_user(&self, user_id: Uuid, update: UpdateUser) -> AppResult<User> {
        let name = optional_text("name", update.name.as_deref())?;
        let email = update.email.map(|e| e.trim().to_lowercase());

        // duplicate emails surface as a unique violation (409)
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, role, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound("User"))
    }

    pub async fn list_users(&self, query: UserListQuery) -> AppResult<Paginated<User>> {
        let pagination = Pagination::new(query.page, query.limit);
        let pattern = query.q.map(|q| format!("%{}%", q.trim()));

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
              AND ($2::TEXT IS NULL OR name ILIKE $2 OR email ILIKE $2)
            "#,
        )
        .bind(query.role)
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, role, created_at, updated_at FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
              AND ($2::TEXT IS NULL OR name ILIKE $2 OR email ILIKE $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.role)
        .bind(&pattern)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated::new(users, total, pagination))
    }

    /// Change a user's role, creating the profile row the new role needs
    #[tracing::instrument(skip(self))]
    pub async fn update_role(&self, user_id: Uuid, role: UserRole) -> AppResult<User> {
        let mut tx = self.db.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, role, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(role)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("User"))?;

        let profile_table = match role {
            UserRole::Trainer => Some("trainer_profiles"),
            UserRole::Client => Some("client_profiles"),
            UserRole::Admin => None,
        };
        if let Some(table) = profile_table {
            sqlx::query(&format!(
                "INSERT INTO {table} (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING"
            ))
            .bind(Uuid::new_v4())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        // existing sessions carry the old role
        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = %user.id, role = role.as_str(), "user role changed");
        Ok(user)
    }
}
