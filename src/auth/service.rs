use chrono::Duration;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{
    AuthError, AuthResponse, ChangePasswordRequest, JwtService, LoginRequest, MessageResponse,
    RefreshTokenRequest, RegisterRequest, TokenKind, TokenResponse, UserInfo, UserRole, UserSession,
};

/// User row including the password hash, never serialized
#[derive(Debug, Clone, sqlx::FromRow)]
struct Credentials {
    id: Uuid,
    email: String,
    name: String,
    role: UserRole,
    password_hash: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl Credentials {
    fn info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    db: PgPool,
}

impl AuthService {
    pub fn new(db: PgPool, jwt_secret: &str) -> Self {
        Self {
            jwt_service: JwtService::new(jwt_secret),
            db,
        }
    }

    pub fn with_token_lifetimes(db: PgPool, jwt_secret: &str, access_minutes: i64, refresh_days: i64) -> Self {
        Self {
            jwt_service: JwtService::with_lifetimes(
                jwt_secret,
                Duration::minutes(access_minutes),
                Duration::days(refresh_days),
            ),
            db,
        }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt_service
    }

    /// Register a new user together with the profile matching its role
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let role = request.role.unwrap_or(UserRole::Client);
        if role == UserRole::Admin {
            return Err(AuthError::InsufficientPermissions);
        }

        let email = request.email.trim().to_lowercase();
        if self.find_credentials(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&request.password)?;

        let mut tx = self.db.begin().await?;

        let user = sqlx::query_as::<_, Credentials>(
            "INSERT INTO users (id, email, name, role, password_hash)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, email, name, role, password_hash, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(request.name.trim())
        .bind(role)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let profile_sql = match role {
            UserRole::Trainer => "INSERT INTO trainer_profiles (id, user_id) VALUES ($1, $2)",
            _ => "INSERT INTO client_profiles (id, user_id) VALUES ($1, $2)",
        };
        sqlx::query(profile_sql)
            .bind(Uuid::new_v4())
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = %user.id, role = role.as_str(), "user registered");
        self.issue_tokens(&user).await
    }

    /// Login user
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let email = request.email.trim().to_lowercase();
        let user = self
            .find_credentials(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_tokens(&user).await
    }

    /// Exchange a stored refresh token for a new access token
    pub async fn refresh_token(&self, request: RefreshTokenRequest) -> Result<TokenResponse, AuthError> {
        let claims = self
            .jwt_service
            .validate_kind(&request.refresh_token, TokenKind::Refresh)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        if !self.is_refresh_token_valid(user_id, &request.refresh_token).await? {
            return Err(AuthError::InvalidToken);
        }

        // Role may have changed since the refresh token was issued
        let role = sqlx::query_scalar::<_, UserRole>("SELECT role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let access_token = self
            .jwt_service
            .create_access_token(user_id, &claims.email, role)?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
        })
    }

    /// Blacklist the access token and revoke the user's refresh tokens
    pub async fn logout(&self, token: &str) -> Result<MessageResponse, AuthError> {
        let claims = self.jwt_service.validate_kind(token, TokenKind::Access)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        self.blacklist_token(&claims.jti, claims.exp as i64).await?;
        self.revoke_user_refresh_tokens(user_id).await?;

        Ok(MessageResponse {
            message: "Successfully logged out".to_string(),
        })
    }

    pub async fn change_password(
        &self,
        session: &UserSession,
        request: ChangePasswordRequest,
    ) -> Result<MessageResponse, AuthError> {
        let user = self
            .find_credentials(&session.email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(&request.current_password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let new_hash = hash_password(&request.new_password)?;
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user.id)
            .bind(new_hash)
            .execute(&self.db)
            .await?;

        self.revoke_user_refresh_tokens(user.id).await?;

        Ok(MessageResponse {
            message: "Password changed successfully".to_string(),
        })
    }

    pub async fn current_user(&self, session: &UserSession) -> Result<UserInfo, AuthError> {
        sqlx::query_as::<_, UserInfo>(
            "SELECT id, email, name, role, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(session.user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AuthError::UserNotFound)
    }

    pub async fn is_token_blacklisted(&self, jti: &str) -> Result<bool, AuthError> {
        let result = sqlx::query("SELECT 1 FROM token_blacklist WHERE jti = $1 AND expires_at > NOW()")
            .bind(jti)
            .fetch_optional(&self.db)
            .await?;

        Ok(result.is_some())
    }

    /// Validate user session from token
    pub async fn validate_session(&self, token: &str) -> Result<UserSession, AuthError> {
        let session = self.jwt_service.extract_user_session(token)?;

        if self.is_token_blacklisted(&session.jti).await? {
            return Err(AuthError::InvalidToken);
        }

        Ok(session)
    }

    async fn issue_tokens(&self, user: &Credentials) -> Result<AuthResponse, AuthError> {
        let (access_token, refresh_token) = self
            .jwt_service
            .create_token_pair(user.id, &user.email, user.role)?;

        self.store_refresh_token(user.id, &refresh_token).await?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
            user: user.info(),
        })
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, AuthError> {
        let user = sqlx::query_as::<_, Credentials>(
            "SELECT id, email, name, role, password_hash, created_at, updated_at
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn store_refresh_token(&self, user_id: Uuid, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self.jwt_service.validate_token(refresh_token)?;
        let expires_at = chrono::DateTime::from_timestamp(claims.exp as i64, 0)
            .ok_or(AuthError::InvalidToken)?;

        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token_digest(refresh_token))
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn is_refresh_token_valid(&self, user_id: Uuid, refresh_token: &str) -> Result<bool, AuthError> {
        let result = sqlx::query(
            "SELECT 1 FROM refresh_tokens
             WHERE user_id = $1 AND token_hash = $2 AND expires_at > NOW() AND NOT revoked",
        )
        .bind(user_id)
        .bind(token_digest(refresh_token))
        .fetch_optional(&self.db)
        .await?;

        Ok(result.is_some())
    }

    async fn revoke_user_refresh_tokens(&self, user_id: Uuid) -> Result<(), AuthError> {
        sqlx::query("UPDATE refresh_tokens SET revoked = true WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn blacklist_token(&self, jti: &str, exp: i64) -> Result<(), AuthError> {
        let expires_at = chrono::DateTime::from_timestamp(exp, 0).ok_or(AuthError::InvalidToken)?;

        sqlx::query(
            "INSERT INTO token_blacklist (jti, expires_at) VALUES ($1, $2)
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

fn token_digest(token: &str) -> String {
    format!("{:x}", md5::compute(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_digest_is_stable_hex() {
        let digest = token_digest("abc");
        assert_eq!(digest, "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(digest, token_digest("abc"));
        assert_ne!(digest, token_digest("abd"));
    }
}
