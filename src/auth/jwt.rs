use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::{AuthError, Claims, TokenKind, UserRole, UserSession};

/// JWT token service for creating and validating tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: Duration,
    refresh_token_expires_in: Duration,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .field("access_token_expires_in", &self.access_token_expires_in)
            .field("refresh_token_expires_in", &self.refresh_token_expires_in)
            .finish()
    }
}

impl JwtService {
    /// Create a service with the default lifetimes (15 minutes / 30 days)
    pub fn new(secret: &str) -> Self {
        Self::with_lifetimes(secret, Duration::minutes(15), Duration::days(30))
    }

    pub fn with_lifetimes(secret: &str, access: Duration, refresh: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in: access,
            refresh_token_expires_in: refresh,
        }
    }

    fn create_token(
        &self,
        user_id: Uuid,
        email: &str,
        role: UserRole,
        kind: TokenKind,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let lifetime = match kind {
            TokenKind::Access => self.access_token_expires_in,
            TokenKind::Refresh => self.refresh_token_expires_in,
        };

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            kind,
            exp: (now + lifetime).timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    pub fn create_access_token(&self, user_id: Uuid, email: &str, role: UserRole) -> Result<String, AuthError> {
        self.create_token(user_id, email, role, TokenKind::Access)
    }

    pub fn create_refresh_token(&self, user_id: Uuid, email: &str, role: UserRole) -> Result<String, AuthError> {
        self.create_token(user_id, email, role, TokenKind::Refresh)
    }

    /// Validate signature and expiry and decode the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    /// Validate a token and require it to be of the given kind
    pub fn validate_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        let claims = self.validate_token(token)?;
        if claims.kind != kind {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    /// Extract user session from an access token
    pub fn extract_user_session(&self, token: &str) -> Result<UserSession, AuthError> {
        let claims = self.validate_kind(token, TokenKind::Access)?;
        UserSession::from_claims(&claims).map_err(|_| AuthError::InvalidToken)
    }

    pub fn access_token_expires_in_seconds(&self) -> usize {
        self.access_token_expires_in.num_seconds() as usize
    }

    pub fn refresh_token_expires_in_seconds(&self) -> usize {
        self.refresh_token_expires_in.num_seconds() as usize
    }

    /// Create token pair (access + refresh)
    pub fn create_token_pair(&self, user_id: Uuid, email: &str, role: UserRole) -> Result<(String, String), AuthError> {
        let access_token = self.create_access_token(user_id, email, role)?;
        let refresh_token = self.create_refresh_token(user_id, email, role)?;
        Ok((access_token, refresh_token))
    }
}

/// Extract bearer token from authorization header
pub fn extract_bearer_token(auth_header: &str) -> Result<&str, AuthError> {
    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::InvalidAuthHeaderFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_creation_and_validation() {
        let jwt_service = JwtService::new("test_secret_long_enough");
        let user_id = Uuid::new_v4();
        let email = "test@example.com";

        let token = jwt_service
            .create_access_token(user_id, email, UserRole::Client)
            .unwrap();

        let claims = jwt_service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, email);
        assert_eq!(claims.role, UserRole::Client);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(extract_bearer_token("Bearer test_token").unwrap(), "test_token");

        assert!(extract_bearer_token("Invalid header").is_err());
        assert!(extract_bearer_token("Bearer ").is_err());
        assert!(extract_bearer_token("bearer abc").is_err());
    }

    #[test]
    fn test_user_session_extraction() {
        let jwt_service = JwtService::new("test_secret_long_enough");
        let user_id = Uuid::new_v4();

        let token = jwt_service
            .create_access_token(user_id, "coach@example.com", UserRole::Trainer)
            .unwrap();

        let session = jwt_service.extract_user_session(&token).unwrap();

        assert_eq!(session.user_id, user_id);
        assert_eq!(session.email, "coach@example.com");
        assert!(session.is_trainer());
    }

    #[test]
    fn test_refresh_token_is_not_a_session() {
        let jwt_service = JwtService::new("test_secret_long_enough");
        let (_, refresh) = jwt_service
            .create_token_pair(Uuid::new_v4(), "a@example.com", UserRole::Client)
            .unwrap();

        assert!(matches!(
            jwt_service.extract_user_session(&refresh),
            Err(AuthError::InvalidToken)
        ));
        assert!(jwt_service.validate_kind(&refresh, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let issuer = JwtService::new("first_secret_long_enough");
        let verifier = JwtService::new("second_secret_long_enough");
        let token = issuer
            .create_access_token(Uuid::new_v4(), "a@example.com", UserRole::Admin)
            .unwrap();

        assert!(matches!(verifier.validate_token(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_reported_as_expired() {
        let jwt_service = JwtService::with_lifetimes(
            "test_secret_long_enough",
            Duration::minutes(-10),
            Duration::days(1),
        );
        let token = jwt_service
            .create_access_token(Uuid::new_v4(), "a@example.com", UserRole::Client)
            .unwrap();

        assert!(matches!(jwt_service.validate_token(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_configured_lifetimes() {
        let jwt_service = JwtService::with_lifetimes(
            "test_secret_long_enough",
            Duration::minutes(30),
            Duration::days(7),
        );

        assert_eq!(jwt_service.access_token_expires_in_seconds(), 30 * 60);
        assert_eq!(jwt_service.refresh_token_expires_in_seconds(), 7 * 24 * 60 * 60);
    }
}
