use anyhow::{bail, Result};
use std::env;

const DEV_JWT_SECRET: &str = "coach-hub-dev-secret-change-in-production";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub cors_origin: Option<String>,
    pub run_migrations: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string());
        let access_token_ttl_minutes = env::var("ACCESS_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .unwrap_or(15);
        let refresh_token_ttl_days = env::var("REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);
        let cors_origin = env::var("CORS_ORIGIN").ok().filter(|origin| !origin.is_empty());
        let run_migrations = env::var("RUN_MIGRATIONS")
            .map(|value| value != "false" && value != "0")
            .unwrap_or(true);

        let config = AppConfig {
            host,
            port,
            environment,
            log_level,
            jwt_secret,
            access_token_ttl_minutes,
            refresh_token_ttl_days,
            cors_origin,
            run_migrations,
        };
        config.validate()?;

        Ok(config)
    }

    /// Reject settings that are only acceptable on a developer machine.
    pub fn validate(&self) -> Result<()> {
        if self.is_production() && self.jwt_secret == DEV_JWT_SECRET {
            bail!("JWT_SECRET must be set in production");
        }
        if self.jwt_secret.len() < 16 {
            bail!("JWT_SECRET must be at least 16 characters");
        }
        if self.access_token_ttl_minutes <= 0 || self.refresh_token_ttl_days <= 0 {
            bail!("token lifetimes must be positive");
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 30,
            cors_origin: None,
            run_migrations: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid_outside_production() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_development());
        assert_eq!(config.server_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_production_rejects_default_secret() {
        let config = AppConfig {
            environment: "production".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        let config = AppConfig {
            jwt_secret: "short".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
