use serde::Deserialize;
use service_core::config::{self as core_config, get_env, get_env_parsed, split_list};
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct CongregationConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
    pub invites: InviteConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub session_expiry_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub session_cookie_secure: bool,
    /// Emails that receive the `super_admin` global role at registration.
    pub super_admin_emails: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InviteConfig {
    /// Prefix for the shareable invite link; the token is appended.
    pub base_url: String,
}

const MIN_PROD_SECRET_LEN: usize = 32;

impl CongregationConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = CongregationConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("congregation-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            // Optional in every environment
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: get_env_parsed("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?,
                min_connections: get_env_parsed("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?,
            },
            redis: env::var("REDIS_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .map(|url| RedisConfig { url }),
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET", Some("dev-only-insecure-session-secret"), is_prod)?,
                session_expiry_minutes: get_env_parsed(
                    "JWT_SESSION_EXPIRY_MINUTES",
                    Some("10080"),
                    is_prod,
                )?,
            },
            security: SecurityConfig {
                allowed_origins: split_list(&get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?),
                session_cookie_secure: get_env_parsed(
                    "SESSION_COOKIE_SECURE",
                    Some(if is_prod { "true" } else { "false" }),
                    is_prod,
                )?,
                super_admin_emails: env::var("SUPER_ADMIN_EMAILS")
                    .map(|raw| split_list(&raw))
                    .unwrap_or_default()
                    .into_iter()
                    .map(|email| email.to_lowercase())
                    .collect(),
            },
            invites: InviteConfig {
                base_url: get_env(
                    "INVITE_BASE_URL",
                    Some("http://localhost:3000/invites/"),
                    is_prod,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn is_prod(&self) -> bool {
        self.environment == Environment::Prod
    }

    pub fn is_super_admin_email(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.security.super_admin_emails.iter().any(|e| *e == email)
    }

    pub(crate) fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.jwt.session_expiry_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SESSION_EXPIRY_MINUTES must be positive"
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS cannot exceed DATABASE_MAX_CONNECTIONS"
            )));
        }

        // In production, ensure stricter validation
        if self.environment == Environment::Prod {
            if self.jwt.secret.len() < MIN_PROD_SECRET_LEN {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "JWT_SECRET must be at least {} bytes in production",
                    MIN_PROD_SECRET_LEN
                )));
            }

            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.redis.is_none() {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "REDIS_URL is required in production"
                )));
            }

            if !self.security.session_cookie_secure {
                tracing::warn!("SESSION_COOKIE_SECURE is disabled in production");
            }
        }

        Ok(())
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
