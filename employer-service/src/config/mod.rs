use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Shortest JWT secret accepted in production.
const MIN_PROD_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct EmployerConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub smtp: SmtpConfig,
    pub twilio: TwilioConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub verify_service_sid: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub signup_attempts: u32,
    pub signup_window_seconds: u64,
    pub verify_attempts: u32,
    pub verify_window_seconds: u64,
}

impl EmployerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = EmployerConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("employer-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("employer_db"), is_prod)?,
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET", Some("dev-secret-change-me"), is_prod)?,
                expiry_minutes: get_env("JWT_EXPIRY_MINUTES", Some("60"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("smtp.gmail.com"), is_prod)?,
                port: get_env("SMTP_PORT", Some("587"), is_prod)?
                    .parse()
                    .unwrap_or(587),
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: get_env("SMTP_PASSWORD", Some(""), is_prod)?,
                from_email: get_env("SMTP_FROM_EMAIL", Some("noreply@example.com"), is_prod)?,
                from_name: get_env("SMTP_FROM_NAME", Some("Employer Onboarding"), is_prod)?,
                enabled: parse_flag("SMTP_ENABLED"),
            },
            twilio: TwilioConfig {
                account_sid: get_env("TWILIO_ACCOUNT_SID", Some(""), is_prod)?,
                auth_token: get_env("TWILIO_AUTH_TOKEN", Some(""), is_prod)?,
                verify_service_sid: get_env("TWILIO_VERIFY_SERVICE_SID", Some(""), is_prod)?,
                enabled: parse_flag("TWILIO_ENABLED"),
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            },
            rate_limit: RateLimitConfig {
                signup_attempts: get_env("RATE_LIMIT_SIGNUP_ATTEMPTS", Some("5"), is_prod)?
                    .parse()
                    .unwrap_or(5),
                signup_window_seconds: get_env(
                    "RATE_LIMIT_SIGNUP_WINDOW_SECONDS",
                    Some("3600"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(3600),
                verify_attempts: get_env("RATE_LIMIT_VERIFY_ATTEMPTS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
                verify_window_seconds: get_env(
                    "RATE_LIMIT_VERIFY_WINDOW_SECONDS",
                    Some("900"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(900),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn is_prod(&self) -> bool {
        self.environment == Environment::Prod
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.jwt.expiry_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_EXPIRY_MINUTES must be positive"
            )));
        }

        if self.is_prod() {
            if self.jwt.secret.len() < MIN_PROD_SECRET_LEN {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "JWT_SECRET must be at least {} characters in production",
                    MIN_PROD_SECRET_LEN
                )));
            }

            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_flag(key: &str) -> bool {
    env::var(key)
        .unwrap_or_else(|_| "false".to_string())
        .parse()
        .unwrap_or(false)
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

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: Environment) -> EmployerConfig {
        EmployerConfig {
            common: core_config::Config::default(),
            environment,
            service_name: "employer-service".to_string(),
            service_version: "test".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            mongodb: MongoConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "employer_test".to_string(),
            },
            jwt: JwtConfig {
                secret: "s".repeat(MIN_PROD_SECRET_LEN),
                expiry_minutes: 60,
            },
            smtp: SmtpConfig {
                host: "localhost".to_string(),
                port: 587,
                user: String::new(),
                password: String::new(),
                from_email: "noreply@example.com".to_string(),
                from_name: "Employer Onboarding".to_string(),
                enabled: false,
            },
            twilio: TwilioConfig {
                account_sid: String::new(),
                auth_token: String::new(),
                verify_service_sid: String::new(),
                enabled: false,
            },
            security: SecurityConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            rate_limit: RateLimitConfig {
                signup_attempts: 5,
                signup_window_seconds: 3600,
                verify_attempts: 10,
                verify_window_seconds: 900,
            },
        }
    }

    #[test]
    fn accepts_sane_defaults() {
        assert!(config(Environment::Dev).validate().is_ok());
        assert!(config(Environment::Prod).validate().is_ok());
    }

    #[test]
    fn rejects_zero_port_and_expiry() {
        let mut cfg = config(Environment::Dev);
        cfg.common.port = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = config(Environment::Dev);
        cfg.jwt.expiry_minutes = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn prod_rejects_weak_secret_and_wildcard_cors() {
        let mut cfg = config(Environment::Prod);
        cfg.jwt.secret = "short".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = config(Environment::Prod);
        cfg.security.allowed_origins = vec!["*".to_string()];
        assert!(cfg.validate().is_err());

        let mut cfg = config(Environment::Dev);
        cfg.jwt.secret = "short".to_string();
        cfg.security.allowed_origins = vec!["*".to_string()];
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn get_env_requires_value_in_prod() {
        let key = "EMPLOYER_CONFIG_TEST_UNSET_KEY";
        assert_eq!(get_env(key, Some("fallback"), false).unwrap(), "fallback");
        assert!(get_env(key, Some("fallback"), true).is_err());
        assert!(get_env(key, None, false).is_err());
    }

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Prod);
        assert!("staging".parse::<Environment>().is_err());
    }
}
