use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Test,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub store: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_expiration_minutes: i64,
    pub refresh_expiration_days: i64,
    pub reset_password_expiration_minutes: i64,
    pub verify_email_expiration_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub from: String,
    /// Base URL of the client app, used to build links in outgoing mail
    pub app_url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").or_else(|_| env::var("NODE_ENV")).as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("test") => Environment::Test,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Test => Self::test(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("PORT") {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_STORE") {
            match v.to_ascii_lowercase().as_str() {
                "memory" => self.database.store = StoreBackend::Memory,
                "postgres" | "postgresql" => self.database.store = StoreBackend::Postgres,
                _ => {}
            }
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // JWT overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRATION_MINUTES") {
            self.jwt.access_expiration_minutes = v.parse().unwrap_or(self.jwt.access_expiration_minutes);
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRATION_DAYS") {
            self.jwt.refresh_expiration_days = v.parse().unwrap_or(self.jwt.refresh_expiration_days);
        }
        if let Ok(v) = env::var("JWT_RESET_PASSWORD_EXPIRATION_MINUTES") {
            self.jwt.reset_password_expiration_minutes =
                v.parse().unwrap_or(self.jwt.reset_password_expiration_minutes);
        }
        if let Ok(v) = env::var("JWT_VERIFY_EMAIL_EXPIRATION_MINUTES") {
            self.jwt.verify_email_expiration_minutes =
                v.parse().unwrap_or(self.jwt.verify_email_expiration_minutes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Email overrides
        if let Ok(v) = env::var("EMAIL_FROM") {
            self.email.from = v;
        }
        if let Ok(v) = env::var("APP_URL") {
            self.email.app_url = v;
        }

        self
    }

    /// Checks that must pass before the server accepts traffic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.database.store == StoreBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if url::Url::parse(&self.email.app_url).is_err() {
            return Err(ConfigError::Invalid {
                field: "APP_URL",
                message: format!("not an absolute URL: {}", self.email.app_url),
            });
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Default tracing directive when `RUST_LOG` is not set.
    pub fn default_log_level(&self) -> &'static str {
        match self.environment {
            Environment::Development => "debug",
            _ => "info",
        }
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                port: 3000,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            database: DatabaseConfig {
                store: StoreBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            jwt: JwtConfig {
                secret: "thisisasamplesecret".to_string(),
                ..JwtConfig::default_expirations()
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            email: EmailConfig {
                from: "support@tasktrack.local".to_string(),
                app_url: "http://localhost:3000".to_string(),
            },
        }
    }

    /// In-memory store and a fixed secret; what the integration tests run on.
    pub fn test() -> Self {
        Self {
            environment: Environment::Test,
            api: ApiConfig {
                port: 0,
                max_request_size_bytes: 1024 * 1024,
            },
            database: DatabaseConfig {
                store: StoreBackend::Memory,
                url: None,
                max_connections: 2,
                connection_timeout: 5,
                run_migrations: false,
            },
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
                ..JwtConfig::default_expirations()
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![],
            },
            email: EmailConfig {
                from: "support@tasktrack.local".to_string(),
                app_url: "http://localhost:3000".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                port: 8080,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            database: DatabaseConfig {
                store: StoreBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            // No default secret in production; validate() rejects the empty string
            jwt: JwtConfig {
                secret: String::new(),
                ..JwtConfig::default_expirations()
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            email: EmailConfig {
                from: "support@example.com".to_string(),
                app_url: "https://app.example.com".to_string(),
            },
        }
    }
}

impl JwtConfig {
    fn default_expirations() -> Self {
        Self {
            secret: String::new(),
            access_expiration_minutes: 30,
            refresh_expiration_days: 30,
            reset_password_expiration_minutes: 10,
            verify_email_expiration_minutes: 10,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.jwt.access_expiration_minutes, 30);
        assert_eq!(config.jwt.refresh_expiration_days, 30);
        assert_eq!(config.default_log_level(), "debug");
        assert_eq!(config.database.store, StoreBackend::Postgres);
    }

    #[test]
    fn production_requires_secret() {
        let mut config = AppConfig::production();
        config.database.url = Some("postgres://localhost/tasktrack".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Missing("JWT_SECRET"))));

        config.jwt.secret = "s3cret".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_log_level(), "info");
    }

    #[test]
    fn postgres_requires_url() {
        let mut config = AppConfig::development();
        config.database.url = None;
        assert!(matches!(config.validate(), Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn test_preset_is_self_contained() {
        let config = AppConfig::test();
        assert_eq!(config.database.store, StoreBackend::Memory);
        assert!(config.validate().is_ok());
    }
}
