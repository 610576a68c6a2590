use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }

        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                acquire_timeout_secs: 30,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:8081".to_string(),
                ],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                acquire_timeout_secs: 10,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.tradematch.example".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                acquire_timeout_secs: 5,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.tradematch.example".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
            },
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
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.max_connections, 10);
        assert!(config.api.enable_request_logging);
        assert_eq!(config.security.jwt_expiry_hours, 24 * 7);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.database.max_connections, 50);
        assert!(!config.api.enable_request_logging);
        assert_eq!(config.security.jwt_expiry_hours, 4);
    }
}
