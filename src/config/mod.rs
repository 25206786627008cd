use config::ConfigError;
use std::str::FromStr;

pub mod resize;

pub use resize::ResizeConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub frontend_url: String,
    pub resize: ResizeConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        // Nested settings use the double underscore format, e.g. APP_RESIZE__MAX_FILES
        Ok(AppConfig {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("APP_PORT", 3001)?,
            environment: std::env::var("APP_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            frontend_url: std::env::var("APP_FRONTEND__URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            resize: ResizeConfig::from_env()?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            environment: "development".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            resize: ResizeConfig::default(),
        }
    }
}

/// Read `key` from the environment, falling back to `default` when unset
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Message(format!("Invalid {}", key))),
        Err(_) => Ok(default),
    }
}
