use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// Days between invoice date and due date when no due date is supplied
    pub default_due_days: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: "development".to_string(),
            log_level: "info".to_string(),
            default_due_days: 30,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                default_due_days: env::var("DEFAULT_DUE_DAYS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .map_err(|_| AppError::Configuration("Invalid DEFAULT_DUE_DAYS".to_string()))?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.app.default_due_days <= 0 {
            return Err(AppError::Configuration(
                "Default due days must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Install a global tracing subscriber honoring the configured log level.
    ///
    /// `RUST_LOG` takes precedence over the configured level. Safe to call
    /// more than once; later calls are ignored.
    pub fn init_tracing(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.app.log_level.clone()));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init();
    }
}
