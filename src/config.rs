use std::env;

use thiserror::Error;

use crate::auth::TokenService;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration, read once at startup.
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    /// Shared secret used to sign and verify every token.
    pub api_secret: String,
    /// Drop, recreate and seed the tables on startup.
    pub seed_database: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let port = env::var("SERVER_PORT").unwrap_or_else(|_| "8080".to_string());
        let server_port = port.parse().map_err(|_| ConfigError::Invalid {
            name: "SERVER_PORT",
            value: port.clone(),
        })?;

        let seed = env::var("SEED_DATABASE").unwrap_or_default();
        let seed_database = match seed.to_ascii_lowercase().as_str() {
            "" | "0" | "false" | "no" => false,
            "1" | "true" | "yes" => true,
            _ => {
                return Err(ConfigError::Invalid {
                    name: "SEED_DATABASE",
                    value: seed,
                })
            }
        };

        // An absent secret is tolerated so the service still starts, but no
        // token can be issued until it is set.
        let api_secret = env::var("API_SECRET").unwrap_or_default();
        if api_secret.is_empty() {
            log::warn!("API_SECRET is not set; token issuance will fail");
        }

        Ok(Self {
            database_url,
            server_port,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            api_secret,
            seed_database,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    pub fn token_service(&self) -> TokenService {
        TokenService::new(&self.api_secret)
    }
}
