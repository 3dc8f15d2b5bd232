use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Environment-driven service configuration.
///
/// Defaults apply first, then any of the recognized environment variables
/// (honoring a `.env` file loaded by the binary) override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds, embedded in the `exp` claim.
    pub jwt_expires_in: u64,
    /// Comma-separated origin list, or `*` for any origin.
    pub allowed_origins: String,
    pub loglevel: String,
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: "sqlite:linkstash.db".to_string(),
            jwt_secret: "change-me".to_string(),
            jwt_expires_in: 7200,
            allowed_origins: "*".to_string(),
            loglevel: "info".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(&[
                "PORT",
                "DATABASE_URL",
                "JWT_SECRET",
                "JWT_EXPIRES_IN",
                "ALLOWED_ORIGINS",
                "LOGLEVEL",
                "ENVIRONMENT",
            ]))
            .extract()
    }

    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
