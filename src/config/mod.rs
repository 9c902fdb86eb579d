use serde::Deserialize;
use std::fmt;

/// Variables the service cannot start without, with a human-readable purpose.
pub const REQUIRED_ENV: &[(&str, &str)] = &[
    ("DATABASE_URL", "PostgreSQL connection string"),
    ("JWT_SECRET", "Secret key for JWT token signing"),
    ("WHATSAPP_VERIFY_TOKEN", "Token for WhatsApp webhook verification"),
];

const OPTIONAL_ENV: &[&str] = &["ALLOWED_ORIGINS", "PORT"];

pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// HMAC secret used to sign and verify auth tokens
    pub jwt_secret: String,

    /// Shared token Meta sends back during the webhook handshake
    pub whatsapp_verify_token: String,

    /// Comma-separated CORS origins. Falls back to the local dev origin.
    #[serde(default)]
    pub allowed_origins: Option<String>,

    /// Listen port; unset or empty means `DEFAULT_PORT`.
    #[serde(default)]
    pub port: Option<String>,
}

/// A required variable that was unset or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingVar {
    pub name: &'static str,
    pub description: &'static str,
}

impl fmt::Display for MissingVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.description)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Required environment variables not set:{}", format_missing(.0))]
    Missing(Vec<MissingVar>),

    #[error("Invalid PORT value {0:?}: expected a number between 1 and 65535")]
    InvalidPort(String),

    #[error("Failed to parse environment: {0}")]
    Parse(#[from] envy::Error),
}

fn format_missing(missing: &[MissingVar]) -> String {
    missing.iter().map(|m| format!("\n  - {m}")).collect()
}

/// Checks every required key and reports all of the missing ones at once.
pub fn validate_required<F>(lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let missing: Vec<MissingVar> = REQUIRED_ENV
        .iter()
        .filter(|&&(name, _)| lookup(name).map_or(true, |v| v.is_empty()))
        .map(|&(name, description)| MissingVar { name, description })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Missing(missing))
    }
}

impl AppConfig {
    /// Load the optional `.env` overlay, then validate and parse the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_err() {
            tracing::info!("No .env file found, using system environment");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        validate_required(&lookup)?;
        tracing::info!("All required environment variables are set");

        let vars = REQUIRED_ENV
            .iter()
            .map(|(name, _)| *name)
            .chain(OPTIONAL_ENV.iter().copied())
            .filter_map(|name| lookup(name).map(|value| (name.to_string(), value)));

        let config: AppConfig = envy::from_iter(vars)?;
        config.listen_port()?;
        Ok(config)
    }

    pub fn listen_port(&self) -> Result<u16, ConfigError> {
        match self.port.as_deref().map(str::trim) {
            None | Some("") => Ok(DEFAULT_PORT),
            Some(raw) => raw
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or_else(|| ConfigError::InvalidPort(raw.to_string())),
        }
    }

    /// Listener address, always on all interfaces.
    pub fn bind_addr(&self) -> Result<String, ConfigError> {
        Ok(format!("0.0.0.0:{}", self.listen_port()?))
    }
}
