use crate::config::ConfigError;
use crate::db::migrate::MigrateError;
use crate::db::ConnectError;

/// Fatal startup failures. The binary logs these and exits; nothing retries them.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Migrate(#[from] MigrateError),

    #[error("Failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

impl StartupError {
    /// Short label for the log line: operator fixes config or infrastructure.
    pub fn category(&self) -> &'static str {
        match self {
            StartupError::Config(_) => "configuration",
            StartupError::Connect(_) | StartupError::Migrate(_) => "infrastructure",
            StartupError::Bind { .. } | StartupError::Serve(_) => "listener",
        }
    }
}
