use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("A query must be provided (use --query or [run].query)")]
    EmptyQuery,
    #[error("Concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("Iteration count must be at least 1")]
    ZeroIterations,
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Invalid database address '{0}': expected host or host:port")]
    InvalidHost(String),
    #[error("Unsupported database URL '{0}': expected mysql://, mariadb:// or sqlite:")]
    UnsupportedScheme(String),
    #[error("Failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid duration '{0}'")]
    InvalidDuration(String),
    #[error("Invalid duration unit '{unit}' in '{input}'")]
    InvalidDurationUnit { unit: String, input: String },
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type AppResult<T> = Result<T, AppError>;
pub type DbResult<T> = Result<T, DbError>;
