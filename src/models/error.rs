use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankEngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Role operation failed for {user}: {message}")]
    Role { user: String, message: String },

    #[error("Status endpoint unavailable: {0}")]
    Status(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RankEngineError>;
