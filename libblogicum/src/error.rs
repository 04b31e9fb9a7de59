//! Error types for Blogicum

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BlogError>;

#[derive(Error, Debug)]
pub enum BlogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl BlogError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            BlogError::NotFound(_) => 4,
            BlogError::InvalidInput(_) => 3,
            BlogError::PermissionDenied(_) => 2,
            BlogError::Config(_) => 1,
            BlogError::Database(_) => 1,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BlogError::NotFound(_))
    }

    pub(crate) fn not_found(what: &str, key: impl std::fmt::Display) -> Self {
        BlogError::NotFound(format!("{} {} not found", what, key))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Constraint violated: {0}")]
    Constraint(String),
}
