use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    #[allow(dead_code)] // Error variant for storage backends other than in-memory
    Repository(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
