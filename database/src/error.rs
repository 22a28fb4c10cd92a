use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage configuration error: {0}")]
    Configuration(String),

    #[error("Post not found: {0}")]
    NotFound(String),

    #[error("This slug is already in use")]
    DuplicateSlug,

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<posts::PostsError> for StoreError {
    fn from(err: posts::PostsError) -> Self {
        StoreError::Configuration(err.to_string())
    }
}
