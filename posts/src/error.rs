use thiserror::Error;

pub type Result<T> = std::result::Result<T, PostsError>;

#[derive(Error, Debug)]
pub enum PostsError {
    #[error("Storage profile error: {0}")]
    Profile(String),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Unknown canonical field: {0}")]
    UnknownField(String),
}
