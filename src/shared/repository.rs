use thiserror::Error;

use super::http_error::ApiError;

#[derive(Debug, Error)]
pub enum RepositoryError {
  #[error("Record not found")]
  NotFound,

  /// A uniqueness constraint was violated on the named field.
  #[error("Duplicate value for {0}")]
  Conflict(&'static str),

  #[cfg(feature = "mongodb")]
  #[error("MongoDB error: {0}")]
  Mongo(#[from] mongodb::error::Error),
}

impl From<RepositoryError> for ApiError {
  fn from(error: RepositoryError) -> Self {
    match error {
      RepositoryError::NotFound => ApiError::not_found(),
      RepositoryError::Conflict(field) => ApiError::field(
        field,
        &format!("A record with this {} already exists.", field),
      ),
      #[allow(unreachable_patterns)]
      other => ApiError::Internal(other.to_string()),
    }
  }
}
