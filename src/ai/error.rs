use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::warn;
use thiserror::Error;

use super::rto::inference_rto::InferenceErrorRto;

/// Every gateway failure is reported to the client as `400 {"error": ...}`.
#[derive(Debug, Error)]
pub enum InferenceError {
  #[error("Input text cannot be empty.")]
  EmptyInput,
  #[error("Input text must be at least {0} words long.")]
  TooShort(usize),
  #[error("Ratio must be greater than 0 and at most 1.")]
  InvalidRatio,
  #[error("Invalid request body: {0}")]
  InvalidBody(String),
  #[error(
    "An error occurred during summarization: Summarization failed, possibly due to insufficient content."
  )]
  EmptySummary,
  #[error("An error occurred during summarization: {0}")]
  Summarization(String),
  #[error("An error occurred during question generation: {0}")]
  QuestionGeneration(String),
}

impl ResponseError for InferenceError {
  fn status_code(&self) -> StatusCode {
    StatusCode::BAD_REQUEST
  }

  fn error_response(&self) -> HttpResponse {
    warn!("Inference request rejected: {}", self);
    HttpResponse::build(self.status_code()).json(InferenceErrorRto {
      error: self.to_string(),
    })
  }
}
