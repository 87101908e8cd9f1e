use std::collections::BTreeMap;

use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Field name to the list of messages reported for it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("Validation failed")]
  Validation(FieldErrors),
  #[error("{0}")]
  BadRequest(String),
  #[error("{0}")]
  Unauthorized(String),
  #[error("{0}")]
  Forbidden(String),
  #[error("{0}")]
  NotFound(String),
  #[error("Internal server error: {0}")]
  Internal(String),
}

impl ApiError {
  pub fn field(field: &str, message: &str) -> Self {
    let mut errors = FieldErrors::new();
    errors.insert(field.to_string(), vec![message.to_string()]);
    ApiError::Validation(errors)
  }

  pub fn forbidden() -> Self {
    ApiError::Forbidden(
      "You do not have permission to perform this action.".to_string(),
    )
  }

  pub fn not_found() -> Self {
    ApiError::NotFound("Not found.".to_string())
  }
}

impl From<ValidationErrors> for ApiError {
  fn from(errors: ValidationErrors) -> Self {
    ApiError::Validation(field_errors(&errors, ""))
  }
}

/// Flattens validator output into a field map, prefixing each field name.
pub fn field_errors(errors: &ValidationErrors, prefix: &str) -> FieldErrors {
  errors
    .field_errors()
    .into_iter()
    .map(|(field, errors)| {
      let messages = errors
        .iter()
        .map(|error| {
          error
            .message
            .as_ref()
            .map(|message| message.to_string())
            .unwrap_or_else(|| error.code.to_string())
        })
        .collect();
      (format!("{}{}", prefix, field), messages)
    })
    .collect()
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HttpError {
  pub status: String,
  pub message: String,
  pub errors: Option<FieldErrors>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HttpSuccess<T> {
  pub status: String,
  pub message: String,
  pub data: T,
}

impl<T: Serialize> HttpSuccess<T> {
  pub fn respond(status: StatusCode, message: &str, data: T) -> HttpResponse {
    HttpResponse::build(status)
      .content_type("application/json")
      .json(HttpSuccess {
        status: String::from("success"),
        message: message.to_string(),
        data,
      })
  }
}

impl ResponseError for ApiError {
  fn status_code(&self) -> StatusCode {
    match self {
      ApiError::Validation(_) | ApiError::BadRequest(_) => {
        StatusCode::BAD_REQUEST
      }
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let (message, errors) = match self {
      ApiError::Validation(errors) => {
        warn!("Validation error: {:?}", errors);
        (String::from("Validation failed"), Some(errors.clone()))
      }
      ApiError::Internal(cause) => {
        error!("Internal server error: {}", cause);
        (String::from("Internal server error"), None)
      }
      other => {
        warn!("{}: {}", other.status_code(), other);
        (other.to_string(), None)
      }
    };

    HttpResponse::build(self.status_code())
      .content_type("application/json")
      .json(HttpError {
        status: String::from("error"),
        message,
        errors,
      })
  }
}

/// Body errors for the envelope endpoints. Parser details stay in the logs.
pub fn json_error_handler(
  error: JsonPayloadError,
  _: &HttpRequest,
) -> actix_web::Error {
  debug!("Rejected request body: {}", error);
  let message = match &error {
    JsonPayloadError::Deserialize(cause) if cause.is_syntax() => {
      String::from("Malformed JSON request body.")
    }
    JsonPayloadError::Deserialize(_) => String::from("Invalid request body."),
    JsonPayloadError::ContentType => {
      String::from("Expected an application/json request body.")
    }
    other => other.to_string(),
  };
  ApiError::BadRequest(message).into()
}
