use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};

use super::http_error::ApiError;

/// The authenticated principal attached to a request by the bearer
/// middleware. It is derived from the stored user, not from token claims
/// alone, so deactivation and staff changes apply immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  pub user_id: String,
  pub email: String,
  pub is_staff: bool,
}

impl FromRequest for Identity {
  type Error = ApiError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
    ready(req.extensions().get::<Identity>().cloned().ok_or_else(|| {
      ApiError::Unauthorized(
        "Authentication credentials were not provided.".to_string(),
      )
    }))
  }
}

pub trait Permission {
  fn has_permission(&self, identity: &Identity) -> bool;

  fn check(&self, identity: &Identity) -> Result<(), ApiError> {
    if self.has_permission(identity) {
      Ok(())
    } else {
      Err(ApiError::forbidden())
    }
  }
}

pub struct IsAdmin;

impl Permission for IsAdmin {
  fn has_permission(&self, identity: &Identity) -> bool {
    identity.is_staff
  }
}

/// Grants access to the owner of a record, or to any admin.
pub struct IsOwnerOrAdmin<'a>(pub &'a str);

impl Permission for IsOwnerOrAdmin<'_> {
  fn has_permission(&self, identity: &Identity) -> bool {
    identity.is_staff || identity.user_id == self.0
  }
}
