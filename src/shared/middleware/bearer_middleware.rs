use actix_web::dev::ServiceRequest;
use actix_web::{web, Error, HttpMessage};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use log::debug;

use crate::auth::token::decode_access_token;
use crate::shared::http_error::ApiError;
use crate::shared::permissions::Identity;
use crate::users::repository::user_repository::FindOneProperty;
use crate::AppState;

/// Resolves the bearer access token to an active user and attaches the
/// resulting [`Identity`] to the request.
pub async fn bearer_validator(
  req: ServiceRequest,
  credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
  match authenticate(&req, credentials.token()).await {
    Ok(identity) => {
      req.extensions_mut().insert(identity);
      Ok(req)
    }
    Err(error) => Err((error.into(), req)),
  }
}

async fn authenticate(
  req: &ServiceRequest,
  token: &str,
) -> Result<Identity, ApiError> {
  let data = req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| ApiError::Internal("Application state missing".into()))?;

  let claims = decode_access_token(&data.config, token).map_err(|error| {
    debug!("Rejected access token: {}", error);
    unauthorized()
  })?;

  let user = data
    .user_repository
    .find_one(FindOneProperty::Id(&claims.sub))
    .await
    .map_err(|_| unauthorized())?;
  if !user.is_active {
    return Err(unauthorized());
  }

  Ok(Identity {
    user_id: user.id,
    email: user.email,
    is_staff: user.is_staff,
  })
}

fn unauthorized() -> ApiError {
  ApiError::Unauthorized("Invalid or expired access token".to_string())
}
