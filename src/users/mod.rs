pub mod dto;
pub mod model;
pub mod repository;
pub mod rto;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use dto::update_user_dto::UpdateUserDto;
use log::info;
use model::user::{normalize_email, User};
use repository::user_repository::FindOneProperty;
use rto::user_rto::UserRto;
use validator::Validate;

use crate::shared::http_error::{ApiError, HttpError, HttpSuccess};
use crate::shared::permissions::{
  Identity, IsAdmin, IsOwnerOrAdmin, Permission,
};
use crate::shared::repository::RepositoryError;
use crate::AppState;

#[utoipa::path(
  get,
  path = "/accounts/users/",
  responses(
    (status = 200, description = "All users", body = Vec<UserRto>),
    (status = 403, description = "Not an admin", body = HttpError)
  ),
  security(("bearer" = []))
)]
pub async fn list_users(
  data: web::Data<AppState>,
  identity: Identity,
) -> Result<HttpResponse, ApiError> {
  IsAdmin.check(&identity)?;
  let users: Vec<UserRto> = data
    .user_repository
    .find_all()
    .await?
    .into_iter()
    .map(UserRto::from)
    .collect();
  Ok(HttpSuccess::respond(StatusCode::OK, "Users retrieved", users))
}

#[utoipa::path(
  get,
  path = "/accounts/users/me/",
  responses((status = 200, description = "The requesting user", body = UserRto)),
  security(("bearer" = []))
)]
pub async fn me(
  data: web::Data<AppState>,
  identity: Identity,
) -> Result<HttpResponse, ApiError> {
  let user = find_user(&data, &identity.user_id).await?;
  Ok(HttpSuccess::respond(
    StatusCode::OK,
    "User retrieved",
    UserRto::from(user),
  ))
}

#[utoipa::path(
  get,
  path = "/accounts/users/{id}/",
  params(("id" = String, Path, description = "User id")),
  responses(
    (status = 200, description = "The user", body = UserRto),
    (status = 403, description = "Neither the user nor an admin", body = HttpError),
    (status = 404, description = "No such user", body = HttpError)
  ),
  security(("bearer" = []))
)]
pub async fn get_user(
  data: web::Data<AppState>,
  identity: Identity,
  path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
  let id = path.into_inner();
  IsOwnerOrAdmin(&id).check(&identity)?;
  let user = find_user(&data, &id).await?;
  Ok(HttpSuccess::respond(
    StatusCode::OK,
    "User retrieved",
    UserRto::from(user),
  ))
}

#[utoipa::path(
  put,
  path = "/accounts/users/{id}/",
  params(("id" = String, Path, description = "User id")),
  request_body = UpdateUserDto,
  responses(
    (status = 200, description = "Updated user", body = UserRto),
    (status = 400, description = "Validation failed", body = HttpError),
    (status = 403, description = "Not permitted", body = HttpError),
    (status = 404, description = "No such user", body = HttpError)
  ),
  security(("bearer" = []))
)]
pub async fn update_user(
  data: web::Data<AppState>,
  identity: Identity,
  path: web::Path<String>,
  dto: web::Json<UpdateUserDto>,
) -> Result<HttpResponse, ApiError> {
  let id = path.into_inner();
  IsOwnerOrAdmin(&id).check(&identity)?;
  dto.validate()?;
  let dto = dto.into_inner();

  let mut user = find_user(&data, &id).await?;
  if dto.changes_privileged_fields(&user) {
    IsAdmin.check(&identity)?;
  }
  if let Some(email) = dto.email {
    user.email = normalize_email(&email);
  }
  if let Some(first_name) = dto.first_name {
    user.first_name = first_name;
  }
  if let Some(last_name) = dto.last_name {
    user.last_name = last_name;
  }
  if let Some(is_active) = dto.is_active {
    user.is_active = is_active;
  }
  if let Some(is_staff) = dto.is_staff {
    user.is_staff = is_staff;
  }
  if let Some(role_id) = dto.role {
    if let Some(role_id) = &role_id {
      data
        .role_repository
        .find_one(role_id)
        .await
        .map_err(|error| match error {
          RepositoryError::NotFound => {
            ApiError::field("role", "Invalid role id.")
          }
          other => other.into(),
        })?;
    }
    user.role_id = role_id;
  }
  user.updated_at = Utc::now();

  data
    .user_repository
    .update(user.clone())
    .await
    .map_err(|error| match error {
      RepositoryError::Conflict(_) => {
        ApiError::field("email", "A user with this email already exists.")
      }
      other => other.into(),
    })?;

  info!("User {} updated by {}", user.id, identity.user_id);
  Ok(HttpSuccess::respond(
    StatusCode::OK,
    "User updated",
    UserRto::from(user),
  ))
}

#[utoipa::path(
  delete,
  path = "/accounts/users/{id}/",
  params(("id" = String, Path, description = "User id")),
  responses(
    (status = 204, description = "User and profile deleted"),
    (status = 403, description = "Not an admin", body = HttpError),
    (status = 404, description = "No such user", body = HttpError)
  ),
  security(("bearer" = []))
)]
pub async fn delete_user(
  data: web::Data<AppState>,
  identity: Identity,
  path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
  IsAdmin.check(&identity)?;
  let id = path.into_inner();
  data.user_repository.delete(&id).await?;
  data.profile_repository.delete_by_user(&id).await?;
  data.user_repository.clear_creator(&id).await?;
  data.role_repository.clear_creator(&id).await?;
  data.profile_repository.clear_creator(&id).await?;
  info!("User {} deleted by {}", id, identity.user_id);
  Ok(HttpResponse::NoContent().finish())
}

async fn find_user(data: &AppState, id: &str) -> Result<User, ApiError> {
  Ok(
    data
      .user_repository
      .find_one(FindOneProperty::Id(id))
      .await?,
  )
}

/// Creates the configured staff account unless a user with that email
/// already exists.
pub async fn bootstrap_superuser(data: &AppState) -> Result<(), ApiError> {
  let (Some(email), Some(password)) = (
    data.config.superuser_email.as_ref(),
    data.config.superuser_password.as_ref(),
  ) else {
    return Ok(());
  };

  let email = normalize_email(email);
  match data
    .user_repository
    .find_one(FindOneProperty::Email(&email))
    .await
  {
    Ok(_) => return Ok(()),
    Err(RepositoryError::NotFound) => {}
    Err(error) => return Err(error.into()),
  }

  let password_hash = data
    .hasher
    .hash_password(password)
    .await
    .map_err(|error| ApiError::Internal(error.to_string()))?;
  let mut user = User::new(email, String::new(), String::new(), password_hash);
  user.is_staff = true;
  data.user_repository.create(user.clone()).await?;

  info!("Created superuser {}", user.email);
  Ok(())
}
