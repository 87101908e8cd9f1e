pub mod dto;
pub mod model;
pub mod repository;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use dto::profile_dto::{ProfileDto, UpdateProfileDto};
use log::info;
use model::profile::Profile;
use nanoid::nanoid;
use validator::Validate;

use crate::shared::http_error::{ApiError, HttpError, HttpSuccess};
use crate::shared::permissions::{
  Identity, IsAdmin, IsOwnerOrAdmin, Permission,
};
use crate::shared::repository::RepositoryError;
use crate::users::repository::user_repository::FindOneProperty;
use crate::AppState;

impl Profile {
  pub fn from(
    dto: ProfileDto,
    user_id: String,
    created_by: Option<String>,
  ) -> Self {
    let now = Utc::now();
    Self {
      id: nanoid!(),
      user_id,
      date_of_birth: dto.date_of_birth,
      profile_picture: dto.profile_picture,
      contact_number: dto.contact_number,
      address: dto.address,
      created_at: now,
      updated_at: now,
      created_by,
    }
  }
}

#[utoipa::path(
  get,
  path = "/accounts/profiles/",
  responses((status = 200, description = "Visible profiles", body = Vec<Profile>)),
  security(("bearer" = []))
)]
pub async fn list_profiles(
  data: web::Data<AppState>,
  identity: Identity,
) -> Result<HttpResponse, ApiError> {
  let profiles = if IsAdmin.has_permission(&identity) {
    data.profile_repository.find_all().await?
  } else {
    data
      .profile_repository
      .find_by_user(&identity.user_id)
      .await?
  };
  Ok(HttpSuccess::respond(
    StatusCode::OK,
    "Profiles retrieved",
    profiles,
  ))
}

#[utoipa::path(
  post,
  path = "/accounts/profiles/",
  request_body = ProfileDto,
  responses(
    (status = 201, description = "Profile created", body = Profile),
    (status = 400, description = "Validation failed or profile exists", body = HttpError),
    (status = 403, description = "Creating for another user", body = HttpError)
  ),
  security(("bearer" = []))
)]
pub async fn create_profile(
  data: web::Data<AppState>,
  identity: Identity,
  dto: web::Json<ProfileDto>,
) -> Result<HttpResponse, ApiError> {
  dto.validate()?;
  let dto = dto.into_inner();

  let user_id = match dto.user_id.clone() {
    Some(user_id) if user_id != identity.user_id => {
      IsAdmin.check(&identity)?;
      user_id
    }
    _ => identity.user_id.clone(),
  };

  data
    .user_repository
    .find_one(FindOneProperty::Id(&user_id))
    .await
    .map_err(|error| match error {
      RepositoryError::NotFound => {
        ApiError::field("user_id", "Invalid user id.")
      }
      other => other.into(),
    })?;

  let profile = Profile::from(dto, user_id, Some(identity.user_id.clone()));
  data
    .profile_repository
    .create(profile.clone())
    .await
    .map_err(|error| match error {
      RepositoryError::Conflict(_) => {
        ApiError::field("user_id", "This user already has a profile.")
      }
      other => other.into(),
    })?;

  info!("Profile {} created for {}", profile.id, profile.user_id);
  Ok(HttpSuccess::respond(
    StatusCode::CREATED,
    "Profile created",
    profile,
  ))
}

#[utoipa::path(
  get,
  path = "/accounts/profiles/{id}/",
  params(("id" = String, Path, description = "Profile id")),
  responses(
    (status = 200, description = "The profile", body = Profile),
    (status = 404, description = "No such profile", body = HttpError)
  ),
  security(("bearer" = []))
)]
pub async fn get_profile(
  data: web::Data<AppState>,
  identity: Identity,
  path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
  let profile = owned_profile(&data, &identity, &path).await?;
  Ok(HttpSuccess::respond(
    StatusCode::OK,
    "Profile retrieved",
    profile,
  ))
}

#[utoipa::path(
  put,
  path = "/accounts/profiles/{id}/",
  params(("id" = String, Path, description = "Profile id")),
  request_body = UpdateProfileDto,
  responses(
    (status = 200, description = "Profile updated", body = Profile),
    (status = 400, description = "Validation failed", body = HttpError),
    (status = 404, description = "No such profile", body = HttpError)
  ),
  security(("bearer" = []))
)]
pub async fn update_profile(
  data: web::Data<AppState>,
  identity: Identity,
  path: web::Path<String>,
  dto: web::Json<UpdateProfileDto>,
) -> Result<HttpResponse, ApiError> {
  dto.validate()?;
  let mut profile = owned_profile(&data, &identity, &path).await?;

  let dto = dto.into_inner();
  if dto.date_of_birth.is_some() {
    profile.date_of_birth = dto.date_of_birth;
  }
  if dto.profile_picture.is_some() {
    profile.profile_picture = dto.profile_picture;
  }
  if let Some(contact_number) = dto.contact_number {
    profile.contact_number = contact_number;
  }
  if let Some(address) = dto.address {
    profile.address = address;
  }
  profile.updated_at = Utc::now();
  data.profile_repository.update(profile.clone()).await?;

  Ok(HttpSuccess::respond(StatusCode::OK, "Profile updated", profile))
}

#[utoipa::path(
  delete,
  path = "/accounts/profiles/{id}/",
  params(("id" = String, Path, description = "Profile id")),
  responses(
    (status = 204, description = "Profile deleted"),
    (status = 404, description = "No such profile", body = HttpError)
  ),
  security(("bearer" = []))
)]
pub async fn delete_profile(
  data: web::Data<AppState>,
  identity: Identity,
  path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
  let profile = owned_profile(&data, &identity, &path).await?;
  data.profile_repository.delete(&profile.id).await?;
  info!("Profile {} deleted by {}", profile.id, identity.user_id);
  Ok(HttpResponse::NoContent().finish())
}

/// Profiles of other users are reported as missing rather than forbidden,
/// so their ids stay hidden.
async fn owned_profile(
  data: &AppState,
  identity: &Identity,
  id: &str,
) -> Result<Profile, ApiError> {
  let profile = data.profile_repository.find_one(id).await?;
  if !IsOwnerOrAdmin(&profile.user_id).has_permission(identity) {
    return Err(ApiError::not_found());
  }
  Ok(profile)
}
