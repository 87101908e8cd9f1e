pub mod dto;
pub mod model;
pub mod repository;

use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use dto::role_dto::{CreateRoleDto, UpdateRoleDto};
use log::info;
use model::role::Role;
use nanoid::nanoid;
use validator::Validate;

use crate::shared::http_error::{ApiError, HttpError, HttpSuccess};
use crate::shared::permissions::{Identity, IsAdmin, Permission};
use crate::AppState;

#[utoipa::path(
  get,
  path = "/accounts/roles/",
  responses((status = 200, description = "All roles", body = Vec<Role>)),
  security(("bearer" = []))
)]
pub async fn list_roles(
  data: web::Data<AppState>,
  _identity: Identity,
) -> Result<HttpResponse, ApiError> {
  let roles = data.role_repository.find_all().await?;
  Ok(HttpSuccess::respond(StatusCode::OK, "Roles retrieved", roles))
}

#[utoipa::path(
  get,
  path = "/accounts/roles/{id}/",
  params(("id" = String, Path, description = "Role id")),
  responses(
    (status = 200, description = "The role", body = Role),
    (status = 404, description = "No such role", body = HttpError)
  ),
  security(("bearer" = []))
)]
pub async fn get_role(
  data: web::Data<AppState>,
  _identity: Identity,
  path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
  let role = data.role_repository.find_one(&path).await?;
  Ok(HttpSuccess::respond(StatusCode::OK, "Role retrieved", role))
}

#[utoipa::path(
  post,
  path = "/accounts/roles/",
  request_body = CreateRoleDto,
  responses(
    (status = 201, description = "Role created", body = Role),
    (status = 400, description = "Validation failed", body = HttpError),
    (status = 403, description = "Not an admin", body = HttpError)
  ),
  security(("bearer" = []))
)]
pub async fn create_role(
  data: web::Data<AppState>,
  identity: Identity,
  dto: web::Json<CreateRoleDto>,
) -> Result<HttpResponse, ApiError> {
  IsAdmin.check(&identity)?;
  dto.validate()?;

  let role = Role::from(dto.into_inner(), &identity);
  data.role_repository.create(role.clone()).await?;

  info!("Role {} created by {}", role.name, identity.user_id);
  let mut response =
    HttpSuccess::respond(StatusCode::CREATED, "Role created", &role);
  if let Ok(location) =
    header::HeaderValue::from_str(&format!("/accounts/roles/{}/", role.id))
  {
    response.headers_mut().insert(header::LOCATION, location);
  }
  Ok(response)
}

#[utoipa::path(
  put,
  path = "/accounts/roles/{id}/",
  params(("id" = String, Path, description = "Role id")),
  request_body = UpdateRoleDto,
  responses(
    (status = 200, description = "Role updated", body = Role),
    (status = 400, description = "Validation failed", body = HttpError),
    (status = 403, description = "Not an admin", body = HttpError),
    (status = 404, description = "No such role", body = HttpError)
  ),
  security(("bearer" = []))
)]
pub async fn update_role(
  data: web::Data<AppState>,
  identity: Identity,
  path: web::Path<String>,
  dto: web::Json<UpdateRoleDto>,
) -> Result<HttpResponse, ApiError> {
  IsAdmin.check(&identity)?;
  dto.validate()?;

  let mut role = data.role_repository.find_one(&path).await?;
  let dto = dto.into_inner();
  if let Some(name) = dto.name {
    role.name = name;
  }
  if let Some(description) = dto.description {
    role.description = description;
  }
  role.updated_at = Utc::now();
  data.role_repository.update(role.clone()).await?;

  Ok(HttpSuccess::respond(StatusCode::OK, "Role updated", role))
}

#[utoipa::path(
  delete,
  path = "/accounts/roles/{id}/",
  params(("id" = String, Path, description = "Role id")),
  responses(
    (status = 204, description = "Role deleted and detached from its users"),
    (status = 403, description = "Not an admin", body = HttpError),
    (status = 404, description = "No such role", body = HttpError)
  ),
  security(("bearer" = []))
)]
pub async fn delete_role(
  data: web::Data<AppState>,
  identity: Identity,
  path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
  IsAdmin.check(&identity)?;
  data.role_repository.delete(&path).await?;
  data.user_repository.clear_role(&path).await?;
  info!("Role {} deleted by {}", path.as_str(), identity.user_id);
  Ok(HttpResponse::NoContent().finish())
}

impl Role {
  fn from(dto: CreateRoleDto, identity: &Identity) -> Self {
    let now = Utc::now();
    Self {
      id: nanoid!(),
      name: dto.name,
      description: dto.description,
      created_at: now,
      updated_at: now,
      created_by: Some(identity.user_id.clone()),
    }
  }
}
