use serde::Deserialize;
use utoipa::ToSchema;
use validator_derive::Validate;

#[derive(ToSchema, Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleDto {
  #[validate(length(
    min = 1,
    max = 30,
    message = "Role name must have between 1 and 30 characters."
  ))]
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub description: String,
}

#[derive(ToSchema, Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRoleDto {
  #[validate(length(
    min = 1,
    max = 30,
    message = "Role name must have between 1 and 30 characters."
  ))]
  pub name: Option<String>,
  pub description: Option<String>,
}
