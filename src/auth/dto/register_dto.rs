use serde::Deserialize;
use utoipa::ToSchema;
use validator_derive::Validate;

use crate::profiles::dto::profile_dto::ProfileDto;

#[derive(ToSchema, Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterDto {
  #[validate(
    length(min = 1, message = "This field is required."),
    email(message = "Enter a valid email address.")
  )]
  #[serde(default)]
  pub email: String,
  #[validate(length(
    max = 30,
    message = "Ensure this field has no more than 30 characters."
  ))]
  #[serde(default)]
  pub first_name: String,
  #[validate(length(
    max = 30,
    message = "Ensure this field has no more than 30 characters."
  ))]
  #[serde(default)]
  pub last_name: String,
  #[validate(length(
    min = 8,
    message = "Ensure this field has at least 8 characters."
  ))]
  #[serde(default)]
  pub password: String,
  /// Created together with the user when present.
  pub profile: Option<ProfileDto>,
}
