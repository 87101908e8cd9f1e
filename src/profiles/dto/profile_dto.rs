use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use validator_derive::Validate;

#[derive(ToSchema, Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileDto {
  /// Only admins may create a profile on behalf of another user.
  pub user_id: Option<String>,
  pub date_of_birth: Option<NaiveDate>,
  #[validate(length(
    max = 255,
    message = "Ensure this field has no more than 255 characters."
  ))]
  pub profile_picture: Option<String>,
  #[validate(length(
    max = 15,
    message = "Ensure this field has no more than 15 characters."
  ))]
  #[serde(default)]
  pub contact_number: String,
  #[validate(length(
    max = 255,
    message = "Ensure this field has no more than 255 characters."
  ))]
  #[serde(default)]
  pub address: String,
}

#[derive(ToSchema, Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileDto {
  pub date_of_birth: Option<NaiveDate>,
  #[validate(length(
    max = 255,
    message = "Ensure this field has no more than 255 characters."
  ))]
  pub profile_picture: Option<String>,
  #[validate(length(
    max = 15,
    message = "Ensure this field has no more than 15 characters."
  ))]
  pub contact_number: Option<String>,
  #[validate(length(
    max = 255,
    message = "Ensure this field has no more than 255 characters."
  ))]
  pub address: Option<String>,
}
