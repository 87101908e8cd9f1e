use serde::Deserialize;
use utoipa::ToSchema;
use validator_derive::Validate;

/// Missing fields deserialize as empty so they surface as field errors.
#[derive(ToSchema, Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginDto {
  #[validate(length(min = 1, message = "This field is required."))]
  #[serde(default)]
  pub email: String,
  #[validate(length(min = 1, message = "This field is required."))]
  #[serde(default)]
  pub password: String,
}
