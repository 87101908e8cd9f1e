use serde::Deserialize;
use utoipa::ToSchema;
use validator_derive::Validate;

use crate::users::model::user::User;

/// Partial update of a user. Only admins may change `is_active`, `is_staff`
/// and `role`; repeating their current values is allowed.
#[derive(ToSchema, Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserDto {
  #[validate(email(message = "Enter a valid email address."))]
  pub email: Option<String>,
  #[validate(length(
    max = 30,
    message = "Ensure this field has no more than 30 characters."
  ))]
  pub first_name: Option<String>,
  #[validate(length(
    max = 30,
    message = "Ensure this field has no more than 30 characters."
  ))]
  pub last_name: Option<String>,
  pub is_active: Option<bool>,
  pub is_staff: Option<bool>,
  /// `Some(None)` clears the role.
  #[serde(default, with = "double_option")]
  #[schema(value_type = Option<String>)]
  pub role: Option<Option<String>>,
}

impl UpdateUserDto {
  pub fn changes_privileged_fields(&self, user: &User) -> bool {
    self.is_active.is_some_and(|is_active| is_active != user.is_active)
      || self.is_staff.is_some_and(|is_staff| is_staff != user.is_staff)
      || self.role.as_ref().is_some_and(|role| *role != user.role_id)
  }
}

// Distinguishes an absent field from an explicit null.
mod double_option {
  use serde::{Deserialize, Deserializer};

  pub fn deserialize<'de, D>(
    deserializer: D,
  ) -> Result<Option<Option<String>>, D::Error>
  where
    D: Deserializer<'de>,
  {
    Option::<String>::deserialize(deserializer).map(Some)
  }
}
