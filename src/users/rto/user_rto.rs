use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::users::model::user::User;

/// Public representation of a user. Never carries the password hash.
#[derive(ToSchema, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRto {
  pub id: String,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub is_active: bool,
  pub is_staff: bool,
  pub role: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl From<User> for UserRto {
  fn from(user: User) -> Self {
    Self {
      id: user.id,
      email: user.email,
      first_name: user.first_name,
      last_name: user.last_name,
      is_active: user.is_active,
      is_staff: user.is_staff,
      role: user.role_id,
      created_at: user.created_at,
      updated_at: user.updated_at,
    }
  }
}
