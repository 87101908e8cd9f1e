use chrono::{DateTime, Utc};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id: String,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub password_hash: String,
  pub is_active: bool,
  pub is_staff: bool,
  pub role_id: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub created_by: Option<String>,
}

impl User {
  pub fn new(
    email: String,
    first_name: String,
    last_name: String,
    password_hash: String,
  ) -> Self {
    let now = Utc::now();
    Self {
      id: nanoid!(),
      email,
      first_name,
      last_name,
      password_hash,
      is_active: true,
      is_staff: false,
      role_id: None,
      created_at: now,
      updated_at: now,
      created_by: None,
    }
  }
}

/// Trims the address and lower-cases its domain part. The local part is
/// left untouched since some mail servers treat it case-sensitively.
pub fn normalize_email(email: &str) -> String {
  let email = email.trim();
  match email.rsplit_once('@') {
    Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
    None => email.to_string(),
  }
}
