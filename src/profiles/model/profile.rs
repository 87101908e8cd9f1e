use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Extra personal details, at most one per user.
#[derive(ToSchema, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
  pub id: String,
  pub user_id: String,
  pub date_of_birth: Option<NaiveDate>,
  /// Reference (path or URL) to an uploaded picture.
  pub profile_picture: Option<String>,
  pub contact_number: String,
  #[serde(default)]
  pub address: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub created_by: Option<String>,
}
