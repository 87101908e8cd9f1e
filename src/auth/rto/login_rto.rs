use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::users::rto::user_rto::UserRto;

#[derive(ToSchema, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPairRto {
  pub access: String,
  pub refresh: String,
}

/// Returned by login and registration.
#[derive(ToSchema, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRto {
  pub access: String,
  pub refresh: String,
  pub user: UserRto,
}

#[derive(ToSchema, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetailRto {
  pub detail: String,
}
