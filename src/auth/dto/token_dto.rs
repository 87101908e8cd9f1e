use serde::Deserialize;
use utoipa::ToSchema;

/// Body of the refresh and logout endpoints.
#[derive(ToSchema, Debug, Clone, Default, Deserialize)]
pub struct RefreshTokenDto {
  pub refresh: Option<String>,
}
