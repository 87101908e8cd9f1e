use serde::Deserialize;
use utoipa::ToSchema;

#[derive(ToSchema, Debug, Clone, Default, Deserialize)]
pub struct SummarizeDto {
  pub text: Option<String>,
  /// Share of the input length to aim for, in `(0, 1]`. Defaults to 0.3.
  pub ratio: Option<f64>,
}

#[derive(ToSchema, Debug, Clone, Default, Deserialize)]
pub struct GenerateQuestionsDto {
  pub text: Option<String>,
}
