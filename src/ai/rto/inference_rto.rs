use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionAnswer {
  pub question: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub answer: Option<String>,
}

#[derive(ToSchema, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryRto {
  pub summary: String,
}

#[derive(ToSchema, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionsRto {
  pub questions: Vec<QuestionAnswer>,
}

#[derive(ToSchema, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InferenceErrorRto {
  pub error: String,
}
