pub mod dto;
pub mod error;
pub mod model;
pub mod question_generation;
pub mod rto;
pub mod summarization;

use actix_web::{web, HttpResponse};
use dto::text_dto::{GenerateQuestionsDto, SummarizeDto};
use error::InferenceError;
use rto::inference_rto::{InferenceErrorRto, QuestionsRto, SummaryRto};

use crate::AppState;

/// Malformed AI request bodies answer in the same `{"error": ...}` shape as
/// the gateway itself.
pub fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|error, _| {
    InferenceError::InvalidBody(error.to_string()).into()
  })
}

#[utoipa::path(
  post,
  path = "/ai/summarize/",
  request_body = SummarizeDto,
  responses(
    (status = 200, description = "Summary of the text", body = SummaryRto),
    (status = 400, description = "Rejected input or model failure", body = InferenceErrorRto)
  )
)]
pub async fn summarize(
  data: web::Data<AppState>,
  dto: web::Json<SummarizeDto>,
) -> Result<HttpResponse, InferenceError> {
  let summary = summarization::summarize_text(
    data.text_model.as_ref(),
    dto.text.as_deref(),
    dto.ratio,
  )
  .await?;
  Ok(HttpResponse::Ok().json(SummaryRto { summary }))
}

#[utoipa::path(
  post,
  path = "/ai/generate-questions/",
  request_body = GenerateQuestionsDto,
  responses(
    (status = 200, description = "Questions about the text", body = QuestionsRto),
    (status = 400, description = "Rejected input or model failure", body = InferenceErrorRto)
  )
)]
pub async fn generate_questions(
  data: web::Data<AppState>,
  dto: web::Json<GenerateQuestionsDto>,
) -> Result<HttpResponse, InferenceError> {
  let questions = question_generation::generate_questions(
    data.text_model.as_ref(),
    dto.text.as_deref(),
  )
  .await?;
  Ok(HttpResponse::Ok().json(QuestionsRto { questions }))
}
