use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::rto::inference_rto::QuestionAnswer;
use crate::shared::config::Config;

#[derive(Debug, Error)]
pub enum ModelError {
  #[error("{0}")]
  Http(#[from] reqwest::Error),
  #[error("model answered {0}: {1}")]
  Status(u16, String),
  #[error("unexpected model response: {0}")]
  UnexpectedResponse(String),
  #[error("the model returned no output")]
  EmptyOutput,
}

/// Bounds on the generated summary, in model tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryParams {
  pub max_length: u32,
  pub min_length: u32,
}

impl SummaryParams {
  pub const MAX_LENGTH_FLOOR: u32 = 30;
  pub const MAX_LENGTH_CEILING: u32 = 150;
  pub const MIN_LENGTH_CEILING: u32 = 50;

  pub fn from_ratio(words: usize, ratio: f64) -> Self {
    let target = (words as f64 * ratio).ceil() as u32;
    let max_length =
      target.clamp(Self::MAX_LENGTH_FLOOR, Self::MAX_LENGTH_CEILING);
    Self {
      max_length,
      min_length: (max_length / 2).min(Self::MIN_LENGTH_CEILING),
    }
  }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextModel: Send + Sync {
  /// An empty string means the model produced nothing.
  async fn summarize(
    &self,
    text: &str,
    params: SummaryParams,
  ) -> Result<String, ModelError>;
  async fn generate_questions(
    &self,
    text: &str,
  ) -> Result<Vec<QuestionAnswer>, ModelError>;
}

/// Talks to a Hugging Face style inference API,
/// `POST {base_url}/models/{model}` with `{"inputs": ...}`.
pub struct HuggingFaceModel {
  client: reqwest::Client,
  base_url: String,
  token: Option<String>,
  summarization_model: String,
  question_generation_model: String,
}

impl HuggingFaceModel {
  pub fn new(config: &Config) -> Self {
    Self {
      client: reqwest::Client::new(),
      base_url: config.inference_url.trim_end_matches('/').to_string(),
      token: config.inference_token.clone(),
      summarization_model: config.summarization_model.clone(),
      question_generation_model: config.question_generation_model.clone(),
    }
  }

  async fn infer(&self, model: &str, body: Value) -> Result<Value, ModelError> {
    let url = format!("{}/models/{}", self.base_url, model);
    debug!("Calling inference model {}", model);

    let mut request = self.client.post(&url).json(&body);
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(ModelError::Status(status.as_u16(), error_message(&body)));
    }
    Ok(response.json().await?)
  }
}

#[async_trait]
impl TextModel for HuggingFaceModel {
  async fn summarize(
    &self,
    text: &str,
    params: SummaryParams,
  ) -> Result<String, ModelError> {
    let body = json!({
      "inputs": text,
      "parameters": {
        "max_length": params.max_length,
        "min_length": params.min_length,
        "do_sample": false,
      },
    });
    parse_summary(self.infer(&self.summarization_model, body).await?)
  }

  async fn generate_questions(
    &self,
    text: &str,
  ) -> Result<Vec<QuestionAnswer>, ModelError> {
    let body = json!({ "inputs": text });
    parse_questions(self.infer(&self.question_generation_model, body).await?)
  }
}

// Inference APIs report failures as `{"error": "..."}`.
fn error_message(body: &str) -> String {
  #[derive(Deserialize)]
  struct ErrorBody {
    error: String,
  }

  serde_json::from_str::<ErrorBody>(body)
    .map(|parsed| parsed.error)
    .unwrap_or_else(|_| body.to_string())
}

/// Reads `[{"summary_text": "..."}]`. An empty list yields an empty summary.
pub fn parse_summary(value: Value) -> Result<String, ModelError> {
  #[derive(Deserialize)]
  struct Summary {
    summary_text: String,
  }

  let summaries: Vec<Summary> = serde_json::from_value(value)
    .map_err(|error| ModelError::UnexpectedResponse(error.to_string()))?;
  Ok(
    summaries
      .into_iter()
      .next()
      .map(|summary| summary.summary_text)
      .unwrap_or_default(),
  )
}

/// Accepts a list of `{question, answer}` objects, or highlight style
/// `[{"generated_text": "q1 <sep> q2"}]` output where answers are absent.
pub fn parse_questions(value: Value) -> Result<Vec<QuestionAnswer>, ModelError> {
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Output {
    Pairs(Vec<QuestionAnswer>),
    Generated(Vec<Generated>),
  }

  #[derive(Deserialize)]
  struct Generated {
    generated_text: String,
  }

  let output: Output = serde_json::from_value(value)
    .map_err(|error| ModelError::UnexpectedResponse(error.to_string()))?;
  Ok(match output {
    Output::Pairs(pairs) => pairs,
    Output::Generated(generated) => generated
      .iter()
      .flat_map(|item| item.generated_text.split("<sep>"))
      .map(str::trim)
      .filter(|question| !question.is_empty())
      .map(|question| QuestionAnswer {
        question: question.to_string(),
        answer: None,
      })
      .collect(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_summary_params_window() {
    assert_eq!(
      SummaryParams::from_ratio(20, 0.3),
      SummaryParams {
        max_length: 30,
        min_length: 15
      }
    );
    assert_eq!(
      SummaryParams::from_ratio(250, 0.5),
      SummaryParams {
        max_length: 125,
        min_length: 50
      }
    );
    assert_eq!(SummaryParams::from_ratio(5000, 1.0).max_length, 150);
  }

  #[test]
  fn test_parse_summary() {
    let value = json!([{ "summary_text": "Short version." }]);
    assert_eq!(parse_summary(value).unwrap(), "Short version.");
    assert_eq!(parse_summary(json!([])).unwrap(), "");
    assert!(matches!(
      parse_summary(json!({ "error": "loading" })),
      Err(ModelError::UnexpectedResponse(_))
    ));
  }

  #[test]
  fn test_parse_questions_from_pairs() {
    let value = json!([
      { "question": "Who wrote it?", "answer": "Ada" },
      { "question": "When?", "answer": "1843" },
    ]);
    let questions = parse_questions(value).unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].answer.as_deref(), Some("Ada"));
  }

  #[test]
  fn test_parse_questions_from_generated_text() {
    let value =
      json!([{ "generated_text": "Who wrote it? <sep> When was it written? <sep>" }]);
    let questions = parse_questions(value).unwrap();
    assert_eq!(
      questions,
      vec![
        QuestionAnswer {
          question: String::from("Who wrote it?"),
          answer: None,
        },
        QuestionAnswer {
          question: String::from("When was it written?"),
          answer: None,
        },
      ]
    );
  }

  #[test]
  fn test_error_message_prefers_error_field() {
    assert_eq!(error_message(r#"{"error":"Model is loading"}"#), "Model is loading");
    assert_eq!(error_message("Bad gateway"), "Bad gateway");
  }
}
