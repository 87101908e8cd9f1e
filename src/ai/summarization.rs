use log::info;

use super::error::InferenceError;
use super::model::{SummaryParams, TextModel};

pub const MIN_WORDS: usize = 20;
pub const DEFAULT_RATIO: f64 = 0.3;

/// Checks the input and asks the model for a summary whose length scales
/// with `ratio`. Nothing is sent to the model when the checks fail.
pub async fn summarize_text(
  model: &dyn TextModel,
  text: Option<&str>,
  ratio: Option<f64>,
) -> Result<String, InferenceError> {
  let text = text
    .map(str::trim)
    .filter(|text| !text.is_empty())
    .ok_or(InferenceError::EmptyInput)?;

  let words = text.split_whitespace().count();
  if words < MIN_WORDS {
    return Err(InferenceError::TooShort(MIN_WORDS));
  }

  let ratio = ratio.unwrap_or(DEFAULT_RATIO);
  if !(ratio > 0.0 && ratio <= 1.0) {
    return Err(InferenceError::InvalidRatio);
  }

  let params = SummaryParams::from_ratio(words, ratio);
  let summary = model
    .summarize(text, params)
    .await
    .map_err(|error| InferenceError::Summarization(error.to_string()))?;

  if summary.trim().is_empty() {
    return Err(InferenceError::EmptySummary);
  }
  info!("Summarized {} words into {} characters", words, summary.len());
  Ok(summary)
}
