use log::info;

use super::error::InferenceError;
use super::model::{ModelError, TextModel};
use super::rto::inference_rto::QuestionAnswer;

pub async fn generate_questions(
  model: &dyn TextModel,
  text: Option<&str>,
) -> Result<Vec<QuestionAnswer>, InferenceError> {
  let text = text
    .map(str::trim)
    .filter(|text| !text.is_empty())
    .ok_or(InferenceError::EmptyInput)?;

  let questions = model
    .generate_questions(text)
    .await
    .and_then(|questions| {
      if questions.is_empty() {
        Err(ModelError::EmptyOutput)
      } else {
        Ok(questions)
      }
    })
    .map_err(|error| InferenceError::QuestionGeneration(error.to_string()))?;

  info!("Generated {} questions", questions.len());
  Ok(questions)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ai::model::MockTextModel;

  #[actix_web::test]
  async fn test_empty_text_never_reaches_model() {
    let mut model = MockTextModel::new();
    model.expect_generate_questions().never();

    let error = generate_questions(&model, Some("")).await.unwrap_err();
    assert_eq!(error.to_string(), "Input text cannot be empty.");
    let error = generate_questions(&model, None).await.unwrap_err();
    assert!(matches!(error, InferenceError::EmptyInput));
  }

  #[actix_web::test]
  async fn test_questions_are_returned() {
    let mut model = MockTextModel::new();
    model.expect_generate_questions().times(1).returning(|_| {
      Ok(vec![QuestionAnswer {
        question: String::from("Who wrote the notes?"),
        answer: Some(String::from("Ada Lovelace")),
      }])
    });

    let questions =
      generate_questions(&model, Some("Ada Lovelace wrote the notes."))
        .await
        .unwrap();
    assert_eq!(questions[0].question, "Who wrote the notes?");
  }

  #[actix_web::test]
  async fn test_empty_output_is_an_error() {
    let mut model = MockTextModel::new();
    model
      .expect_generate_questions()
      .times(1)
      .returning(|_| Ok(Vec::new()));

    let error = generate_questions(&model, Some("Some text."))
      .await
      .unwrap_err();
    assert_eq!(
      error.to_string(),
      "An error occurred during question generation: the model returned no output"
    );
  }
}
