//! Plan recovery pipeline.
//!
//! Composes the text stages in order: normalize, integrity check, strict
//! parse, one repair pass, one retry parse, schema validation. Parse errors
//! are never swallowed; `RepairExhausted` carries the original and the
//! post-repair text so the caller can log them and request a regeneration.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::plan::{NutritionPlan, ParsedPlan, WorkoutPlan};
use crate::normalize;
use crate::repair;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Serialize)]
pub enum ParseError {
  #[error("no JSON object found in generator output")]
  Normalization,

  #[error("generator output contains an odd number of quotes; judged truncated mid-string")]
  UnclosedQuotes,

  #[error("generator output has unbalanced braces or brackets; judged cut off mid-response")]
  Truncated,

  #[error("output still unparsable after repair: {reason}")]
  RepairExhausted {
    reason: String,
    original: String,
    repaired: String,
  },

  #[error("parsed JSON does not match a known plan shape: {0}")]
  Validation(String),
}

/// ---------------------------------------------------------------------------
/// Pipeline
/// ---------------------------------------------------------------------------

/// Recover a typed plan from raw generator output.
pub fn parse_plan(raw: &str) -> Result<ParsedPlan, ParseError> {
  let cleaned = normalize::normalize_response(raw);
  if !cleaned.starts_with('{') {
    return Err(ParseError::Normalization);
  }

  normalize::check_integrity(&cleaned)?;

  let value = match serde_json::from_str::<Value>(&cleaned) {
    Ok(value) => value,
    Err(first_error) => {
      tracing::warn!(error = %first_error, "initial parse failed, engaging repair");
      let repaired = repair::repair(&cleaned);
      match serde_json::from_str::<Value>(&repaired) {
        Ok(value) => value,
        Err(retry_error) => {
          return Err(ParseError::RepairExhausted {
            reason: retry_error.to_string(),
            original: cleaned,
            repaired,
          });
        }
      }
    }
  };

  deserialize_plan(value)
}

/// Strict deserialization and structural validation of a parsed JSON value.
pub fn deserialize_plan(value: Value) -> Result<ParsedPlan, ParseError> {
  let (has_days, has_nutrition) = match value.as_object() {
    Some(top) => (
      top.contains_key("days"),
      top.contains_key("nutrition_plan"),
    ),
    None => {
      return Err(ParseError::Validation(
        "top level is not an object".to_string(),
      ))
    }
  };

  if has_days {
    let plan: WorkoutPlan = serde_json::from_value(value)
      .map_err(|e| ParseError::Validation(format!("workout plan: {e}")))?;
    validate_workout(&plan)?;
    Ok(ParsedPlan::Workout(plan))
  } else if has_nutrition {
    let plan: NutritionPlan = serde_json::from_value(value)
      .map_err(|e| ParseError::Validation(format!("nutrition plan: {e}")))?;
    validate_nutrition(&plan)?;
    Ok(ParsedPlan::Nutrition(plan))
  } else {
    Err(ParseError::Validation(
      "expected a top-level `days` or `nutrition_plan` key".to_string(),
    ))
  }
}

fn validate_workout(plan: &WorkoutPlan) -> Result<(), ParseError> {
  if plan.days.is_empty() {
    return Err(ParseError::Validation("workout plan has no days".to_string()));
  }
  for (index, day) in plan.days.iter().enumerate() {
    if day.exercises.is_empty() {
      return Err(ParseError::Validation(format!(
        "day {} has no exercises",
        index + 1
      )));
    }
  }
  Ok(())
}

fn validate_nutrition(plan: &NutritionPlan) -> Result<(), ParseError> {
  if plan.days.is_empty() {
    return Err(ParseError::Validation(
      "nutrition plan has no days".to_string(),
    ));
  }
  for (index, day) in plan.days.iter().enumerate() {
    if !day.has_meals() {
      return Err(ParseError::Validation(format!(
        "day {} has no meals",
        index + 1
      )));
    }
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  const WORKOUT_RESPONSE: &str = r#"{
    "days": [
      {
        "focus": "Upper Body Endurance",
        "exercises": [
          {
            "exercise_name": "Incline Push-Up",
            "category": "Strength",
            "body_part": "Chest, Shoulders, Triceps",
            "sets": 2,
            "reps": 12,
            "duration": 6,
            "weights": "bodyweight",
            "equipment": "yoga_mat",
            "coach_tip": "keep core engaged",
            "rest": 90
          }
        ]
      },
      {
        "focus": "Mobility",
        "exercises": [
          {"exercise_name": "Cat-Cow Stretch", "category": "Flexibility", "sets": 1, "reps": 1}
        ]
      }
    ]
  }"#;

  #[test]
  fn test_parses_clean_workout_response() {
    let plan = parse_plan(WORKOUT_RESPONSE).unwrap();
    let workout = plan.as_workout().unwrap();
    assert_eq!(workout.days.len(), 2);
    assert_eq!(workout.days[0].focus.as_deref(), Some("Upper Body Endurance"));

    let flat = workout.flattened();
    assert_eq!(flat.len(), 2);
    assert_eq!(flat[0].day_index, 0);
    assert_eq!(flat[1].day_index, 1);
  }

  #[test]
  fn test_parses_prose_wrapped_fenced_response() {
    let wrapped = format!("Here is the plan you asked for:\n```json\n{WORKOUT_RESPONSE}\n```\nLet me know!");
    let plan = parse_plan(&wrapped).unwrap();
    assert!(plan.as_workout().is_some());
  }

  #[test]
  fn test_repairs_unquoted_values_then_parses() {
    let malformed = r#"{
      "days": [
        {
          "focus": Upper Body Endurance,
          "exercises": [
            {"exercise_name": Incline Push-Up, "sets": 2, "reps": 12}
          ]
        }
      ]
    }"#;

    let plan = parse_plan(malformed).unwrap();
    let workout = plan.as_workout().unwrap();
    assert_eq!(workout.days[0].focus.as_deref(), Some("Upper Body Endurance"));
    assert_eq!(workout.days[0].exercises[0].name, "Incline Push-Up");
  }

  #[test]
  fn test_truncated_response_fails_before_repair() {
    // One fewer closing brace than opening.
    let truncated = r#"{"days": [{"focus": "Push", "exercises": [{"exercise_name": "Row"}]}]"#;
    assert!(matches!(parse_plan(truncated), Err(ParseError::Truncated)));
  }

  #[test]
  fn test_unclosed_quotes_fail_before_repair() {
    let input = r#"{"days": [{"focus": "Push}]}"#;
    assert!(matches!(parse_plan(input), Err(ParseError::UnclosedQuotes)));
  }

  #[test]
  fn test_no_object_is_a_normalization_error() {
    assert!(matches!(
      parse_plan("Sorry, I cannot help with that."),
      Err(ParseError::Normalization)
    ));
  }

  #[test]
  fn test_repair_exhausted_carries_both_texts() {
    // Balanced braces and quotes, but an invalid escape no textual repair
    // can recover.
    let garbage = r#"{"coach_tip": "\q"}"#;
    match parse_plan(garbage) {
      Err(ParseError::RepairExhausted {
        original, repaired, ..
      }) => {
        assert_eq!(original, garbage);
        assert!(!repaired.is_empty());
      }
      other => panic!("expected RepairExhausted, got {other:?}"),
    }
  }

  #[test]
  fn test_parses_nutrition_response() {
    let response = r#"{
      "nutrition_plan": [
        {
          "day": 1,
          "total": {"calories": 1800, "protein": 120, "carbs": 180, "fats": 60},
          "breakfast": {"name": "Oats with berries", "calories": 400, "protein": 20},
          "lunch": {"name": "Chicken salad", "calories": 550},
          "dinner": {"name": "Salmon and rice", "calories": 650},
          "snacks": {"name": "Greek yogurt", "calories": 200}
        }
      ]
    }"#;

    let plan = parse_plan(response).unwrap();
    let nutrition = plan.as_nutrition().unwrap();
    assert_eq!(nutrition.days.len(), 1);
    assert_eq!(nutrition.days[0].meals().count(), 4);
  }

  #[test]
  fn test_unknown_top_level_shape_is_rejected() {
    let response = r#"{"workouts": []}"#;
    assert!(matches!(
      parse_plan(response),
      Err(ParseError::Validation(_))
    ));
  }

  #[test]
  fn test_day_without_exercises_is_rejected() {
    let response = r#"{"days": [{"focus": "Rest", "exercises": []}]}"#;
    match parse_plan(response) {
      Err(ParseError::Validation(reason)) => assert!(reason.contains("no exercises")),
      other => panic!("expected validation error, got {other:?}"),
    }
  }

  #[test]
  fn test_day_without_meals_is_rejected() {
    let response = r#"{"nutrition_plan": [{"day": 1}]}"#;
    match parse_plan(response) {
      Err(ParseError::Validation(reason)) => assert!(reason.contains("no meals")),
      other => panic!("expected validation error, got {other:?}"),
    }
  }
}
