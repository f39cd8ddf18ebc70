//! Typed plan documents recovered from generator output.
//!
//! Two top-level shapes are recognized: a workout plan (`days`) and a
//! nutrition plan (`nutrition_plan`). Both are parsed once per response and
//! immutable afterwards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::schedule::PlanType;

/// A scalar the generator emits either as a number or as text.
///
/// Repair rewrites glued unit tokens (`30min`) into `"30 min"` strings, so
/// fields like `duration` and `weights` must accept both forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
  Number(serde_json::Number),
  Text(String),
}

impl ScalarValue {
  pub fn as_number(&self) -> Option<f64> {
    match self {
      ScalarValue::Number(n) => n.as_f64(),
      ScalarValue::Text(_) => None,
    }
  }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      ScalarValue::Number(_) => None,
      ScalarValue::Text(t) => Some(t),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Workout plan
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
  pub days: Vec<PlanDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDay {
  /// Explicit calendar date; freshly generated plans usually omit it and are
  /// matched to the requested range by ordinal position instead.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date: Option<NaiveDate>,

  #[serde(default)]
  pub focus: Option<String>,

  #[serde(default)]
  pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
  #[serde(rename = "exercise_name", alias = "name")]
  pub name: String,

  #[serde(default)]
  pub category: Option<String>,

  #[serde(default)]
  pub body_part: Option<String>,

  #[serde(default)]
  pub sets: Option<ScalarValue>,

  #[serde(default)]
  pub reps: Option<ScalarValue>,

  #[serde(default)]
  pub duration: Option<ScalarValue>,

  #[serde(rename = "weights", alias = "weight", default)]
  pub weight: Option<ScalarValue>,

  #[serde(default)]
  pub equipment: Option<String>,

  #[serde(default)]
  pub coach_tip: Option<String>,

  #[serde(default)]
  pub rest: Option<ScalarValue>,
}

/// One entry of the flat exercise view, tagged with the day it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatExercise {
  pub day_index: usize,
  #[serde(flatten)]
  pub exercise: Exercise,
}

impl WorkoutPlan {
  /// Flatten `days[].exercises[]` into a parallel list tagged with the day
  /// index, for callers that want a flat view alongside the nested one.
  pub fn flattened(&self) -> Vec<FlatExercise> {
    self
      .days
      .iter()
      .enumerate()
      .flat_map(|(day_index, day)| {
        day.exercises.iter().map(move |exercise| FlatExercise {
          day_index,
          exercise: exercise.clone(),
        })
      })
      .collect()
  }
}

/// ---------------------------------------------------------------------------
/// Nutrition plan
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionPlan {
  #[serde(rename = "nutrition_plan")]
  pub days: Vec<NutritionDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionDay {
  /// Day label as emitted by the generator ("Day 1", 1, "Monday").
  #[serde(default)]
  pub day: Option<ScalarValue>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date: Option<NaiveDate>,

  #[serde(default)]
  pub total: Option<MacroTotals>,

  #[serde(default)]
  pub breakfast: Option<Meal>,

  #[serde(default)]
  pub lunch: Option<Meal>,

  #[serde(default)]
  pub dinner: Option<Meal>,

  #[serde(default)]
  pub snacks: Option<Meal>,
}

impl NutritionDay {
  /// Meal slots that are actually present, in day order.
  pub fn meals(&self) -> impl Iterator<Item = &Meal> {
    [
      self.breakfast.as_ref(),
      self.lunch.as_ref(),
      self.dinner.as_ref(),
      self.snacks.as_ref(),
    ]
    .into_iter()
    .flatten()
  }

  pub fn has_meals(&self) -> bool {
    self.meals().next().is_some()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
  #[serde(default)]
  pub calories: Option<ScalarValue>,
  #[serde(default)]
  pub protein: Option<ScalarValue>,
  #[serde(default)]
  pub carbs: Option<ScalarValue>,
  #[serde(default)]
  pub fats: Option<ScalarValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub amount: Option<ScalarValue>,
  #[serde(default)]
  pub calories: Option<ScalarValue>,
  #[serde(default)]
  pub protein: Option<ScalarValue>,
  #[serde(default)]
  pub carbs: Option<ScalarValue>,
  #[serde(default)]
  pub fats: Option<ScalarValue>,
  #[serde(default)]
  pub coach_tip: Option<String>,
}

/// ---------------------------------------------------------------------------
/// Parsed plan
/// ---------------------------------------------------------------------------

/// A successfully recovered plan document, either shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParsedPlan {
  Workout(WorkoutPlan),
  Nutrition(NutritionPlan),
}

impl ParsedPlan {
  pub fn as_workout(&self) -> Option<&WorkoutPlan> {
    match self {
      ParsedPlan::Workout(plan) => Some(plan),
      ParsedPlan::Nutrition(_) => None,
    }
  }

  pub fn as_nutrition(&self) -> Option<&NutritionPlan> {
    match self {
      ParsedPlan::Workout(_) => None,
      ParsedPlan::Nutrition(plan) => Some(plan),
    }
  }

  pub fn plan_type(&self) -> PlanType {
    match self {
      ParsedPlan::Workout(_) => PlanType::Workout,
      ParsedPlan::Nutrition(_) => PlanType::Meal,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Persisted day payload
/// ---------------------------------------------------------------------------

/// The `details_json` payload of one schedule row: the day's exercises for a
/// workout row, the day's meals for a meal row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DayDetails {
  Workout { exercises: Vec<Exercise> },
  Nutrition { meals: Vec<Meal> },
}

impl DayDetails {
  pub fn empty(plan_type: PlanType) -> Self {
    match plan_type {
      PlanType::Workout => DayDetails::Workout {
        exercises: Vec::new(),
      },
      PlanType::Meal => DayDetails::Nutrition { meals: Vec::new() },
    }
  }

  pub fn is_empty(&self) -> bool {
    match self {
      DayDetails::Workout { exercises } => exercises.is_empty(),
      DayDetails::Nutrition { meals } => meals.is_empty(),
    }
  }

  pub fn len(&self) -> usize {
    match self {
      DayDetails::Workout { exercises } => exercises.len(),
      DayDetails::Nutrition { meals } => meals.len(),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
