//! Interface types for the external text-generation collaborator.
//!
//! The network client that produces these values lives outside this crate.
//! `response` is the inner plan text: backends that wrap their answer in a
//! further envelope are expected to unwrap it before handing the reply over.

use serde::{Deserialize, Serialize};

use crate::models::plan::ParsedPlan;
use crate::parse::{parse_plan, ParseError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
  #[serde(default)]
  pub prompt_tokens: Option<u32>,
  #[serde(default)]
  pub completion_tokens: Option<u32>,
  #[serde(default)]
  pub total_tokens: Option<u32>,
}

/// One reply from the text-generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorReply {
  pub response: String,

  #[serde(default)]
  pub model: Option<String>,

  #[serde(default)]
  pub usage: Option<TokenUsage>,
}

impl GeneratorReply {
  pub fn new(response: impl Into<String>) -> Self {
    Self {
      response: response.into(),
      model: None,
      usage: None,
    }
  }

  /// The text fed into the recovery pipeline.
  pub fn plan_text(&self) -> &str {
    &self.response
  }

  /// Run the full recovery pipeline over this reply.
  pub fn parse(&self) -> Result<ParsedPlan, ParseError> {
    parse_plan(self.plan_text())
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
