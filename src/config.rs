//! Explicitly passed configuration objects.
//!
//! Nothing in this crate reads ambient global state at the point of use;
//! callers construct these values once (typically via `from_env` at startup)
//! and pass them down.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Generation Provider
/// ---------------------------------------------------------------------------

/// Text-generation backends the platform can be pointed at. The network
/// client itself lives outside this crate; the selection travels with the
/// request instead of ambient storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
  Local,
  OpenRouter,
  Cerebras,
}

impl Provider {
  pub fn default_model(&self) -> &'static str {
    match self {
      Provider::Local => "qwen2.5:latest",
      Provider::OpenRouter => "qwen/qwen-32b:free",
      Provider::Cerebras => "llama3.1-8b",
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Provider::Local => "local",
      Provider::OpenRouter => "openrouter",
      Provider::Cerebras => "cerebras",
    }
  }
}

impl FromStr for Provider {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "local" => Ok(Provider::Local),
      "openrouter" => Ok(Provider::OpenRouter),
      "cerebras" => Ok(Provider::Cerebras),
      other => Err(format!("unknown provider: {other}")),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
  pub provider: Provider,
  pub model: String,
}

impl Default for ProviderConfig {
  fn default() -> Self {
    Self::new(Provider::Cerebras)
  }
}

impl ProviderConfig {
  pub fn new(provider: Provider) -> Self {
    Self {
      provider,
      model: provider.default_model().to_string(),
    }
  }

  /// Load from `PLAN_LLM_PROVIDER` / `PLAN_LLM_MODEL`, falling back to the
  /// defaults for anything unset or unparsable.
  pub fn from_env() -> Self {
    dotenvy::dotenv().ok();

    let provider = std::env::var("PLAN_LLM_PROVIDER")
      .ok()
      .and_then(|v| v.parse().ok())
      .unwrap_or(Provider::Cerebras);

    let model = std::env::var("PLAN_LLM_MODEL")
      .ok()
      .filter(|m| !m.trim().is_empty())
      .unwrap_or_else(|| provider.default_model().to_string());

    Self { provider, model }
  }
}

/// ---------------------------------------------------------------------------
/// Store Configuration
/// ---------------------------------------------------------------------------

/// Timeouts and batching for the schedule store. Reads that exceed their
/// deadline fall back to an empty result; writes that exceed theirs fail
/// hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
  pub read_timeout: Duration,
  pub write_timeout: Duration,
  pub batch_size: usize,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      read_timeout: Duration::from_secs(5),
      write_timeout: Duration::from_secs(10),
      batch_size: 4,
    }
  }
}

impl StoreConfig {
  /// Load from `PLAN_READ_TIMEOUT_SECS`, `PLAN_WRITE_TIMEOUT_SECS` and
  /// `PLAN_BATCH_SIZE`, falling back to the defaults.
  pub fn from_env() -> Self {
    dotenvy::dotenv().ok();
    let defaults = Self::default();

    Self {
      read_timeout: env_secs("PLAN_READ_TIMEOUT_SECS").unwrap_or(defaults.read_timeout),
      write_timeout: env_secs("PLAN_WRITE_TIMEOUT_SECS").unwrap_or(defaults.write_timeout),
      batch_size: std::env::var("PLAN_BATCH_SIZE")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|&n| n > 0)
        .unwrap_or(defaults.batch_size),
    }
  }
}

fn env_secs(name: &str) -> Option<Duration> {
  std::env::var(name)
    .ok()
    .and_then(|v| v.parse::<u64>().ok())
    .map(Duration::from_secs)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
