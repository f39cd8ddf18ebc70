//! Recovery of parseable JSON from stylistically malformed generator output.
//!
//! Text reaching this module is balanced (it passed the integrity check) but
//! failed a strict parse. The recurring defects are trailing commas, glued
//! number-unit tokens (`30_min`, `50kg`), unquoted keys, and unquoted
//! free-text values that may themselves contain commas. Rather than layered
//! textual substitutions, the text is re-tokenized by a tolerant scanner
//! that classifies each scalar and re-emits canonical JSON, so the repairs
//! cannot interfere with each other or with already-correct regions.

use serde_json::Value;

/// Units that glue directly onto a number without a separator.
const GLUED_UNITS: [&str; 4] = ["min", "sec", "kg", "lb"];

/// Repair near-JSON text into parseable JSON.
///
/// Already-valid input is returned byte-for-byte unchanged, which also makes
/// the function idempotent: once an application yields text that parses, the
/// next application is the identity.
pub fn repair(text: &str) -> String {
  if serde_json::from_str::<Value>(text).is_ok() {
    return text.to_string();
  }
  Reemitter::new(text).run()
}

struct Reemitter {
  chars: Vec<char>,
  pos: usize,
  out: String,
}

impl Reemitter {
  fn new(text: &str) -> Self {
    Self {
      chars: text.chars().collect(),
      pos: 0,
      out: String::with_capacity(text.len() + 16),
    }
  }

  fn run(mut self) -> String {
    self.skip_ws();
    match self.peek() {
      Some('{') | Some('[') => {
        self.emit_value(false);
        self.out
      }
      // Nothing structured to repair.
      _ => self.chars.into_iter().collect(),
    }
  }

  fn peek(&self) -> Option<char> {
    self.chars.get(self.pos).copied()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek();
    if c.is_some() {
      self.pos += 1;
    }
    c
  }

  fn skip_ws(&mut self) {
    while matches!(self.peek(), Some(c) if c.is_whitespace()) {
      self.pos += 1;
    }
  }

  /// `as_member_value` is true when the value belongs to an object member;
  /// only there may an unquoted scalar swallow commas (see
  /// `next_is_member_or_close`). Array elements always split on commas.
  fn emit_value(&mut self, as_member_value: bool) {
    self.skip_ws();
    match self.peek() {
      Some('{') => self.emit_object(),
      Some('[') => self.emit_array(),
      Some('"') => {
        let raw = self.read_quoted();
        self.out.push_str(&raw);
      }
      Some(_) => {
        let chunk = self.read_loose_scalar(as_member_value);
        self.out.push_str(&classify_scalar(&chunk));
      }
      None => self.out.push_str("null"),
    }
  }

  fn emit_object(&mut self) {
    self.bump();
    self.out.push('{');
    let mut first = true;

    loop {
      self.skip_ws();
      match self.peek() {
        None => break,
        Some('}') => {
          self.bump();
          break;
        }
        // Stray or trailing comma: swallow it, the emitter writes its own
        // separators.
        Some(',') => {
          self.bump();
          continue;
        }
        // Mismatched closer (balanced counts do not imply correct nesting);
        // dropping it keeps the scan moving.
        Some(']') => {
          self.bump();
          continue;
        }
        Some(_) => {}
      }

      if !first {
        self.out.push_str(", ");
      }
      first = false;

      match self.peek() {
        Some('"') => {
          let key = self.read_quoted();
          self.out.push_str(&key);
        }
        _ => {
          let key = self.read_until_colon();
          self.out.push_str(&quote(key.trim()));
        }
      }

      self.skip_ws();
      if self.peek() == Some(':') {
        self.bump();
      }
      self.out.push_str(": ");
      self.emit_value(true);
    }

    self.out.push('}');
  }

  fn emit_array(&mut self) {
    self.bump();
    self.out.push('[');
    let mut first = true;

    loop {
      self.skip_ws();
      match self.peek() {
        None => break,
        Some(']') => {
          self.bump();
          break;
        }
        Some(',') => {
          self.bump();
          continue;
        }
        Some('}') => {
          self.bump();
          continue;
        }
        Some(_) => {}
      }

      if !first {
        self.out.push_str(", ");
      }
      first = false;
      self.emit_value(false);
    }

    self.out.push(']');
  }

  /// Copy a quoted string verbatim, escapes included.
  fn read_quoted(&mut self) -> String {
    let mut raw = String::new();
    if let Some(open) = self.bump() {
      raw.push(open);
    }
    while let Some(c) = self.bump() {
      raw.push(c);
      if c == '\\' {
        if let Some(escaped) = self.bump() {
          raw.push(escaped);
        }
      } else if c == '"' {
        break;
      }
    }
    raw
  }

  fn read_until_colon(&mut self) -> String {
    let mut key = String::new();
    while let Some(c) = self.peek() {
      if c == ':' || c == ',' || c == '}' || c == ']' {
        break;
      }
      key.push(c);
      self.pos += 1;
    }
    key
  }

  fn read_loose_scalar(&mut self, allow_embedded_commas: bool) -> String {
    let mut chunk = String::new();
    while let Some(c) = self.peek() {
      match c {
        '}' | ']' => break,
        ',' => {
          if allow_embedded_commas && !self.next_is_member_or_close(self.pos + 1) {
            chunk.push(c);
            self.pos += 1;
          } else {
            break;
          }
        }
        _ => {
          chunk.push(c);
          self.pos += 1;
        }
      }
    }
    chunk
  }

  /// After a comma inside an unquoted value: does the upcoming text look
  /// like the next object member (or the end of the container) rather than
  /// a continuation of the value? `"Chest, Shoulders, Triceps"` must stay
  /// one value while the comma before `"sets":` terminates it.
  fn next_is_member_or_close(&self, mut at: usize) -> bool {
    while at < self.chars.len() && self.chars[at].is_whitespace() {
      at += 1;
    }
    match self.chars.get(at) {
      None => true,
      Some('}') | Some(']') | Some('{') | Some('[') => true,
      Some('"') => {
        // Quoted token: a member when its closing quote is followed by ':'.
        let mut i = at + 1;
        while i < self.chars.len() {
          match self.chars[i] {
            '\\' => i += 2,
            '"' => {
              let mut j = i + 1;
              while j < self.chars.len() && self.chars[j].is_whitespace() {
                j += 1;
              }
              return self.chars.get(j) == Some(&':');
            }
            _ => i += 1,
          }
        }
        false
      }
      Some(_) => {
        // Bareword token: a member when a ':' appears before any separator.
        let mut i = at;
        while i < self.chars.len() {
          match self.chars[i] {
            ':' => return true,
            ',' | '}' | ']' | '"' => return false,
            _ => i += 1,
          }
        }
        false
      }
    }
  }
}

/// Re-emit one unquoted scalar in canonical form.
fn classify_scalar(chunk: &str) -> String {
  let trimmed = chunk.trim();
  if trimmed.is_empty() {
    return "null".to_string();
  }

  match serde_json::from_str::<Value>(trimmed) {
    // Numbers, booleans, null and complete string literals are already
    // canonical.
    Ok(Value::Number(_) | Value::Bool(_) | Value::Null | Value::String(_)) => {
      return trimmed.to_string();
    }
    _ => {}
  }

  if let Some((number, unit)) = split_unit_glue(trimmed) {
    return format!("\"{number} {unit}\"");
  }

  quote(trimmed)
}

/// `30_min` / `30min` / `50kg` style tokens: a number glued to a unit.
/// Underscore glue accepts any alphabetic unit; direct glue only the known
/// few, so identifiers like `4x10` or hex-ish text stay untouched.
fn split_unit_glue(token: &str) -> Option<(&str, &str)> {
  let digits_end = token.find(|c: char| !c.is_ascii_digit())?;
  if digits_end == 0 {
    return None;
  }
  let (number, rest) = token.split_at(digits_end);
  let unit = rest.strip_prefix('_').unwrap_or(rest);
  if unit.is_empty() || !unit.chars().all(|c| c.is_ascii_alphabetic()) {
    return None;
  }
  if rest.starts_with('_') || GLUED_UNITS.contains(&unit.to_ascii_lowercase().as_str()) {
    Some((number, unit))
  } else {
    None
  }
}

fn quote(raw: &str) -> String {
  let mut quoted = String::with_capacity(raw.len() + 2);
  quoted.push('"');
  for c in raw.chars() {
    match c {
      '"' => quoted.push_str("\\\""),
      '\\' => quoted.push_str("\\\\"),
      '\n' => quoted.push_str("\\n"),
      '\r' => quoted.push_str("\\r"),
      '\t' => quoted.push_str("\\t"),
      _ => quoted.push(c),
    }
  }
  quoted.push('"');
  quoted
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  fn parsed(text: &str) -> Value {
    let repaired = repair(text);
    serde_json::from_str(&repaired)
      .unwrap_or_else(|e| panic!("repaired text should parse: {e}\n{repaired}"))
  }

  #[test]
  fn test_valid_json_is_untouched() {
    // Includes a glued-looking token inside a string literal, which a
    // substitution chain would mangle.
    let input = r#"{"coach_tip": "rest 90sec between sets", "sets": 3}"#;
    assert_eq!(repair(input), input);
  }

  #[test]
  fn test_trailing_commas_removed() {
    let value = parsed(r#"{"a": 1, "b": [1, 2,],}"#);
    assert_eq!(value["a"], 1);
    assert_eq!(value["b"], serde_json::json!([1, 2]));
  }

  #[test]
  fn test_unit_glue_tokens_become_strings() {
    let value = parsed(
      r#"{"duration": 30_min, "rest": 60sec, "weights": 50kg, "load": 100lb, "time": 30min}"#,
    );
    assert_eq!(value["duration"], "30 min");
    assert_eq!(value["rest"], "60 sec");
    assert_eq!(value["weights"], "50 kg");
    assert_eq!(value["load"], "100 lb");
    assert_eq!(value["time"], "30 min");
  }

  #[test]
  fn test_unknown_direct_glue_is_quoted_as_is() {
    let value = parsed(r#"{"tempo": 4x10}"#);
    assert_eq!(value["tempo"], "4x10");
  }

  #[test]
  fn test_unquoted_values_are_recovered() {
    let value = parsed(r#"{"focus": Upper Body Endurance, "exercise_name": Incline Push-Up}"#);
    assert_eq!(value["focus"], "Upper Body Endurance");
    assert_eq!(value["exercise_name"], "Incline Push-Up");
  }

  #[test]
  fn test_value_with_internal_commas_stays_one_string() {
    let value = parsed(
      r#"{"body_part": Chest, Shoulders, Triceps, "coach_tip": 3-1-3 tempo, RPE 5-6, keep core engaged, "rest": 90}"#,
    );
    assert_eq!(value["body_part"], "Chest, Shoulders, Triceps");
    assert_eq!(value["coach_tip"], "3-1-3 tempo, RPE 5-6, keep core engaged");
    assert_eq!(value["rest"], 90);
  }

  #[test]
  fn test_unquoted_keys_are_quoted() {
    let value = parsed(r#"{focus: "Push", sets: 3, done: true, note: null}"#);
    assert_eq!(value["focus"], "Push");
    assert_eq!(value["sets"], 3);
    assert_eq!(value["done"], true);
    assert!(value["note"].is_null());
  }

  #[test]
  fn test_full_malformed_day_recovers() {
    // Condensed from a real failing response.
    let input = r#"{
      "days": [
        {
          "focus": Upper Body Endurance,
          "exercises": [
            {
              "exercise_name": Incline Push-Up,
              "category": Strength,
              "body_part": Chest, Shoulders, Triceps,
              "sets": 2,
              "reps": 12,
              "duration": 6,
              "weights": bodyweight,
              "equipment": yoga_mat,
              "coach_tip": 3-1-3 tempo, RPE 5-6, keep core engaged,
              "rest": 90
            }
          ]
        }
      ]
    }"#;

    let value = parsed(input);
    let day = &value["days"][0];
    assert_eq!(day["focus"], "Upper Body Endurance");
    let exercise = &day["exercises"][0];
    assert_eq!(exercise["exercise_name"], "Incline Push-Up");
    assert_eq!(exercise["body_part"], "Chest, Shoulders, Triceps");
    assert_eq!(exercise["weights"], "bodyweight");
    assert_eq!(exercise["sets"], 2);
    assert_eq!(exercise["rest"], 90);
  }

  #[test]
  fn test_crossed_delimiters_terminate() {
    // Balanced counts do not imply correct nesting; the scan must still
    // finish and settle.
    let once = repair("{]}[");
    assert!(serde_json::from_str::<Value>(&once).is_ok());
    assert_eq!(repair(&once), once);
  }

  #[test]
  fn test_repair_is_idempotent() {
    let samples = [
      r#"{"a": 1, "b": [1, 2,],}"#,
      r#"{"focus": Upper Body Endurance, "exercise_name": Incline Push-Up}"#,
      r#"{"duration": 30_min, "weights": 50kg}"#,
      r#"{focus: "Push", sets: 3}"#,
      r#"{"body_part": Chest, Shoulders, Triceps, "rest": 90}"#,
      r#"{"coach_tip": "rest 90sec", "sets": 3}"#,
    ];

    for sample in samples {
      let once = repair(sample);
      let twice = repair(&once);
      assert_eq!(once, twice, "repair not idempotent for {sample}");
    }
  }
}
