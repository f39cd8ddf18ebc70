//! Cleanup of raw generator output before any parse attempt.
//!
//! Generator responses arrive as prose-wrapped, fence-wrapped, sometimes
//! annotation-prefixed text that should contain one JSON object. This module
//! pares the text down to that object and cheaply rejects responses that
//! were cut off mid-stream.

use crate::parse::ParseError;

/// Annotation blocks some reasoning backends prepend to their answer.
const ANNOTATION_TAGS: [&str; 4] = ["think", "thinking", "reasoning", "process"];

/// Best-effort reduction of a raw response to a JSON-looking string.
///
/// Never fails; when no transformation applies the trimmed input is returned
/// unchanged. Order: annotation blocks, code fences, first-`{`-to-last-`}`
/// span extraction.
pub fn normalize_response(raw: &str) -> String {
  let stripped = strip_annotation_blocks(raw);
  let unfenced = strip_code_fences(&stripped);
  match extract_object_span(&unfenced) {
    Some(span) => span.to_string(),
    None => unfenced,
  }
}

/// Cheap truncation check over a normalized response.
///
/// Quotes inside string literals participate in the parity check exactly
/// like structural quotes; this is a pre-filter, not a parser. Either
/// failure means the stream itself was incomplete, which no textual repair
/// can fix without fabricating structure, so both are terminal.
pub fn check_integrity(text: &str) -> Result<(), ParseError> {
  let mut open_braces = 0usize;
  let mut close_braces = 0usize;
  let mut open_brackets = 0usize;
  let mut close_brackets = 0usize;
  let mut quotes = 0usize;

  for ch in text.chars() {
    match ch {
      '{' => open_braces += 1,
      '}' => close_braces += 1,
      '[' => open_brackets += 1,
      ']' => close_brackets += 1,
      '"' => quotes += 1,
      _ => {}
    }
  }

  if quotes % 2 != 0 {
    return Err(ParseError::UnclosedQuotes);
  }
  if open_braces != close_braces || open_brackets != close_brackets {
    return Err(ParseError::Truncated);
  }
  Ok(())
}

/// Remove `<think>...</think>`-style blocks, case-insensitive. An unclosed
/// opening tag drops the rest of its line.
fn strip_annotation_blocks(text: &str) -> String {
  let mut out = text.to_string();

  for tag in ANNOTATION_TAGS {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");

    while let Some(start) = find_ascii_ci(&out, &open, 0) {
      match find_ascii_ci(&out, &close, start + open.len()) {
        Some(close_at) => {
          out.replace_range(start..close_at + close.len(), "");
        }
        None => {
          let line_end = out[start..]
            .find('\n')
            .map(|i| start + i)
            .unwrap_or(out.len());
          out.replace_range(start..line_end, "");
        }
      }
    }
  }

  out.trim().to_string()
}

/// ASCII case-insensitive substring search starting at `from`.
fn find_ascii_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
  let h = haystack.as_bytes();
  let n = needle.as_bytes();
  if n.is_empty() || h.len() < n.len() || from + n.len() > h.len() {
    return None;
  }
  (from..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

/// Strip a leading Markdown fence (with optional language tag) and the
/// matching trailing fence.
fn strip_code_fences(text: &str) -> String {
  let trimmed = text.trim();
  if !trimmed.starts_with("```") {
    return trimmed.to_string();
  }

  let body = match trimmed.find('\n') {
    Some(newline) => &trimmed[newline + 1..],
    // A single fenced line: drop the backticks and whatever tag remains.
    None => return trimmed.trim_matches('`').trim().to_string(),
  };

  let body = body.trim_end();
  let body = body.strip_suffix("```").unwrap_or(body);
  body.trim().to_string()
}

/// Greedy span from the first `{` to the last `}`; recovers JSON embedded in
/// explanatory prose.
fn extract_object_span(text: &str) -> Option<&str> {
  let start = text.find('{')?;
  let end = text.rfind('}')?;
  if end < start {
    return None;
  }
  Some(&text[start..=end])
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
