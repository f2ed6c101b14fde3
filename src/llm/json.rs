//! Parsing structured replies out of model text

use serde_json::Value;

use super::{LlmError, Result};

/// Parse a model reply as JSON.
///
/// Models wrap JSON in prose or Markdown fences often enough that a strict
/// parse is not useful. Tries, in order: the whole text, the body of the first
/// fenced block, and the outermost `{...}` span.
pub fn extract_json(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    if let Some(body) = fenced_body(trimmed) {
        if let Ok(value) = serde_json::from_str(body) {
            return Ok(value);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(LlmError::InvalidJson(truncate(trimmed, 80)))
}

fn fenced_body(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    // Skip an optional language tag on the fence line
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        assert_eq!(extract_json(r#" {"para": "hi"} "#).unwrap(), json!({"para": "hi"}));
    }

    #[test]
    fn test_fenced_json() {
        let reply = "Here you go:\n```json\n{\"para\": \"A short text.\"}\n```\n";
        assert_eq!(extract_json(reply).unwrap(), json!({"para": "A short text."}));
    }

    #[test]
    fn test_embedded_object() {
        let reply = r#"Sure! {"label": "4 stars", "score": 0.8} Hope that helps."#;
        assert_eq!(extract_json(reply).unwrap()["label"], "4 stars");
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(
            extract_json("I cannot answer that."),
            Err(LlmError::InvalidJson(_))
        ));
    }
}
