//! Instruction templating from session state
//!
//! `{name}` is replaced by the state value under `name`, `{name?}` by the value
//! or nothing. Names may carry an `app:`, `user:` or `temp:` prefix. Anything
//! in braces that is not a state name, such as a JSON example inside an
//! instruction, is left as written.

use std::collections::HashMap;
use std::sync::OnceLock;

use fancy_regex::Regex;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("State variable '{0}' not found")]
    MissingVariable(String),

    #[error("template scan failed: {0}")]
    Scan(#[from] fancy_regex::Error),
}

pub type Result<T> = std::result::Result<T, TemplateError>;

const STATE_PREFIXES: [&str; 3] = ["app", "user", "temp"];

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{+[^{}]*\}+").expect("placeholder pattern is valid"))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        },
        _ => false,
    }
}

fn is_state_name(name: &str) -> bool {
    match name.split_once(':') {
        None => is_identifier(name),
        Some((prefix, rest)) => STATE_PREFIXES.contains(&prefix) && is_identifier(rest),
    }
}

/// Strings render raw, everything else as compact JSON
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn replace_placeholder(placeholder: &str, state: &HashMap<String, Value>) -> Result<String> {
    let inner = placeholder.trim_matches(|c| c == '{' || c == '}').trim();
    let (name, optional) = match inner.strip_suffix('?') {
        Some(name) => (name, true),
        None => (inner, false),
    };

    if !is_state_name(name) {
        return Ok(placeholder.to_string());
    }

    match state.get(name) {
        Some(value) => Ok(render_value(value)),
        None if optional => Ok(String::new()),
        None => Err(TemplateError::MissingVariable(name.to_string())),
    }
}

/// Fill `template` from `state`
pub fn inject_state(template: &str, state: &HashMap<String, Value>) -> Result<String> {
    let mut result = String::with_capacity(template.len());
    let mut last_end = 0;

    for found in placeholder_regex().find_iter(template) {
        let found = found?;
        result.push_str(&template[last_end..found.start()]);
        result.push_str(&replace_placeholder(found.as_str(), state)?);
        last_end = found.end();
    }

    result.push_str(&template[last_end..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn state() -> HashMap<String, Value> {
        HashMap::from([
            ("Mathematician".to_string(), json!("Isaac Newton")),
            ("user:level".to_string(), json!(3)),
            ("tags".to_string(), json!(["a", "b"])),
        ])
    }

    #[test]
    fn test_state_name_rules() {
        assert!(is_state_name("Famous_Formulae"));
        assert!(is_state_name("temp:scratch"));
        assert!(!is_state_name("other:thing"));
        assert!(!is_state_name("9lives"));
        assert!(!is_state_name("a:b:c"));
    }

    #[test]
    fn test_replaces_values() {
        let template = "Name in {Mathematician}, level {user:level}, {tags}";
        let out = inject_state(template, &state()).unwrap();
        assert_eq!(out, "Name in Isaac Newton, level 3, [\"a\",\"b\"]");
    }

    #[test]
    fn test_optional_missing_is_empty() {
        assert_eq!(inject_state("[{nickname?}]", &state()).unwrap(), "[]");
    }

    #[test]
    fn test_required_missing_is_error() {
        let err = inject_state("Laws in {Famous_Formulae}", &state()).unwrap_err();
        assert!(matches!(err, TemplateError::MissingVariable(name) if name == "Famous_Formulae"));
    }

    #[test]
    fn test_json_examples_left_alone() {
        let template = "Output:\n    {\n        \"para\": \"the paragraph\"\n    }\n";
        assert_eq!(inject_state(template, &state()).unwrap(), template);
    }
}
