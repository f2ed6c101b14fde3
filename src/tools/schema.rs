//! JSON schema helpers for tool definitions

use serde_json::{json, Value};

/// Build a JSON schema object
pub fn object_schema() -> SchemaBuilder {
    SchemaBuilder::new("object")
}

/// Build a string property
pub fn string_prop(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}

/// Build an integer property
pub fn integer_prop(description: &str) -> Value {
    json!({
        "type": "integer",
        "description": description
    })
}

/// Build a number (float) property
pub fn number_prop(description: &str) -> Value {
    json!({
        "type": "number",
        "description": description
    })
}

/// Schema builder for tool arguments and structured agent output
pub struct SchemaBuilder {
    schema_type: String,
    properties: serde_json::Map<String, Value>,
    required: Vec<String>,
}

impl SchemaBuilder {
    pub fn new(schema_type: &str) -> Self {
        Self {
            schema_type: schema_type.to_string(),
            properties: serde_json::Map::new(),
            required: Vec::new(),
        }
    }

    pub fn property(mut self, name: &str, schema: Value, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    pub fn build(self) -> Value {
        json!({
            "type": self.schema_type,
            "properties": self.properties,
            "required": self.required
        })
    }
}

/// Names listed under `required` in an object schema
pub fn required_fields(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|fields| fields.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_tracks_required() {
        let schema = object_schema()
            .property("a", number_prop("First operand"), true)
            .property("note", string_prop("Optional note"), false)
            .build();
        assert_eq!(schema["properties"]["a"]["type"], "number");
        assert_eq!(required_fields(&schema), vec!["a"]);
    }

    #[test]
    fn test_required_fields_absent() {
        assert!(required_fields(&json!({"type": "object"})).is_empty());
    }
}
