//! Minimal JSON schema validation.
//!
//! Supports the subset the configuration surface needs: `object`,
//! `array`, `string`, `number`, `boolean` types, `required`,
//! `additionalProperties`, and string `pattern`. The schema itself is
//! checked once at construction, so validation can assume a well-formed
//! schema and fail only on the value under test.
//!
//! Unknown object properties are rejected unless the schema sets
//! `additionalProperties: true`; declared properties are always
//! validated either way.

use regex::Regex;
use serde_json::Value;

use crate::error::SchemaError;

const SUPPORTED_SCALARS: [&str; 3] = ["string", "number", "boolean"];

/// A schema checked for well-formedness at construction.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema: Value,
}

impl SchemaValidator {
    /// Check the schema itself, then wrap it. Every `type` must be
    /// supported, every `object` must carry a `properties` object,
    /// every `array` an `items` object, and every declared property
    /// schema must itself be valid.
    pub fn new(schema: Value) -> Result<Self, SchemaError> {
        test_schema(&schema)?;
        Ok(SchemaValidator { schema })
    }

    /// Walk `value` against the schema, failing on the first mismatch.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaError> {
        match_against(&self.schema, value)
    }
}

fn schema_type(schema: &Value) -> Option<&str> {
    schema.get("type").and_then(Value::as_str)
}

fn test_schema(schema: &Value) -> Result<(), SchemaError> {
    match schema_type(schema) {
        Some("array") => {
            let items = schema
                .get("items")
                .ok_or_else(|| SchemaError::InvalidSchema("expected property \"items\"".into()))?;
            if !items.is_object() {
                return Err(SchemaError::InvalidSchema(
                    "property \"items\" is not an object".into(),
                ));
            }
            test_schema(items)
        }
        Some("object") => {
            let properties = schema.get("properties").ok_or_else(|| {
                SchemaError::InvalidSchema("expected property \"properties\"".into())
            })?;
            let Value::Object(properties) = properties else {
                return Err(SchemaError::InvalidSchema(
                    "property \"properties\" is not an object".into(),
                ));
            };
            if let Some(required) = schema.get("required") {
                let names = required.as_array().ok_or_else(|| {
                    SchemaError::InvalidSchema("property \"required\" is not an array".into())
                })?;
                for name in names {
                    let name = name.as_str().ok_or_else(|| {
                        SchemaError::InvalidSchema("\"required\" entries must be strings".into())
                    })?;
                    if !properties.contains_key(name) {
                        return Err(SchemaError::InvalidSchema(format!(
                            "required property {name:?} is not defined"
                        )));
                    }
                }
            }
            for (name, property) in properties {
                test_schema(property).map_err(|err| match err {
                    SchemaError::InvalidSchema(msg) => {
                        SchemaError::InvalidSchema(format!("property {name:?}: {msg}"))
                    }
                    other => other,
                })?;
            }
            Ok(())
        }
        Some("string") => {
            if let Some(pattern) = schema.get("pattern") {
                let pattern = pattern.as_str().ok_or_else(|| {
                    SchemaError::InvalidSchema("property \"pattern\" is not a string".into())
                })?;
                Regex::new(pattern).map_err(|err| {
                    SchemaError::InvalidSchema(format!("bad pattern {pattern:?}: {err}"))
                })?;
            }
            Ok(())
        }
        Some(other) if SUPPORTED_SCALARS.contains(&other) => Ok(()),
        Some(other) => Err(SchemaError::InvalidSchema(format!(
            "unsupported type {other:?}"
        ))),
        None => Err(SchemaError::InvalidSchema(
            "schema has no \"type\"".into(),
        )),
    }
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn match_against(schema: &Value, tested: &Value) -> Result<(), SchemaError> {
    let expected = schema_type(schema).unwrap_or_default();

    if expected == "array" {
        if let Value::Array(items) = tested {
            let item_schema = &schema["items"];
            for item in items {
                match_against(item_schema, item)?;
            }
            return Ok(());
        }
    }

    let found = value_type(tested);
    if expected != found {
        return Err(SchemaError::Mismatch(format!(
            "expected {expected} but found {found}"
        )));
    }

    if let Value::Object(entries) = tested {
        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for name in required.iter().filter_map(Value::as_str) {
                if !entries.contains_key(name) {
                    return Err(SchemaError::Mismatch(format!(
                        "expected required property {name:?} doesn't exist"
                    )));
                }
            }
        }
        let allow_additional = schema
            .get("additionalProperties")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let properties = &schema["properties"];
        for (key, value) in entries {
            match properties.get(key) {
                Some(property) => match_against(property, value).map_err(|err| match err {
                    SchemaError::Mismatch(msg) => {
                        SchemaError::Mismatch(format!("property {key:?}: {msg}"))
                    }
                    other => other,
                })?,
                None if allow_additional => {}
                None => {
                    return Err(SchemaError::Mismatch(format!(
                        "unexpected property {key:?}"
                    )));
                }
            }
        }
    }

    if let Value::String(text) = tested {
        if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
            // Patterns were compiled once during schema checking.
            let re = Regex::new(pattern)
                .map_err(|err| SchemaError::Mismatch(format!("bad pattern: {err}")))?;
            if !re.is_match(text) {
                return Err(SchemaError::Mismatch(format!(
                    "value {text:?} doesn't match pattern"
                )));
            }
        }
    }

    Ok(())
}
