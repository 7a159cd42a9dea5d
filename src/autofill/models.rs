use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

/// One form field the caller wants answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FieldDescriptor {
    #[validate(length(min = 1))]
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_label")]
    pub label: String,
    /// Input type reported by the page (`text`, `checkbox`, ...).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<HashMap<String, Value>>,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            field_type: None,
            context: None,
        }
    }

    /// Extra hints for the prompt: the input type and any string context.
    pub fn hints(&self) -> Vec<String> {
        let mut hints = Vec::new();
        if let Some(field_type) = self.field_type.as_deref().filter(|t| !t.is_empty()) {
            hints.push(format!("type: {}", field_type));
        }
        if let Some(context) = &self.context {
            let mut keys: Vec<_> = context.keys().collect();
            keys.sort();
            for key in keys {
                if let Some(text) = context[key].as_str().map(str::trim).filter(|t| !t.is_empty()) {
                    hints.push(format!("{}: {}", key, text));
                }
            }
        }
        hints
    }
}

/// Ids arrive as strings or numbers depending on the page; both become strings.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "field id must be a string or number, got {}",
            other
        ))),
    }
}

/// A null label is treated like a missing one.
fn deserialize_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A field together with its generated answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredResponse {
    #[serde(flatten)]
    pub field: FieldDescriptor,
    pub response: String,
}

impl StructuredResponse {
    pub fn new(field: &FieldDescriptor, response: impl Into<String>) -> Self {
        Self {
            field: field.clone(),
            response: response.into(),
        }
    }
}

/// Keep the entries that are usable field descriptors, in order.
pub fn parse_form_fields(values: Vec<Value>) -> Vec<FieldDescriptor> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| {
            let field = match serde_json::from_value::<FieldDescriptor>(value) {
                Ok(field) => field,
                Err(e) => {
                    warn!("Skipping form field {}: {}", i, e);
                    return None;
                }
            };
            if let Err(e) = field.validate() {
                warn!("Skipping form field {}: {}", i, e);
                return None;
            }
            Some(field)
        })
        .collect()
}

/// Field id to answer. A repeated id keeps the answer of its last occurrence.
pub fn responses_to_map(responses: &[StructuredResponse]) -> HashMap<String, String> {
    responses
        .iter()
        .map(|r| (r.field.id.clone(), r.response.clone()))
        .collect()
}
