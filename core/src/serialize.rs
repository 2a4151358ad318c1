//! Converts argument values into their wire form.
//!
//! Query strings want everything flat: lists become a single comma-joined
//! string. JSON bodies keep lists as arrays. In both modes domain objects are
//! replaced by their identity reference and timestamps by ISO-8601 strings.
//! Serialization never recurses into a referenced object's own fields.

use serde_json::{Map, Number};

use crate::datetime::format_iso8601;
use crate::error::SerializeError;
use crate::value::{Args, Identity, Value};

/// A built parameter or body mapping.
pub type Data = Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Query-string form: lists are comma-joined.
    Flat,
    /// JSON-body form: lists stay arrays.
    Structured,
}

pub fn serialize_value(value: &Value, mode: Mode) -> Result<serde_json::Value, SerializeError> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| SerializeError::NonFiniteFloat(f.to_string()))?,
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::DateTime(dt) => serde_json::Value::String(format_iso8601(dt)),
        Value::Reference(Some(Identity::Uuid(uuid))) => serde_json::Value::String(uuid.clone()),
        Value::Reference(Some(Identity::Id(id))) => serde_json::Value::from(*id),
        Value::Reference(None) => return Err(SerializeError::MissingIdentity),
        Value::List(items) => {
            if mode == Mode::Flat && items.iter().any(Value::is_null) {
                return Err(SerializeError::NullListElement);
            }
            let serialized = items
                .iter()
                .map(|item| serialize_value(item, mode))
                .collect::<Result<Vec<_>, _>>()?;
            match mode {
                Mode::Flat => {
                    let parts: Vec<String> = serialized.iter().map(text).collect();
                    serde_json::Value::String(parts.join(","))
                }
                Mode::Structured => serde_json::Value::Array(serialized),
            }
        }
    })
}

/// Builds query parameters. Unset arguments are dropped.
pub fn build_params(args: &Args) -> Result<Data, SerializeError> {
    build_data(args, Mode::Flat)
}

/// Builds a JSON request body. Unset arguments are dropped.
pub fn build_body(args: &Args) -> Result<Data, SerializeError> {
    build_data(args, Mode::Structured)
}

fn build_data(args: &Args, mode: Mode) -> Result<Data, SerializeError> {
    let mut data = Data::new();
    for (name, value) in args.iter().filter(|(_, value)| !value.is_null()) {
        data.insert(name.to_string(), serialize_value(value, mode)?);
    }
    Ok(data)
}

/// Renders a flat mapping as query-string pairs.
pub fn query_pairs(params: &Data) -> Vec<(String, String)> {
    params.iter().map(|(name, value)| (name.clone(), text(value))).collect()
}

/// Text form of a serialized value inside a query string.
fn text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
