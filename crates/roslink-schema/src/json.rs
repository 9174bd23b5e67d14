//! Conversion between dynamic values and JSON.
//!
//! JSON has no native 64-bit integers in many producers, so `int64` and
//! `uint64` fields also accept decimal strings on input.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value as Json};

use crate::error::EncodeError;
use crate::primitive::PrimitiveType;
use crate::schema::Schema;
use crate::value::Value;

impl From<&Value> for Json {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(v) => Json::Bool(*v),
            Value::Number(v) => number_to_json(*v),
            Value::Int64(v) => Json::Number((*v).into()),
            Value::UInt64(v) => Json::Number((*v).into()),
            Value::String(v) => Json::String(v.clone()),
            Value::Array(items) => Json::Array(items.iter().map(Json::from).collect()),
            Value::Message(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(name, v)| (name.clone(), Json::from(v)))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

impl Value {
    /// Render as JSON; integral numbers render without a fraction.
    pub fn to_json(&self) -> Json {
        Json::from(self)
    }

    /// Schema-directed inverse of [`Value::to_json`].
    pub fn from_json(schema: &Schema, json: &Json) -> Result<Value, EncodeError> {
        value_from_json(schema, json)
    }
}

fn number_to_json(v: f64) -> Json {
    if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
        return Json::Number((v as i64).into());
    }
    // NaN and infinities have no JSON form.
    Number::from_f64(v).map_or(Json::Null, Json::Number)
}

/// Build a [`Value`] from JSON, using `schema` to pick each variant.
pub fn value_from_json(schema: &Schema, json: &Json) -> Result<Value, EncodeError> {
    match schema {
        Schema::Primitive(tag) => primitive_from_json(*tag, json),
        Schema::Array(array) => {
            let Json::Array(items) = json else {
                return Err(json_mismatch("array", json));
            };
            items
                .iter()
                .map(|item| value_from_json(array.element(), item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        Schema::Message(message) => {
            let Json::Object(object) = json else {
                return Err(json_mismatch("message", json));
            };
            let mut record = BTreeMap::new();
            for field in message.fields() {
                let item = object
                    .get(field.name())
                    .ok_or_else(|| EncodeError::MissingField {
                        type_name: message.type_name().to_string(),
                        field: field.name().to_string(),
                    })?;
                record.insert(field.name().to_string(), value_from_json(field.schema(), item)?);
            }
            Ok(Value::Message(record))
        }
    }
}

fn primitive_from_json(tag: PrimitiveType, json: &Json) -> Result<Value, EncodeError> {
    match tag {
        PrimitiveType::Bool => json
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| json_mismatch("bool", json)),
        PrimitiveType::String | PrimitiveType::WString => json
            .as_str()
            .map(Value::from)
            .ok_or_else(|| json_mismatch("string", json)),
        PrimitiveType::Int64 => match json {
            Json::Number(n) => n.as_i64().map(Value::Int64),
            Json::String(s) => s.parse().ok().map(Value::Int64),
            _ => None,
        }
        .ok_or_else(|| json_mismatch("int64", json)),
        PrimitiveType::Uint64 => match json {
            Json::Number(n) => n.as_u64().map(Value::UInt64),
            Json::String(s) => s.parse().ok().map(Value::UInt64),
            _ => None,
        }
        .ok_or_else(|| json_mismatch("uint64", json)),
        _ => json
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| json_mismatch("number", json)),
    }
}

fn json_mismatch(expected: &'static str, found: &Json) -> EncodeError {
    let found = match found {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    };
    EncodeError::TypeMismatch { expected, found }
}
