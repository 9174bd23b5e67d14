use std::collections::BTreeMap;

/// A dynamically typed message value.
///
/// Each primitive tag maps to exactly one variant: `Bool` for bool,
/// `Int64`/`UInt64` for the 64-bit integers, `String` for string and
/// wstring, and `Number` for every other numeric tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Int64(i64),
    UInt64(u64),
    String(String),
    Array(Vec<Value>),
    Message(BTreeMap<String, Value>),
}

impl Value {
    /// Build a message value from `(field, value)` pairs.
    pub fn message<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Message(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// An empty message record.
    pub fn empty_message() -> Self {
        Value::Message(BTreeMap::new())
    }

    /// Short variant name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Int64(_) => "int64",
            Value::UInt64(_) => "uint64",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Message(_) => "message",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Message(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a field of a message value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.as_message().and_then(|fields| fields.get(field))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Number(v.into())
                }
            }
        )*
    };
}

number_from!(u8, i8, u16, i16, u32, i32, f32, f64);

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}
