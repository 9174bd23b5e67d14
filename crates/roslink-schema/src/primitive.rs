use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

/// Canonical ROS2 primitive type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Bool,
    Byte,
    Char,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    String,
    WString,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 15] = [
        PrimitiveType::Bool,
        PrimitiveType::Byte,
        PrimitiveType::Char,
        PrimitiveType::Int8,
        PrimitiveType::Uint8,
        PrimitiveType::Int16,
        PrimitiveType::Uint16,
        PrimitiveType::Int32,
        PrimitiveType::Uint32,
        PrimitiveType::Int64,
        PrimitiveType::Uint64,
        PrimitiveType::Float32,
        PrimitiveType::Float64,
        PrimitiveType::String,
        PrimitiveType::WString,
    ];

    /// The tag as written in interface definitions.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Int8 => "int8",
            PrimitiveType::Uint8 => "uint8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::Uint16 => "uint16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Uint32 => "uint32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::Uint64 => "uint64",
            PrimitiveType::Float32 => "float32",
            PrimitiveType::Float64 => "float64",
            PrimitiveType::String => "string",
            PrimitiveType::WString => "wstring",
        }
    }

    /// Inclusive integer bounds for tags carried as `Value::Number`.
    ///
    /// Returns `None` for floats, 64-bit integers, bool, and strings.
    pub(crate) fn integer_bounds(self) -> Option<(f64, f64)> {
        match self {
            PrimitiveType::Byte | PrimitiveType::Char | PrimitiveType::Uint8 => {
                Some((0.0, u8::MAX as f64))
            }
            PrimitiveType::Int8 => Some((i8::MIN as f64, i8::MAX as f64)),
            PrimitiveType::Int16 => Some((i16::MIN as f64, i16::MAX as f64)),
            PrimitiveType::Uint16 => Some((0.0, u16::MAX as f64)),
            PrimitiveType::Int32 => Some((i32::MIN as f64, i32::MAX as f64)),
            PrimitiveType::Uint32 => Some((0.0, u32::MAX as f64)),
            _ => None,
        }
    }
}

impl FromStr for PrimitiveType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrimitiveType::ALL
            .into_iter()
            .find(|tag| tag.name() == s)
            .ok_or_else(|| SchemaError::UnknownPrimitive(s.to_string()))
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
