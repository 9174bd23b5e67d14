use roslink_cdr::CdrError;

use crate::primitive::PrimitiveType;

/// Errors raised while constructing a schema tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The primitive type name is not one of the canonical tags.
    #[error("unknown primitive type '{0}'")]
    UnknownPrimitive(String),

    /// A fixed-size array was declared with length zero.
    #[error("fixed array length must be a positive integer")]
    InvalidFixedLength,

    /// A message declares the same field name twice.
    #[error("duplicate field '{field}' in {type_name}")]
    DuplicateField { type_name: String, field: String },
}

/// Errors raised while encoding a value against a schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    /// A fixed-size array value has the wrong number of elements.
    #[error("fixed array length mismatch (expected {expected}, got {actual})")]
    FixedLengthMismatch { expected: usize, actual: usize },

    /// The value variant does not match the schema node.
    #[error("type mismatch (expected {expected}, found {found})")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A number cannot be represented by the primitive type.
    #[error("value {value} out of range for {tag}")]
    OutOfRange { tag: PrimitiveType, value: f64 },

    /// A message value lacks a field the schema requires.
    #[error("missing field '{field}' in {type_name}")]
    MissingField { type_name: String, field: String },

    /// The underlying writer rejected the value.
    #[error("cdr error: {0}")]
    Cdr(#[from] CdrError),
}

/// Errors raised while decoding bytes against a schema.
pub type DecodeError = CdrError;

/// Errors raised by the schema registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A descriptor produced an invalid schema.
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    /// A field references a type that is neither primitive nor registered.
    #[error("unknown type '{type_name}' for field '{field}'")]
    UnknownType { type_name: String, field: String },

    /// Only message nodes can be registered as message types.
    #[error("schema is not a message type")]
    NotAMessage,

    /// The type name is already registered and overwrites are disabled.
    #[error("type '{0}' is already registered")]
    AlreadyRegistered(String),

    /// Registering would exceed the configured type limit.
    #[error("registry holds the configured maximum of {max} types")]
    TooManyTypes { max: usize },

    /// A batch document contains types whose dependencies never resolved.
    #[error("unresolved message types: {}", .0.join(", "))]
    Unresolved(Vec<String>),

    /// The descriptor document is not valid JSON.
    #[error("invalid descriptor JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
