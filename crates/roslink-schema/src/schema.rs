use std::collections::{BTreeMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;

use bytes::Bytes;
use roslink_cdr::{CdrReader, CdrWriter};

use crate::error::{DecodeError, EncodeError, Result, SchemaError};
use crate::primitive::PrimitiveType;
use crate::value::Value;

/// A node of a CDR schema tree.
///
/// Trees are immutable once built and are usually shared behind an
/// [`Arc`]. Children are processed depth-first in field order.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Primitive(PrimitiveType),
    Array(ArraySchema),
    Message(MessageSchema),
}

/// A sequence (no fixed length) or fixed-size array of one element type.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    element: Arc<Schema>,
    fixed_len: Option<NonZeroUsize>,
}

/// A named message type with fields in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSchema {
    type_name: String,
    fields: Vec<Field>,
}

/// One named field of a message.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    schema: Arc<Schema>,
}

impl Field {
    pub fn new(name: impl Into<String>, schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

impl ArraySchema {
    pub fn element(&self) -> &Arc<Schema> {
        &self.element
    }

    /// Declared length, or `None` for a variable-length sequence.
    pub fn fixed_len(&self) -> Option<usize> {
        self.fixed_len.map(NonZeroUsize::get)
    }
}

impl MessageSchema {
    pub fn new(type_name: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> Result<Self> {
        let type_name = type_name.into();
        let fields: Vec<Field> = fields.into_iter().collect();

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    type_name,
                    field: field.name.clone(),
                });
            }
        }

        Ok(Self { type_name, fields })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn write(&self, writer: &mut CdrWriter, value: &Value) -> std::result::Result<(), EncodeError> {
        let Value::Message(record) = value else {
            return Err(mismatch("message", value));
        };

        // An empty struct still occupies one byte.
        if self.fields.is_empty() {
            writer.write_empty_struct();
            return Ok(());
        }

        for field in &self.fields {
            let field_value =
                record
                    .get(&field.name)
                    .ok_or_else(|| EncodeError::MissingField {
                        type_name: self.type_name.clone(),
                        field: field.name.clone(),
                    })?;
            field.schema.write(writer, field_value)?;
        }
        Ok(())
    }

    fn read(&self, reader: &mut CdrReader<'_>) -> std::result::Result<Value, DecodeError> {
        if self.fields.is_empty() {
            reader.read_empty_struct()?;
            return Ok(Value::empty_message());
        }

        let mut record = BTreeMap::new();
        for field in &self.fields {
            record.insert(field.name.clone(), field.schema.read(reader)?);
        }
        Ok(Value::Message(record))
    }
}

impl Schema {
    pub fn primitive(tag: PrimitiveType) -> Self {
        Schema::Primitive(tag)
    }

    /// Build a primitive node from its interface-definition name.
    pub fn primitive_named(name: &str) -> Result<Self> {
        name.parse().map(Schema::Primitive)
    }

    /// A variable-length sequence of `element`.
    pub fn sequence(element: impl Into<Arc<Schema>>) -> Self {
        Schema::Array(ArraySchema {
            element: element.into(),
            fixed_len: None,
        })
    }

    /// A fixed-size array of `len` elements; `len` must be positive.
    pub fn fixed_array(element: impl Into<Arc<Schema>>, len: usize) -> Result<Self> {
        let fixed_len = NonZeroUsize::new(len).ok_or(SchemaError::InvalidFixedLength)?;
        Ok(Schema::Array(ArraySchema {
            element: element.into(),
            fixed_len: Some(fixed_len),
        }))
    }

    /// A message type with fields in wire order.
    pub fn message(
        type_name: impl Into<String>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Result<Self> {
        MessageSchema::new(type_name, fields).map(Schema::Message)
    }

    /// The message type name, if this node is a message.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Schema::Message(message) => Some(message.type_name()),
            _ => None,
        }
    }

    /// Encode `value` at the writer's current offset.
    pub fn write(&self, writer: &mut CdrWriter, value: &Value) -> std::result::Result<(), EncodeError> {
        match self {
            Schema::Primitive(tag) => write_primitive(*tag, writer, value),
            Schema::Array(array) => {
                let Value::Array(items) = value else {
                    return Err(mismatch("array", value));
                };
                match array.fixed_len() {
                    Some(expected) if items.len() != expected => {
                        return Err(EncodeError::FixedLengthMismatch {
                            expected,
                            actual: items.len(),
                        });
                    }
                    Some(_) => {}
                    None => writer.write_sequence_len(items.len())?,
                }
                for item in items {
                    array.element.write(writer, item)?;
                }
                Ok(())
            }
            Schema::Message(message) => message.write(writer, value),
        }
    }

    /// Decode one value at the reader's current offset.
    pub fn read(&self, reader: &mut CdrReader<'_>) -> std::result::Result<Value, DecodeError> {
        match self {
            Schema::Primitive(tag) => read_primitive(*tag, reader),
            Schema::Array(array) => {
                let count = match array.fixed_len() {
                    Some(len) => len,
                    None => reader.read_sequence_len()?,
                };
                // Every element occupies at least one byte, so the remaining
                // length bounds any honest count.
                let mut items = Vec::with_capacity(count.min(reader.remaining()));
                for _ in 0..count {
                    items.push(array.element.read(reader)?);
                }
                Ok(Value::Array(items))
            }
            Schema::Message(message) => message.read(reader),
        }
    }
}

impl From<PrimitiveType> for Schema {
    fn from(tag: PrimitiveType) -> Self {
        Schema::Primitive(tag)
    }
}

impl From<MessageSchema> for Schema {
    fn from(message: MessageSchema) -> Self {
        Schema::Message(message)
    }
}

impl From<PrimitiveType> for Arc<Schema> {
    fn from(tag: PrimitiveType) -> Self {
        Arc::new(Schema::Primitive(tag))
    }
}

/// Encode a top-level payload: encapsulation header, then `value`.
///
/// On error no bytes are returned.
pub fn serialize(schema: &Schema, value: &Value) -> std::result::Result<Bytes, EncodeError> {
    let mut writer = CdrWriter::new();
    schema.write(&mut writer, value)?;
    Ok(writer.into_bytes())
}

/// Decode a top-level payload produced by [`serialize`].
///
/// Bytes left over after the value are ignored.
pub fn deserialize(schema: &Schema, bytes: &[u8]) -> std::result::Result<Value, DecodeError> {
    let mut reader = CdrReader::new(bytes)?;
    schema.read(&mut reader)
}

fn mismatch(expected: &'static str, found: &Value) -> EncodeError {
    EncodeError::TypeMismatch {
        expected,
        found: found.kind(),
    }
}

fn number_for(tag: PrimitiveType, value: &Value) -> std::result::Result<f64, EncodeError> {
    let Value::Number(n) = value else {
        return Err(mismatch("number", value));
    };
    if let Some((min, max)) = tag.integer_bounds() {
        if n.fract() != 0.0 || *n < min || *n > max {
            return Err(EncodeError::OutOfRange { tag, value: *n });
        }
    }
    Ok(*n)
}

fn write_primitive(
    tag: PrimitiveType,
    writer: &mut CdrWriter,
    value: &Value,
) -> std::result::Result<(), EncodeError> {
    match tag {
        PrimitiveType::Bool => match value {
            Value::Bool(v) => writer.write_bool(*v),
            other => return Err(mismatch("bool", other)),
        },
        PrimitiveType::Byte | PrimitiveType::Char | PrimitiveType::Uint8 => {
            writer.write_u8(number_for(tag, value)? as u8)
        }
        PrimitiveType::Int8 => writer.write_i8(number_for(tag, value)? as i8),
        PrimitiveType::Int16 => writer.write_i16(number_for(tag, value)? as i16),
        PrimitiveType::Uint16 => writer.write_u16(number_for(tag, value)? as u16),
        PrimitiveType::Int32 => writer.write_i32(number_for(tag, value)? as i32),
        PrimitiveType::Uint32 => writer.write_u32(number_for(tag, value)? as u32),
        PrimitiveType::Float32 => writer.write_f32(number_for(tag, value)? as f32),
        PrimitiveType::Float64 => writer.write_f64(number_for(tag, value)?),
        PrimitiveType::Int64 => match value {
            Value::Int64(v) => writer.write_i64(*v),
            other => return Err(mismatch("int64", other)),
        },
        PrimitiveType::Uint64 => match value {
            Value::UInt64(v) => writer.write_u64(*v),
            other => return Err(mismatch("uint64", other)),
        },
        PrimitiveType::String | PrimitiveType::WString => match value {
            Value::String(v) => writer.write_string(v)?,
            other => return Err(mismatch("string", other)),
        },
    }
    Ok(())
}

fn read_primitive(
    tag: PrimitiveType,
    reader: &mut CdrReader<'_>,
) -> std::result::Result<Value, DecodeError> {
    let value = match tag {
        PrimitiveType::Bool => Value::Bool(reader.read_bool()?),
        PrimitiveType::Byte | PrimitiveType::Char | PrimitiveType::Uint8 => {
            Value::from(reader.read_u8()?)
        }
        PrimitiveType::Int8 => Value::from(reader.read_i8()?),
        PrimitiveType::Int16 => Value::from(reader.read_i16()?),
        PrimitiveType::Uint16 => Value::from(reader.read_u16()?),
        PrimitiveType::Int32 => Value::from(reader.read_i32()?),
        PrimitiveType::Uint32 => Value::from(reader.read_u32()?),
        PrimitiveType::Float32 => Value::from(reader.read_f32()?),
        PrimitiveType::Float64 => Value::from(reader.read_f64()?),
        PrimitiveType::Int64 => Value::Int64(reader.read_i64()?),
        PrimitiveType::Uint64 => Value::UInt64(reader.read_u64()?),
        PrimitiveType::String | PrimitiveType::WString => Value::String(reader.read_string()?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_field(type_name: &str, tag: PrimitiveType) -> Schema {
        Schema::message(type_name, [Field::new("data", tag)]).unwrap()
    }

    #[test]
    fn decodes_uint32_payload() {
        let schema = single_field("std_msgs/msg/UInt32", PrimitiveType::Uint32);
        let value = deserialize(&schema, &[0x00, 0x01, 0x00, 0x00, 0xD2, 0x04, 0x00, 0x00]).unwrap();
        assert_eq!(value, Value::message([("data", Value::from(1234u32))]));
    }

    #[test]
    fn string_payload_both_directions() {
        let schema = single_field("std_msgs/msg/String", PrimitiveType::String);
        let wire = [
            0x00, 0x01, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x00,
        ];
        let value = Value::message([("data", Value::from("hello"))]);

        assert_eq!(deserialize(&schema, &wire).unwrap(), value);
        assert_eq!(serialize(&schema, &value).unwrap().as_ref(), &wire);
    }

    #[test]
    fn empty_message_is_five_bytes() {
        let schema = Schema::message("std_msgs/msg/Empty", []).unwrap();
        let decoded = deserialize(&schema, &[0x00, 0x01, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(decoded, Value::empty_message());

        let encoded = serialize(&schema, &Value::empty_message()).unwrap();
        assert_eq!(encoded.as_ref(), &[0x00, 0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn empty_message_without_placeholder_is_eof() {
        let schema = Schema::message("std_msgs/msg/Empty", []).unwrap();
        assert!(matches!(
            deserialize(&schema, &[0x00, 0x01, 0x00, 0x00]),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn fixed_array_length_mismatch() {
        let schema = Schema::message(
            "test_msgs/msg/Pair",
            [Field::new(
                "values",
                Schema::fixed_array(PrimitiveType::Int32, 2).unwrap(),
            )],
        )
        .unwrap();
        let value = Value::message([(
            "values",
            Value::Array(vec![1i32.into(), 2i32.into(), 3i32.into()]),
        )]);

        assert_eq!(
            serialize(&schema, &value).unwrap_err(),
            EncodeError::FixedLengthMismatch {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn zero_fixed_length_rejected_at_construction() {
        assert_eq!(
            Schema::fixed_array(PrimitiveType::Uint8, 0).unwrap_err(),
            SchemaError::InvalidFixedLength
        );
    }

    #[test]
    fn unknown_primitive_rejected_at_construction() {
        assert_eq!(
            Schema::primitive_named("uint128").unwrap_err(),
            SchemaError::UnknownPrimitive("uint128".to_string())
        );
    }

    #[test]
    fn duplicate_field_rejected() {
        let err = Schema::message(
            "test_msgs/msg/Dup",
            [
                Field::new("a", PrimitiveType::Bool),
                Field::new("a", PrimitiveType::Int8),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { field, .. } if field == "a"));
    }

    #[test]
    fn fixed_array_has_no_count_prefix() {
        let schema = Schema::fixed_array(PrimitiveType::Uint8, 3).unwrap();
        let bytes = serialize(&schema, &Value::Array(vec![1u8.into(), 2u8.into(), 3u8.into()])).unwrap();
        assert_eq!(bytes.as_ref(), &[0, 1, 0, 0, 1, 2, 3]);
    }

    #[test]
    fn sequence_elements_are_individually_aligned() {
        let schema = Schema::message(
            "test_msgs/msg/Mixed",
            [
                Field::new("flag", PrimitiveType::Bool),
                Field::new("samples", Schema::sequence(PrimitiveType::Float64)),
            ],
        )
        .unwrap();
        let value = Value::message([
            ("flag", Value::from(true)),
            ("samples", Value::Array(vec![1.5f64.into(), (-2.0f64).into()])),
        ]);

        let bytes = serialize(&schema, &value).unwrap();
        // header | bool @4 | pad 5..8 | count @8 | pad 12..16 | f64 @16 | f64 @24
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[8..12], &[2, 0, 0, 0]);
        assert_eq!(&bytes[16..24], &1.5f64.to_le_bytes());
        assert_eq!(deserialize(&schema, &bytes).unwrap(), value);
    }

    #[test]
    fn nested_round_trip() {
        let point: Arc<Schema> = Arc::new(
            Schema::message(
                "geometry_msgs/msg/Point",
                [
                    Field::new("x", PrimitiveType::Float64),
                    Field::new("y", PrimitiveType::Float64),
                    Field::new("z", PrimitiveType::Float64),
                ],
            )
            .unwrap(),
        );
        let schema = Schema::message(
            "test_msgs/msg/Path",
            [
                Field::new("frame_id", PrimitiveType::String),
                Field::new("stamp_ns", PrimitiveType::Uint64),
                Field::new("offset", PrimitiveType::Int64),
                Field::new("points", Schema::sequence(Arc::clone(&point))),
                Field::new("origin", Arc::clone(&point)),
                Field::new("tags", Schema::fixed_array(PrimitiveType::WString, 2).unwrap()),
                Field::new("level", PrimitiveType::Int8),
                Field::new("code", PrimitiveType::Uint16),
                Field::new("gain", PrimitiveType::Float32),
            ],
        )
        .unwrap();

        let p = |x: f64, y: f64, z: f64| {
            Value::message([("x", x.into()), ("y", y.into()), ("z", z.into())])
        };
        let value = Value::message([
            ("frame_id", Value::from("map")),
            ("stamp_ns", Value::UInt64(u64::MAX)),
            ("offset", Value::Int64(i64::MIN)),
            ("points", Value::Array(vec![p(1.0, 2.0, 3.0), p(-1.0, 0.5, 0.0)])),
            ("origin", p(0.0, 0.0, 0.0)),
            ("tags", Value::Array(vec!["a".into(), "".into()])),
            ("level", Value::from(-7i8)),
            ("code", Value::from(65535u16)),
            ("gain", Value::from(0.75f32)),
        ]);

        let bytes = serialize(&schema, &value).unwrap();
        assert_eq!(deserialize(&schema, &bytes).unwrap(), value);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let schema = single_field("std_msgs/msg/UInt8", PrimitiveType::Uint8);
        let value = deserialize(&schema, &[0, 1, 0, 0, 9, 0xAA, 0xBB]).unwrap();
        assert_eq!(value, Value::message([("data", Value::from(9u8))]));
    }

    #[test]
    fn short_buffer_is_decode_error() {
        let schema = single_field("std_msgs/msg/Float64", PrimitiveType::Float64);
        assert!(matches!(
            deserialize(&schema, &[0, 1, 0, 0, 0, 0, 0, 0, 1, 2]),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn huge_sequence_count_fails_without_allocating() {
        let schema = Schema::sequence(PrimitiveType::Uint8);
        let err = deserialize(&schema, &[0, 1, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 1]).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof { .. }));
    }

    #[test]
    fn number_range_is_checked() {
        let schema = Schema::primitive(PrimitiveType::Uint8);
        assert_eq!(
            serialize(&schema, &Value::Number(256.0)).unwrap_err(),
            EncodeError::OutOfRange {
                tag: PrimitiveType::Uint8,
                value: 256.0
            }
        );
        assert!(matches!(
            serialize(&schema, &Value::Number(1.5)),
            Err(EncodeError::OutOfRange { .. })
        ));
        assert!(serialize(&Schema::primitive(PrimitiveType::Int32), &Value::Number(-2147483648.0)).is_ok());
    }

    #[test]
    fn wrong_variant_is_type_mismatch() {
        let schema = Schema::primitive(PrimitiveType::Int64);
        assert_eq!(
            serialize(&schema, &Value::Number(1.0)).unwrap_err(),
            EncodeError::TypeMismatch {
                expected: "int64",
                found: "number"
            }
        );
    }

    #[test]
    fn missing_field_is_reported() {
        let schema = single_field("std_msgs/msg/Bool", PrimitiveType::Bool);
        assert_eq!(
            serialize(&schema, &Value::empty_message()).unwrap_err(),
            EncodeError::MissingField {
                type_name: "std_msgs/msg/Bool".to_string(),
                field: "data".to_string()
            }
        );
    }

    #[test]
    fn field_order_is_wire_order() {
        let schema = Schema::message(
            "test_msgs/msg/Order",
            [
                Field::new("z", PrimitiveType::Uint8),
                Field::new("a", PrimitiveType::Uint8),
            ],
        )
        .unwrap();
        let value = Value::message([("a", Value::from(1u8)), ("z", Value::from(2u8))]);
        assert_eq!(serialize(&schema, &value).unwrap().as_ref(), &[0, 1, 0, 0, 2, 1]);
    }
}
