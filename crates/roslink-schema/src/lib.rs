//! Composable CDR schemas for ROS2 message and service types.
//!
//! A [`Schema`] is an immutable tree built once per type: primitives,
//! arrays (fixed or variable length), and messages with ordered fields.
//! The tree describes how to read and write itself through the
//! `roslink-cdr` codec; [`serialize`] and [`deserialize`] are the two
//! entry points applications use against raw payload bytes.
//!
//! [`SchemaRegistry`] builds schemas from field-list descriptors produced
//! by an interface-definition parser and resolves nested message types by
//! name.

pub mod config;
pub mod error;
pub mod json;
pub mod primitive;
pub mod registry;
pub mod schema;
pub mod service;
pub mod value;

pub use config::RegistryConfig;
pub use error::{DecodeError, EncodeError, RegistryError, SchemaError};
pub use json::value_from_json;
pub use primitive::PrimitiveType;
pub use registry::{
    ArrayDescriptor, FieldDescriptor, MessageDescriptor, RegistryDocument, SchemaRegistry,
    ServiceDescriptor,
};
pub use schema::{deserialize, serialize, ArraySchema, Field, MessageSchema, Schema};
pub use service::{
    is_message_type, is_service_type, request_type_name, response_type_name, ServiceSchema,
};
pub use value::Value;
