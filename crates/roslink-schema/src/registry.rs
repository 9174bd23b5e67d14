use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::primitive::PrimitiveType;
use crate::schema::{Field, Schema};
use crate::service::ServiceSchema;

type Result<T> = std::result::Result<T, RegistryError>;

/// Array shape of a field: `"sequence"` or `{ "fixed": n }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayDescriptor {
    Sequence,
    Fixed(usize),
}

/// One field as produced by an interface-definition parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// Primitive tag, full message type name, or a bare name resolved
    /// within the owning type's package.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array: Option<ArrayDescriptor>,
}

/// A message type's ordered field list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

/// A service type's request and response field lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub request: Vec<FieldDescriptor>,
    #[serde(default)]
    pub response: Vec<FieldDescriptor>,
}

/// A batch of descriptors, in any dependency order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub messages: Vec<MessageDescriptor>,
    #[serde(default)]
    pub services: Vec<ServiceDescriptor>,
}

/// Type-name keyed store of shared schema trees.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    messages: HashMap<String, Arc<Schema>>,
    services: HashMap<String, Arc<ServiceSchema>>,
    config: RegistryConfig,
}

impl SchemaRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            messages: HashMap::new(),
            services: HashMap::new(),
            config,
        }
    }

    /// Register an already-built message schema under its type name.
    pub fn insert_message(&mut self, schema: Arc<Schema>) -> Result<()> {
        let Some(type_name) = schema.type_name().map(str::to_owned) else {
            return Err(RegistryError::NotAMessage);
        };
        self.check_insert(&type_name, self.messages.contains_key(&type_name))?;
        debug!(type_name = %type_name, "registered message schema");
        self.messages.insert(type_name, schema);
        Ok(())
    }

    /// Register an already-built service schema under its type name.
    pub fn insert_service(&mut self, schema: Arc<ServiceSchema>) -> Result<()> {
        let type_name = schema.type_name().to_string();
        self.check_insert(&type_name, self.services.contains_key(&type_name))?;
        debug!(type_name = %type_name, "registered service schema");
        self.services.insert(type_name, schema);
        Ok(())
    }

    /// Build and register a message schema from its descriptor.
    ///
    /// Nested message types must already be registered.
    pub fn register_message(&mut self, descriptor: &MessageDescriptor) -> Result<Arc<Schema>> {
        let fields = self.resolve_fields(&descriptor.type_name, &descriptor.fields)?;
        let schema = Arc::new(Schema::message(&descriptor.type_name, fields)?);
        self.insert_message(Arc::clone(&schema))?;
        Ok(schema)
    }

    /// Build and register a service schema from its descriptor.
    pub fn register_service(
        &mut self,
        descriptor: &ServiceDescriptor,
    ) -> Result<Arc<ServiceSchema>> {
        let request = self.resolve_fields(&descriptor.type_name, &descriptor.request)?;
        let response = self.resolve_fields(&descriptor.type_name, &descriptor.response)?;
        let schema = Arc::new(ServiceSchema::new(
            &descriptor.type_name,
            request,
            response,
        )?);
        self.insert_service(Arc::clone(&schema))?;
        Ok(schema)
    }

    /// Register every type in a document, resolving message dependencies
    /// regardless of the order they appear in.
    pub fn register_document(&mut self, document: &RegistryDocument) -> Result<()> {
        let mut pending: Vec<&MessageDescriptor> = document.messages.iter().collect();
        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            for descriptor in pending {
                match self.register_message(descriptor) {
                    Ok(_) => {}
                    Err(RegistryError::UnknownType { .. }) => deferred.push(descriptor),
                    Err(err) => return Err(err),
                }
            }
            if deferred.len() == before {
                return Err(RegistryError::Unresolved(
                    deferred.iter().map(|d| d.type_name.clone()).collect(),
                ));
            }
            pending = deferred;
        }

        for descriptor in &document.services {
            self.register_service(descriptor)?;
        }
        Ok(())
    }

    /// Load a registry from a JSON [`RegistryDocument`].
    pub fn from_json(document: &str) -> Result<Self> {
        Self::from_json_with_config(document, RegistryConfig::default())
    }

    /// Load a registry from a JSON [`RegistryDocument`] with explicit config.
    pub fn from_json_with_config(document: &str, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        registry.register_document(&serde_json::from_str(document)?)?;
        Ok(registry)
    }

    /// Load from several embedded JSON documents.
    pub fn from_embedded(documents: &[&str]) -> Result<Self> {
        Self::from_embedded_with_config(documents, RegistryConfig::default())
    }

    /// Load from several embedded JSON documents with explicit config.
    ///
    /// With `allow_overwrite`, a type defined again in a later document
    /// replaces the earlier definition.
    pub fn from_embedded_with_config(documents: &[&str], config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        for document in documents {
            registry.register_document(&serde_json::from_str(document)?)?;
        }
        Ok(registry)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Look up a message schema by full type name.
    pub fn message(&self, type_name: &str) -> Option<Arc<Schema>> {
        self.messages.get(type_name).cloned()
    }

    /// Look up a service schema by full type name.
    pub fn service(&self, type_name: &str) -> Option<Arc<ServiceSchema>> {
        self.services.get(type_name).cloned()
    }

    /// Check if a message or service type is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.messages.contains_key(type_name) || self.services.contains_key(type_name)
    }

    /// Number of registered message and service types.
    pub fn len(&self) -> usize {
        self.messages.len() + self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_insert(&self, type_name: &str, exists: bool) -> Result<()> {
        if exists && !self.config.allow_overwrite {
            return Err(RegistryError::AlreadyRegistered(type_name.to_string()));
        }
        if !exists && self.len() >= self.config.max_types {
            return Err(RegistryError::TooManyTypes {
                max: self.config.max_types,
            });
        }
        Ok(())
    }

    fn resolve_fields(&self, owner: &str, fields: &[FieldDescriptor]) -> Result<Vec<Field>> {
        fields
            .iter()
            .map(|field| -> Result<Field> {
                let element = self.resolve_type(owner, field)?;
                let schema = match field.array {
                    None => element,
                    Some(ArrayDescriptor::Sequence) => Arc::new(Schema::sequence(element)),
                    Some(ArrayDescriptor::Fixed(len)) => Arc::new(Schema::fixed_array(element, len)?),
                };
                Ok(Field::new(&field.name, schema))
            })
            .collect()
    }

    fn resolve_type(&self, owner: &str, field: &FieldDescriptor) -> Result<Arc<Schema>> {
        if let Ok(tag) = field.type_name.parse::<PrimitiveType>() {
            return Ok(tag.into());
        }
        if let Some(schema) = self.messages.get(&field.type_name) {
            return Ok(Arc::clone(schema));
        }
        if !field.type_name.contains('/') {
            if let Some((package, _)) = owner.split_once('/') {
                let qualified = format!("{package}/msg/{}", field.type_name);
                if let Some(schema) = self.messages.get(&qualified) {
                    return Ok(Arc::clone(schema));
                }
            }
        }
        Err(RegistryError::UnknownType {
            type_name: field.type_name.clone(),
            field: field.name.clone(),
        })
    }
}
