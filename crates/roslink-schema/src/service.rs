use std::sync::Arc;

use crate::error::Result;
use crate::schema::{Field, Schema};

const REQUEST_SUFFIX: &str = "_Request";
const RESPONSE_SUFFIX: &str = "_Response";

/// Request and response message schemas of one service type.
///
/// Not a wire node itself; each half is serialized independently.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSchema {
    type_name: String,
    request: Arc<Schema>,
    response: Arc<Schema>,
}

impl ServiceSchema {
    /// Build a service schema; message names derive from `type_name`.
    pub fn new(
        type_name: impl Into<String>,
        request_fields: impl IntoIterator<Item = Field>,
        response_fields: impl IntoIterator<Item = Field>,
    ) -> Result<Self> {
        let type_name = type_name.into();
        let request = Schema::message(request_type_name(&type_name), request_fields)?;
        let response = Schema::message(response_type_name(&type_name), response_fields)?;
        Ok(Self {
            type_name,
            request: Arc::new(request),
            response: Arc::new(response),
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn request(&self) -> &Arc<Schema> {
        &self.request
    }

    pub fn response(&self) -> &Arc<Schema> {
        &self.response
    }
}

/// `<service>_Request`
pub fn request_type_name(service_type: &str) -> String {
    format!("{service_type}{REQUEST_SUFFIX}")
}

/// `<service>_Response`
pub fn response_type_name(service_type: &str) -> String {
    format!("{service_type}{RESPONSE_SUFFIX}")
}

/// True for names shaped like `<package>/msg/<Name>`.
pub fn is_message_type(type_name: &str) -> bool {
    has_kind(type_name, "msg")
}

/// True for names shaped like `<package>/srv/<Name>`.
pub fn is_service_type(type_name: &str) -> bool {
    has_kind(type_name, "srv")
}

fn has_kind(type_name: &str, kind: &str) -> bool {
    let mut parts = type_name.split('/');
    matches!(
        (parts.next(), parts.next(), parts.next(), parts.next()),
        (Some(package), Some(k), Some(name), None)
            if !package.is_empty() && k == kind && !name.is_empty()
    )
}
