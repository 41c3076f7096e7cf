//! Body serializers.
//!
//! A serializer is a stateless strategy that turns the bound body of a
//! request into a transport-ready [`Payload`] and declares the
//! `Content-Type` it implies (or none, leaving the choice to the transport).
//!
//! ```text
//! BodyType tag ──► SerializerRegistry::get ──► Serializer::serialize(body)
//!                                              └► default_content_type()
//! ```
//!
//! The five built-in strategies are registered by
//! [`SerializerRegistry::with_defaults`].

mod custom;
mod form_data;
mod json;
mod registry;
mod text;
mod url_encoded;

pub use custom::CustomSerializer;
pub use form_data::{FormDataOptions, FormDataSerializer};
pub use json::JsonSerializer;
pub use registry::SerializerRegistry;
pub use text::TextSerializer;
pub use url_encoded::{UrlEncodedOptions, UrlEncodedSerializer};

use serde::{Deserialize, Serialize};

use crate::{Error, Value};

/// Encodes a request body for the transport.
pub trait Serializer: Send + Sync {
    /// Turn the bound body into a payload.
    fn serialize(&self, data: &Value) -> Result<Payload, Error>;

    /// The `Content-Type` implied by this encoding, or `None` to let the
    /// transport decide (JSON, multipart boundaries, caller-controlled).
    fn default_content_type(&self) -> Option<&str>;
}

/// A serialized request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    /// No body.
    #[default]
    Empty,
    /// Structured value; the transport encodes it as JSON.
    Json(Value),
    /// Multipart form fields in order.
    Form(Vec<FormPart>),
    /// Literal text body.
    Text(String),
    /// Caller-prepared data passed through untouched.
    Raw(Value),
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }
}

/// A single multipart field.
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub field: FormField,
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: FormField::Text(value.into()),
        }
    }

    pub fn blob(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            field: FormField::Blob(data),
        }
    }
}

/// Contents of a multipart field.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text(String),
    Blob(Vec<u8>),
}

/// How array elements are keyed when flattened into form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayFormat {
    /// `key[0]`, `key[1]`, ...
    Indices,
    /// `key[]` for every element.
    Brackets,
    /// The bare `key` repeated.
    Repeat,
}

impl ArrayFormat {
    /// The field name for element `index` of the array under `key`.
    pub fn key(&self, key: &str, index: usize) -> String {
        match self {
            ArrayFormat::Indices => format!("{}[{}]", key, index),
            ArrayFormat::Brackets => format!("{}[]", key),
            ArrayFormat::Repeat => key.to_string(),
        }
    }
}
