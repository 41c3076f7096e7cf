//! restbind core: the data model of a described HTTP call
//!
//! This crate holds everything a described operation needs before it hits
//! the wire:
//! - `Value`: the dynamically-typed argument and body tree
//! - `Context`: the record carrying one call through binding and dispatch
//! - `Serializer`: body encodings keyed by `BodyType` tags
//! - `ApiError`: classified transport failures
//!
//! Transports and the binding engine live in `restbind-http`.
//!
//! # Example
//!
//! ```rust
//! use restbind_core::{BodyType, SerializerRegistry, Value};
//! use restbind_core::serializer::Payload;
//!
//! let registry = SerializerRegistry::with_defaults();
//! let body = Value::from(serde_json::json!({"a": 1, "b": [1, 2]}));
//! let payload = registry.get(&BodyType::FORM_URLENCODED)?.serialize(&body)?;
//! assert_eq!(payload, Payload::Text("a=1&b%5B%5D=1&b%5B%5D=2".to_string()));
//! # Ok::<(), restbind_core::Error>(())
//! ```

mod body_type;
mod classify;
mod context;
pub mod convert;
mod error;
mod method;
pub mod serializer;
mod value;

pub use body_type::BodyType;
pub use classify::{classify, ApiError, Classification, ErrorKind};
pub use context::{CancelHandle, Context, DEFAULT_CANCEL_REASON};
pub use convert::{from_value, to_value};
pub use error::{Error, TransportError};
pub use method::Method;
pub use serializer::{Payload, Serializer, SerializerRegistry};
pub use value::Value;
