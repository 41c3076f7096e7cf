use crate::{Error, Value};

use super::{Payload, Serializer};

/// Keeps the body structured; the transport renders it as JSON and sets
/// `application/json` itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, data: &Value) -> Result<Payload, Error> {
        Ok(Payload::Json(data.clone()))
    }

    fn default_content_type(&self) -> Option<&str> {
        None
    }
}
