use crate::{Error, Value};

use super::{Payload, Serializer};

/// Passes data through untouched and declares no content type, leaving
/// every header to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomSerializer;

impl Serializer for CustomSerializer {
    fn serialize(&self, data: &Value) -> Result<Payload, Error> {
        Ok(Payload::Raw(data.clone()))
    }

    fn default_content_type(&self) -> Option<&str> {
        None
    }
}
