use crate::convert::value_to_json;
use crate::{Error, Value};

use super::{Payload, Serializer};

/// Renders the body as `text/plain`.
///
/// Strings pass through, `Null` becomes empty, maps and arrays become their
/// JSON text and other scalars are stringified.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSerializer;

impl TextSerializer {
    fn render(data: &Value) -> String {
        match data {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            Value::Map(_) | Value::Array(_) => {
                serde_json::to_string(&value_to_json(data.clone())).unwrap_or_default()
            }
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            other => other.to_plain_string(),
        }
    }
}

impl Serializer for TextSerializer {
    fn serialize(&self, data: &Value) -> Result<Payload, Error> {
        Ok(Payload::Text(Self::render(data)))
    }

    fn default_content_type(&self) -> Option<&str> {
        Some("text/plain")
    }
}
