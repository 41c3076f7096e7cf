use serde::{Deserialize, Serialize};

use crate::{BodyType, Error, Value};

use super::{ArrayFormat, FormPart, Payload, Serializer};

/// Options for [`FormDataSerializer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormDataOptions {
    /// How array elements are keyed.
    pub array_format: ArrayFormat,
    /// Emit an empty field for `Null` instead of skipping it.
    pub allow_null: bool,
    /// Flatten nested maps into dot-joined keys (`user.name`). When off,
    /// nested maps are sent as their JSON text.
    pub nested: bool,
}

impl Default for FormDataOptions {
    fn default() -> Self {
        Self {
            array_format: ArrayFormat::Indices,
            allow_null: false,
            nested: true,
        }
    }
}

/// Flattens a map into multipart form fields.
///
/// Binary values are passed through as blob parts; the transport chooses
/// the boundary, so no content type is declared.
#[derive(Debug, Clone, Default)]
pub struct FormDataSerializer {
    options: FormDataOptions,
}

impl FormDataSerializer {
    pub fn new(options: FormDataOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormDataOptions {
        &self.options
    }

    fn append(&self, parts: &mut Vec<FormPart>, key: String, value: &Value) {
        match value {
            Value::Null => {
                if self.options.allow_null {
                    parts.push(FormPart::text(key, ""));
                }
            }
            Value::Bytes(data) => parts.push(FormPart::blob(key, data.clone())),
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    match item {
                        // Files inside arrays keep the bare key.
                        Value::Bytes(data) => parts.push(FormPart::blob(key.clone(), data.clone())),
                        _ => self.append(parts, self.options.array_format.key(&key, index), item),
                    }
                }
            }
            Value::Map(map) if self.options.nested => {
                for (sub_key, sub_value) in map {
                    self.append(parts, format!("{}.{}", key, sub_key), sub_value);
                }
            }
            other => parts.push(FormPart::text(key, other.to_plain_string())),
        }
    }
}

impl Serializer for FormDataSerializer {
    fn serialize(&self, data: &Value) -> Result<Payload, Error> {
        let map = data.as_map().ok_or_else(|| Error::Serialize {
            body_type: BodyType::FORM_DATA,
            message: "form data requires a map body".to_string(),
        })?;

        let mut parts = Vec::new();
        for (key, value) in map {
            self.append(&mut parts, key.clone(), value);
        }
        Ok(Payload::Form(parts))
    }

    fn default_content_type(&self) -> Option<&str> {
        None
    }
}
