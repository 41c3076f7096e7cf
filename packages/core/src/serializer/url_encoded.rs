use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::{Error, Value};

use super::{ArrayFormat, Payload, Serializer};

/// Options for [`UrlEncodedSerializer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UrlEncodedOptions {
    /// How array elements are keyed.
    pub array_format: ArrayFormat,
    /// Emit `key=` for `Null` instead of skipping it.
    pub allow_null: bool,
}

impl Default for UrlEncodedOptions {
    fn default() -> Self {
        Self {
            array_format: ArrayFormat::Brackets,
            allow_null: false,
        }
    }
}

/// Encodes a map as `application/x-www-form-urlencoded` text.
///
/// Nested maps flatten as `key[sub]=value`. Anything that is not a map
/// encodes to the empty string.
#[derive(Debug, Clone, Default)]
pub struct UrlEncodedSerializer {
    options: UrlEncodedOptions,
}

impl UrlEncodedSerializer {
    pub fn new(options: UrlEncodedOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &UrlEncodedOptions {
        &self.options
    }

    /// Encode `data` into a query-string style body.
    pub fn encode(&self, data: &Value) -> String {
        let Some(map) = data.as_map() else {
            return String::new();
        };

        let mut pairs = Vec::new();
        for (key, value) in map {
            self.append(&mut pairs, key.clone(), value);
        }

        let mut encoder = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &pairs {
            encoder.append_pair(key, value);
        }
        encoder.finish()
    }

    fn append(&self, pairs: &mut Vec<(String, String)>, key: String, value: &Value) {
        match value {
            Value::Null => {
                if self.options.allow_null {
                    pairs.push((key, String::new()));
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    let item_key = self.options.array_format.key(&key, index);
                    if !item.is_null() {
                        pairs.push((item_key, item.to_plain_string()));
                    } else if self.options.allow_null {
                        pairs.push((item_key, String::new()));
                    }
                }
            }
            Value::Map(map) => {
                for (sub_key, sub_value) in map {
                    self.append(pairs, format!("{}[{}]", key, sub_key), sub_value);
                }
            }
            other => pairs.push((key, other.to_plain_string())),
        }
    }
}

impl Serializer for UrlEncodedSerializer {
    fn serialize(&self, data: &Value) -> Result<Payload, Error> {
        Ok(Payload::Text(self.encode(data)))
    }

    fn default_content_type(&self) -> Option<&str> {
        Some("application/x-www-form-urlencoded")
    }
}
