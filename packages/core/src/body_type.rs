//! Body-type tags.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Selects which serializer encodes an operation's body.
///
/// This is a strategy tag, not an HTTP `Content-Type`: each serializer
/// declares its own default content type, and explicit headers always win
/// over that default.
///
/// Custom tags can be registered alongside the built-in ones with
/// [`BodyType::new`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyType(pub Cow<'static, str>);

impl BodyType {
    /// Structured JSON body, encoded by the transport.
    pub const JSON: BodyType = BodyType(Cow::Borrowed("json"));

    /// Multipart form; the transport chooses the boundary.
    pub const FORM_DATA: BodyType = BodyType(Cow::Borrowed("form-data"));

    /// `application/x-www-form-urlencoded` text.
    pub const FORM_URLENCODED: BodyType = BodyType(Cow::Borrowed("form-urlencoded"));

    /// `text/plain` body.
    pub const TEXT: BodyType = BodyType(Cow::Borrowed("text"));

    /// Passed through untouched; the caller controls every header.
    pub const CUSTOM: BodyType = BodyType(Cow::Borrowed("custom"));

    /// Create a tag from a static string.
    pub const fn from_static(s: &'static str) -> Self {
        BodyType(Cow::Borrowed(s))
    }

    /// Create a tag from an owned string.
    pub fn new(s: impl Into<String>) -> Self {
        BodyType(Cow::Owned(s.into()))
    }

    /// Get the tag string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Default for BodyType {
    fn default() -> Self {
        Self::JSON
    }
}

impl From<&'static str> for BodyType {
    fn from(s: &'static str) -> Self {
        BodyType::from_static(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_and_borrowed_tags_compare_equal() {
        assert_eq!(BodyType::new("json"), BodyType::JSON);
        assert_ne!(BodyType::TEXT, BodyType::CUSTOM);
    }

    #[test]
    fn display_is_the_tag() {
        assert_eq!(BodyType::FORM_URLENCODED.to_string(), "form-urlencoded");
    }
}
