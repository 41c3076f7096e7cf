use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP method of a described operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
}

impl Method {
    /// Methods whose requests conventionally carry no body.
    pub fn is_bodyless(&self) -> bool {
        matches!(self, Method::GET | Method::HEAD)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => http::Method::GET,
            Method::POST => http::Method::POST,
            Method::PUT => http::Method::PUT,
            Method::DELETE => http::Method::DELETE,
            Method::PATCH => http::Method::PATCH,
            Method::HEAD => http::Method::HEAD,
            Method::OPTIONS => http::Method::OPTIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bodyless_methods() {
        assert!(Method::GET.is_bodyless());
        assert!(Method::HEAD.is_bodyless());
        assert!(!Method::POST.is_bodyless());
        assert!(!Method::DELETE.is_bodyless());
    }

    #[test]
    fn converts_to_http_method() {
        assert_eq!(http::Method::from(Method::PATCH), http::Method::PATCH);
        assert_eq!(Method::OPTIONS.to_string(), "OPTIONS");
    }

    #[test]
    fn serde_uses_uppercase() {
        let json = serde_json::to_string(&Method::DELETE).unwrap();
        assert_eq!(json, "\"DELETE\"");
    }
}
