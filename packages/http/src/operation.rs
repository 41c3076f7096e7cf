//! Described operations.
//!
//! An [`Operation`] is the static descriptor of one remote call: its path
//! template, method, body type, declaration-level headers and a table
//! mapping argument positions to the part of the request they feed.
//!
//! ```rust
//! use restbind_http::Operation;
//! use restbind_core::Value;
//!
//! let sugrec = Operation::get("/sugrec").query(0, "wd").query(1, "prod");
//! let ctx = sugrec.bind(vec![Value::from("test"), Value::from("pc")]);
//!
//! assert_eq!(ctx.path, "/sugrec");
//! assert_eq!(ctx.query["wd"], Value::from("test"));
//! assert_eq!(ctx.query["prod"], Value::from("pc"));
//! ```

use std::collections::BTreeMap;

use restbind_core::{BodyType, Context, Method, Value};

use crate::headers::{normalize_header_name, normalize_headers};

/// Name under which a bound value lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Store the whole value under this name.
    Named(String),
    /// Merge the value's keys when it is a map; ignore it otherwise.
    Spread,
}

/// The part of a request an argument feeds.
///
/// A position may carry several roles. They are tried in the order
/// `Field`, `Body`, `Query`, `Path`, `Header` and the first applicable one
/// wins. `Body` only applies to maps, so a non-map argument falls through
/// to the next role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamRole {
    /// `body[name] = value`
    Field(String),
    /// Merge a map argument into the body.
    Body,
    Query(Target),
    Path(Target),
    Header(Target),
}

impl ParamRole {
    fn priority(&self) -> u8 {
        match self {
            ParamRole::Field(_) => 0,
            ParamRole::Body => 1,
            ParamRole::Query(_) => 2,
            ParamRole::Path(_) => 3,
            ParamRole::Header(_) => 4,
        }
    }

    /// Bind `value` into `ctx`. Returns `false` if the role does not apply.
    fn apply(&self, ctx: &mut Context, value: &Value) -> bool {
        match self {
            ParamRole::Field(name) => {
                ctx.body.insert(name.clone(), value.clone());
            }
            ParamRole::Body => match value.as_map() {
                Some(map) => ctx.body.extend(map.iter().map(|(k, v)| (k.clone(), v.clone()))),
                None => return false,
            },
            ParamRole::Query(target) => bind_values(&mut ctx.query, target, value),
            ParamRole::Path(target) => bind_values(&mut ctx.path_params, target, value),
            ParamRole::Header(target) => bind_headers(&mut ctx.headers, target, value),
        }
        true
    }
}

fn bind_values(into: &mut BTreeMap<String, Value>, target: &Target, value: &Value) {
    match target {
        Target::Named(name) => {
            into.insert(name.clone(), value.clone());
        }
        Target::Spread => {
            if let Some(map) = value.as_map() {
                into.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
    }
}

fn bind_headers(into: &mut BTreeMap<String, String>, target: &Target, value: &Value) {
    let mut set = |name: &str, value: &Value| {
        let name = normalize_header_name(name);
        // A null argument clears the declaration default.
        if value.is_null() {
            into.remove(&name);
        } else {
            into.insert(name, value.to_plain_string());
        }
    };
    match target {
        Target::Named(name) => set(name, value),
        Target::Spread => {
            if let Some(map) = value.as_map() {
                for (name, value) in map {
                    set(name, value);
                }
            }
        }
    }
}

/// Static descriptor of a remote call.
#[derive(Debug, Clone)]
pub struct Operation {
    path: String,
    method: Method,
    body_type: BodyType,
    headers: BTreeMap<String, String>,
    roles: BTreeMap<usize, Vec<ParamRole>>,
}

impl Operation {
    /// Describe a call. The body type defaults to JSON for methods that
    /// carry a body (POST, PUT, PATCH) and to form data otherwise.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let body_type = match method {
            Method::POST | Method::PUT | Method::PATCH => BodyType::JSON,
            _ => BodyType::FORM_DATA,
        };
        Self {
            path: path.into(),
            method,
            body_type,
            headers: BTreeMap::new(),
            roles: BTreeMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn with_body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = body_type;
        self
    }

    /// Declaration-level header. Headers bound from arguments override it.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(normalize_header_name(name), value.into());
        self
    }

    /// Declaration-level headers, normalized.
    pub fn with_headers<K, V, I>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.headers.extend(normalize_headers(headers));
        self
    }

    /// Attach a role to the argument at `index`.
    pub fn role(mut self, index: usize, role: ParamRole) -> Self {
        let roles = self.roles.entry(index).or_default();
        roles.push(role);
        roles.sort_by_key(ParamRole::priority);
        self
    }

    /// The argument is stored as the body field `name`.
    pub fn field(self, index: usize, name: &str) -> Self {
        self.role(index, ParamRole::Field(name.to_string()))
    }

    /// The argument's keys are merged into the body.
    pub fn body(self, index: usize) -> Self {
        self.role(index, ParamRole::Body)
    }

    pub fn query(self, index: usize, name: &str) -> Self {
        self.role(index, ParamRole::Query(Target::Named(name.to_string())))
    }

    /// The argument's keys are merged into the query.
    pub fn query_all(self, index: usize) -> Self {
        self.role(index, ParamRole::Query(Target::Spread))
    }

    /// The argument substitutes the `{name}` placeholder of the path.
    pub fn path_param(self, index: usize, name: &str) -> Self {
        self.role(index, ParamRole::Path(Target::Named(name.to_string())))
    }

    pub fn path_params(self, index: usize) -> Self {
        self.role(index, ParamRole::Path(Target::Spread))
    }

    pub fn header(self, index: usize, name: &str) -> Self {
        self.role(index, ParamRole::Header(Target::Named(name.to_string())))
    }

    /// The argument's keys are sent as headers.
    pub fn headers_from(self, index: usize) -> Self {
        self.role(index, ParamRole::Header(Target::Spread))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn body_type(&self) -> &BodyType {
        &self.body_type
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Roles of the argument at `index`, in the order they are tried.
    pub fn roles(&self, index: usize) -> &[ParamRole] {
        self.roles.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Build the request context for one call.
    ///
    /// Arguments without a role are ignored. Path placeholders are
    /// substituted from the bound path parameters.
    pub fn bind(&self, args: Vec<Value>) -> Context {
        let mut ctx = Context::new(self.path.clone(), self.method, self.body_type.clone());
        ctx.headers = self.headers.clone();

        for (index, value) in args.iter().enumerate() {
            for role in self.roles(index) {
                if role.apply(&mut ctx, value) {
                    break;
                }
            }
        }

        ctx.resolve_path();
        ctx
    }
}
