//! # restbind-http
//!
//! Declarative HTTP operations over a pluggable transport.
//!
//! An [`Operation`] describes one remote call: path template, method, body
//! type and which request part each argument feeds. A [`Client`] binds the
//! arguments into a [`Context`], serializes the body and sends it through a
//! [`Transport`].
//!
//! ## Example
//!
//! ```no_run
//! use restbind_http::{Client, Operation, ReqwestTransport};
//! use restbind_core::Value;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = ReqwestTransport::with_default_timeout()?
//!     .with_base_url("https://www.baidu.com")?;
//! let client = Client::new(transport);
//!
//! let sugrec = Operation::get("/sugrec").query(0, "wd").query(1, "prod");
//! let suggestions = client
//!     .execute(&sugrec, vec![Value::from("test"), Value::from("pc")])
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! With the `test-utils` feature, [`transport::mock::MockTransport`]
//! answers requests from canned responses and records what it was sent.

mod client;
mod error;
pub mod headers;
mod interceptor;
mod operation;
pub mod transport;
mod types;

pub use client::Client;
pub use error::BuildError;
pub use interceptor::{DefaultInterceptor, Interceptor};
pub use operation::{Operation, ParamRole, Target};
pub use transport::{ReqwestTransport, Transport};
pub use types::{parse_body, query_pairs, query_pairs_with, HttpRequest, HttpResponse};

pub use restbind_core::{
    ApiError, BodyType, CancelHandle, Context, Error, ErrorKind, Method, TransportError, Value,
};
