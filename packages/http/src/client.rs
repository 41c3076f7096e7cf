//! The generic executor for described operations.
//!
//! # Dispatch order
//!
//! ```text
//! registry lookup ─► on_request ─► serialize ─► Content-Type default
//!     ─► transport.send ─► result | ApiError ─► on_response
//! ```
//!
//! A registry miss or a serializer failure is returned before any network
//! activity. Transport failures are always classified into an
//! [`ApiError`] and handed to the interceptor.

use std::sync::Arc;

use restbind_core::serializer::{ArrayFormat, Payload};
use restbind_core::{
    from_value, ApiError, BodyType, CancelHandle, Context, Error, SerializerRegistry, Value,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::interceptor::{DefaultInterceptor, Interceptor};
use crate::operation::Operation;
use crate::transport::Transport;
use crate::types::{query_pairs_with, HttpRequest};

/// Executes [`Operation`]s through a transport.
///
/// Cloning is cheap; clones share the transport, registry and interceptor.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    serializers: Arc<SerializerRegistry>,
    interceptor: Arc<dyn Interceptor>,
    query_array_format: ArrayFormat,
}

impl Client {
    /// Create a client using the process-wide serializer registry.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            serializers: SerializerRegistry::global(),
            interceptor: Arc::new(DefaultInterceptor),
            query_array_format: ArrayFormat::Brackets,
        }
    }

    /// Use a dedicated serializer registry instead of the global one.
    pub fn with_serializers(mut self, serializers: Arc<SerializerRegistry>) -> Self {
        self.serializers = serializers;
        self
    }

    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptor = Arc::new(interceptor);
        self
    }

    /// How array query parameters are keyed. Defaults to `name[]`.
    pub fn with_query_array_format(mut self, array_format: ArrayFormat) -> Self {
        self.query_array_format = array_format;
        self
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn serializers(&self) -> &SerializerRegistry {
        &self.serializers
    }

    /// Build the context for one call of `operation`.
    pub fn bind(&self, operation: &Operation, args: Vec<Value>) -> Context {
        operation.bind(args)
    }

    /// Send a bound context.
    ///
    /// On return the context holds exactly one of `result` or `error`,
    /// unless the body could not be serialized.
    pub async fn dispatch(&self, ctx: &mut Context) -> Result<(), Error> {
        let serializer = self.serializers.get(&ctx.body_type)?;

        self.interceptor.on_request(ctx);

        if ctx.method.is_bodyless() && ctx.body_type == BodyType::JSON {
            warn!(
                method = %ctx.method,
                path = %ctx.path,
                "JSON body type on a bodyless method, sending anyway"
            );
        }

        let payload = if ctx.body.is_empty() {
            Payload::Empty
        } else {
            let payload = serializer.serialize(&Value::Map(ctx.body.clone()))?;
            if let Some(content_type) = serializer.default_content_type() {
                let explicit = ctx
                    .headers
                    .keys()
                    .any(|name| name.eq_ignore_ascii_case("content-type"));
                if !explicit {
                    ctx.headers
                        .insert("Content-Type".to_string(), content_type.to_string());
                }
            }
            payload
        };

        let cancel = ctx.cancel.get_or_insert_with(CancelHandle::new).clone();
        let request = HttpRequest {
            method: ctx.method,
            path: ctx.path.clone(),
            query: query_pairs_with(&ctx.query, self.query_array_format),
            headers: ctx.headers.clone(),
            payload,
            cancel: Some(cancel),
        };

        debug!(
            method = %ctx.method,
            path = %ctx.path,
            body_type = %ctx.body_type,
            "dispatching request"
        );

        match self.transport.send(request).await {
            Ok(response) => {
                debug!(path = %ctx.path, status = response.status, "request succeeded");
                ctx.result = Some(response.body);
                ctx.error = None;
            }
            Err(e) => {
                let error = ApiError::new(ctx, e);
                debug!(path = %ctx.path, kind = %error.kind(), "request failed: {}", error);
                ctx.result = None;
                ctx.error = Some(error);
            }
        }

        self.interceptor.on_response(ctx)
    }

    /// Bind and send one call, returning the response payload.
    pub async fn execute(&self, operation: &Operation, args: Vec<Value>) -> Result<Value, Error> {
        let mut ctx = self.bind(operation, args);
        self.dispatch(&mut ctx).await?;
        Ok(ctx.result.take().unwrap_or_default())
    }

    /// Like [`execute`](Self::execute), with a cancel handle the caller
    /// keeps to abort the call.
    pub async fn execute_with_cancel(
        &self,
        operation: &Operation,
        args: Vec<Value>,
        cancel: CancelHandle,
    ) -> Result<Value, Error> {
        let mut ctx = self.bind(operation, args);
        ctx.cancel = Some(cancel);
        self.dispatch(&mut ctx).await?;
        Ok(ctx.result.take().unwrap_or_default())
    }

    /// Execute and decode the payload into `T`.
    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        operation: &Operation,
        args: Vec<Value>,
    ) -> Result<T, Error> {
        let value = self.execute(operation, args).await?;
        from_value(value)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("serializers", &self.serializers)
            .finish_non_exhaustive()
    }
}
