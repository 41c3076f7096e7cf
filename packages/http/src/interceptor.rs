use std::sync::Arc;

use restbind_core::{Context, Error};

/// Hooks run around every dispatched request.
///
/// `on_request` runs after binding, before serialization. `on_response`
/// runs once the context holds either a result or an error; its return
/// value becomes the outcome of the call.
pub trait Interceptor: Send + Sync {
    fn on_request(&self, _ctx: &mut Context) {}

    /// Re-raises the captured error by default. Override to swallow or
    /// translate failures.
    fn on_response(&self, ctx: &mut Context) -> Result<(), Error> {
        match &ctx.error {
            Some(error) => Err(Error::Api(error.clone())),
            None => Ok(()),
        }
    }
}

/// Interceptor with the default hooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInterceptor;

impl Interceptor for DefaultInterceptor {}

impl<T: Interceptor + ?Sized> Interceptor for Arc<T> {
    fn on_request(&self, ctx: &mut Context) {
        (**self).on_request(ctx)
    }

    fn on_response(&self, ctx: &mut Context) -> Result<(), Error> {
        (**self).on_response(ctx)
    }
}
