use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::JsonRpcErrorObject;

/// Outcome of one call: a result value, or the error sent back verbatim
pub type HandlerResult = Result<Value, JsonRpcErrorObject>;

/// A handler shared between the chains that wrap it
pub type SharedHandler = Arc<dyn Handler>;

/// Trait for handling JSON-RPC method calls
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, ctx: RequestContext) -> HandlerResult;
}

/// A handler backed by an async closure, see [`handler_fn`]
pub struct HandlerFn<F> {
    f: F,
}

/// Adapt an async closure into a [`Handler`].
///
/// ```rust
/// use jsonrpc_engine::{RequestContext, handler_fn};
///
/// let echo = handler_fn(|ctx: RequestContext| async move {
///     ctx.params::<serde_json::Value>()
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    HandlerFn { f }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, ctx: RequestContext) -> HandlerResult {
        (self.f)(ctx).await
    }
}
