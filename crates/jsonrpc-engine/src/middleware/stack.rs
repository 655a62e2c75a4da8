//! Chain composition

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::traits::{Middleware, SharedMiddleware};
use crate::context::RequestContext;
use crate::handler::{Handler, HandlerResult, SharedHandler};

/// Build the full call chain for one service.
///
/// Each list is folded from its last entry to its first, so the
/// first-registered middleware ends up outermost within its scope, and the
/// server scope wraps the service scope.
pub fn compose(
    handler: SharedHandler,
    service: &[SharedMiddleware],
    server: &[SharedMiddleware],
) -> SharedHandler {
    let chain = service
        .iter()
        .rev()
        .fold(handler, |next, middleware| middleware.wrap(next));
    server
        .iter()
        .rev()
        .fold(chain, |next, middleware| middleware.wrap(next))
}

/// Middleware backed by an async closure, see [`middleware_fn`]
pub struct MiddlewareFn<F> {
    f: Arc<F>,
}

/// Adapt an `async fn(ctx, next)` closure into a [`Middleware`].
pub fn middleware_fn<F, Fut>(f: F) -> MiddlewareFn<F>
where
    F: Fn(RequestContext, SharedHandler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    MiddlewareFn { f: Arc::new(f) }
}

impl<F, Fut> Middleware for MiddlewareFn<F>
where
    F: Fn(RequestContext, SharedHandler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        Arc::new(Wrapped {
            f: Arc::clone(&self.f),
            next,
        })
    }
}

struct Wrapped<F> {
    f: Arc<F>,
    next: SharedHandler,
}

#[async_trait]
impl<F, Fut> Handler for Wrapped<F>
where
    F: Fn(RequestContext, SharedHandler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, ctx: RequestContext) -> HandlerResult {
        (self.f)(ctx, Arc::clone(&self.next)).await
    }
}
