use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::error;

use crate::context::RequestContext;
use crate::error::JsonRpcErrorObject;
use crate::handler::{Handler, HandlerResult, SharedHandler};
use crate::middleware::Middleware;

/// Catches panics from the layers it wraps and answers with Internal error.
///
/// Install it first on the server so it sits outermost. Without it a panic
/// in a single-request handler unwinds into the caller, and a panicking
/// batch element produces no response at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recovery;

impl Middleware for Recovery {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        Arc::new(Recovered { next })
    }
}

struct Recovered {
    next: SharedHandler,
}

#[async_trait]
impl Handler for Recovered {
    async fn call(&self, ctx: RequestContext) -> HandlerResult {
        let method = ctx.method().to_owned();
        match AssertUnwindSafe(self.next.call(ctx)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                error!(method = %method, panic = panic_message(&*payload), "handler panicked");
                Err(JsonRpcErrorObject::internal_error())
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "non-string panic payload"
    }
}
