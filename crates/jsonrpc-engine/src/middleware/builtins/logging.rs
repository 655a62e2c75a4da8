use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{Instrument, debug, debug_span, warn};

use crate::context::RequestContext;
use crate::handler::{Handler, HandlerResult, SharedHandler};
use crate::middleware::Middleware;

/// Request/response logging with duration tracking
#[derive(Debug, Clone, Copy, Default)]
pub struct Logging;

impl Middleware for Logging {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        Arc::new(Logged { next })
    }
}

struct Logged {
    next: SharedHandler,
}

#[async_trait]
impl Handler for Logged {
    async fn call(&self, ctx: RequestContext) -> HandlerResult {
        let span = debug_span!(
            "rpc",
            method = %ctx.method(),
            id = ctx.id().map(|id| id.as_raw()),
        );
        let start = Instant::now();

        let result = self.next.call(ctx).instrument(span.clone()).await;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        span.in_scope(|| match &result {
            Ok(_) => debug!(elapsed_ms, "call completed"),
            Err(e) => warn!(code = e.code, error = %e.message, elapsed_ms, "call failed"),
        });
        result
    }
}
