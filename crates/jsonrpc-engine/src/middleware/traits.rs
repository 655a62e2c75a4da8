//! Core middleware trait definitions

use std::sync::Arc;

use async_trait::async_trait;
use http::request::Parts;

use crate::error::JsonRpcErrorObject;
use crate::handler::SharedHandler;

/// Per-call middleware.
///
/// `wrap` receives the next layer and returns a handler that runs around it.
/// The returned handler may inspect or alter the context, call `next` any
/// number of times (usually once), rewrite the result, or short-circuit with
/// its own error.
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: SharedHandler) -> SharedHandler;
}

pub type SharedMiddleware = Arc<dyn Middleware>;

/// Middleware that runs once per inbound message on the transport request
/// head, before dispatch.
///
/// # Returns
///
/// - `Ok(())`: continue with the next global middleware, then dispatch
/// - `Err(error)`: abort the whole message; the error is sent back in a
///   single envelope with `"id": null`
#[async_trait]
pub trait GlobalMiddleware: Send + Sync {
    async fn before_dispatch(&self, parts: &mut Parts) -> Result<(), JsonRpcErrorObject>;
}

pub type SharedGlobalMiddleware = Arc<dyn GlobalMiddleware>;
