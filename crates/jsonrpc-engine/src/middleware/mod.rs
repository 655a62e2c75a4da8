//! Middleware system
//!
//! Two kinds of middleware exist:
//! - [`Middleware`] wraps a [`Handler`](crate::Handler) and runs around every
//!   call. It is registered either on the server (applies to every service)
//!   or on one service.
//! - [`GlobalMiddleware`] runs once per inbound message, before any request
//!   in it is parsed, and sees the transport request head.
//!
//! Chains are composed once when the server is built. For a call, execution
//! order is server middleware in registration order, then service middleware
//! in registration order, then the handler.
//!
//! # Examples
//!
//! ```rust,no_run
//! use jsonrpc_engine::prelude::*;
//!
//! let auth = middleware_fn(|ctx: RequestContext, next: SharedHandler| async move {
//!     if ctx.transport().headers.get("authorization").is_none() {
//!         return Err(JsonRpcErrorObject::server_error(-32001, "Unauthorized", None));
//!     }
//!     next.call(ctx).await
//! });
//!
//! let mut builder = JsonRpcServerBuilder::new(Options::default());
//! builder.use_middleware(auth);
//! ```

pub mod builtins;
pub mod stack;
pub mod traits;

pub use stack::{MiddlewareFn, compose, middleware_fn};
pub use traits::{GlobalMiddleware, Middleware, SharedGlobalMiddleware, SharedMiddleware};
