//! # JSON-RPC 2.0 Request Engine
//!
//! A transport-agnostic JSON-RPC 2.0 engine. Raw request bytes go in, a
//! serialized response (or nothing, for notifications) comes out.
//!
//! ## Features
//! - Single-pass envelope scanner: `params` stays an untouched byte span
//!   until the handler asks for it
//! - Case-insensitive method registry, frozen at build time
//! - Middleware composed once per service (`wrap(next) -> handler`)
//! - Global middleware that sees the transport request head once per message
//! - Concurrent batch execution, one task per element
//!
//! ```rust,no_run
//! use jsonrpc_engine::prelude::*;
//!
//! # async fn example() {
//! let mut builder = JsonRpcServerBuilder::new(Options::default());
//! builder.register("sum", handler_fn(|ctx: RequestContext| async move {
//!     let numbers: Vec<i64> = ctx.params()?;
//!     ctx.result(&numbers.iter().sum::<i64>())
//! }));
//! builder.use_middleware(Recovery);
//! let server = builder.build();
//!
//! let body = bytes::Bytes::from_static(br#"{"jsonrpc":"2.0","method":"sum","params":[1,2],"id":1}"#);
//! let (parts, ()) = http::Request::new(()).into_parts();
//! let reply = server.dispatch(std::sync::Arc::new(parts), body).await;
//! assert!(matches!(reply, Reply::Json(_)));
//! # }
//! ```

pub mod batch;
pub mod context;
pub mod error;
mod escape;
mod executor;
pub mod handler;
pub mod middleware;
pub mod prelude;
pub mod request;
pub mod response;
pub mod scanner;
pub mod server;
pub mod service;
pub mod types;

// Re-export main types
pub use context::RequestContext;
pub use error::{JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject};
pub use handler::{Handler, HandlerResult, SharedHandler, handler_fn};
pub use middleware::{GlobalMiddleware, Middleware, middleware_fn};
pub use request::{JsonRpcRequest, RequestError};
pub use response::{JsonRpcMessage, JsonRpcResponse};
pub use server::{JsonRpcServer, JsonRpcServerBuilder, Options, Reply};
pub use service::{RegistrationError, Service};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    /// Batch longer than the configured limit
    pub const MAX_BATCH_EXCEEDED: i64 = -32604;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
