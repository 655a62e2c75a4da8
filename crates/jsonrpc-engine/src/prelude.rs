//! # JSON-RPC Engine Prelude
//!
//! Convenient re-exports of the types most services need.
//!
//! ```rust
//! use jsonrpc_engine::prelude::*;
//! ```

pub use crate::context::RequestContext;
pub use crate::error::{JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject};
pub use crate::handler::{Handler, HandlerResult, SharedHandler, handler_fn};
pub use crate::middleware::builtins::{Logging, Recovery};
pub use crate::middleware::{GlobalMiddleware, Middleware, middleware_fn};
pub use crate::response::{JsonRpcMessage, JsonRpcResponse};
pub use crate::server::{JsonRpcServer, JsonRpcServerBuilder, Options, Reply};
pub use crate::types::{JsonRpcVersion, RequestId};

// Standard error codes
pub use crate::error_codes::*;
