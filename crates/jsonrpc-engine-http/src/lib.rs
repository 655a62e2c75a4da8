//! # HTTP JSON-RPC Server
//!
//! Default HTTP transport for [`jsonrpc_engine`]. One POST endpoint, served
//! with hyper over HTTP/1.1.
//!
//! ## Status codes
//! - `200` for every processed message, including JSON-RPC errors
//! - `404` outside the configured path
//! - `405` for anything but POST
//! - `413` when the body exceeds `max_body_size`
//! - `415` for a mismatched `Content-Type`
//! - `500` only when the response itself cannot be serialized
//!
//! ```rust,no_run
//! use jsonrpc_engine::prelude::*;
//! use jsonrpc_engine_http::{HttpRpcServer, RealIp};
//!
//! # async fn example() -> jsonrpc_engine_http::Result<()> {
//! let mut builder = JsonRpcServerBuilder::new(Options::default());
//! builder.register("ping", handler_fn(|ctx: RequestContext| async move { ctx.result("pong") }));
//! builder.use_global(RealIp);
//!
//! HttpRpcServer::builder(builder.build())
//!     .bind_address("0.0.0.0:3000".parse().unwrap())
//!     .build()
//!     .run()
//!     .await
//! # }
//! ```

pub mod handler;
pub mod real_ip;
pub mod server;

#[cfg(test)]
mod tests;

// Re-export main types
pub use handler::{JSON_CONTENT_TYPE, RpcHttpHandler};
pub use real_ip::{ClientAddr, RealIp};
pub use server::{HttpRpcServer, HttpRpcServerBuilder, ServerConfig};

/// Result type for HTTP transport operations
pub type Result<T> = std::result::Result<T, HttpRpcError>;

/// HTTP transport errors
#[derive(Debug, thiserror::Error)]
pub enum HttpRpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
