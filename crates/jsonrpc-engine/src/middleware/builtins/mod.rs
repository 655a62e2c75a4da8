//! Built-in middleware implementations
//!
//! - **Recovery**: turns a panicking handler into an Internal error
//! - **Logging**: per-call span with duration tracking
//!
//! # Examples
//!
//! ```rust,no_run
//! use jsonrpc_engine::prelude::*;
//!
//! let mut builder = JsonRpcServerBuilder::new(Options::default());
//! builder.use_middleware(Recovery);
//! builder.use_middleware(Logging);
//! ```

mod logging;
mod recovery;

pub use logging::Logging;
pub use recovery::Recovery;
