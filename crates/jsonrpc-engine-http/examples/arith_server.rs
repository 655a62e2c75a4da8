//! Arithmetic JSON-RPC server
//!
//! ```bash
//! cargo run --example arith_server -- --bind 127.0.0.1:8000
//!
//! curl -s http://127.0.0.1:8000/rpc -H 'Content-Type: application/json' \
//!   -d '[{"jsonrpc":"2.0","method":"sum","params":[1,2,3],"id":1},
//!        {"jsonrpc":"2.0","method":"div","params":[10,4],"id":2}]'
//! ```

use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tracing::info;

use jsonrpc_engine::prelude::*;
use jsonrpc_engine_http::{HttpRpcServer, RealIp};

#[derive(Parser, Debug)]
#[command(name = "arith_server", about = "JSON-RPC 2.0 arithmetic server")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Maximum number of requests in one batch
    #[arg(long)]
    batch_max_len: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut options = Options::default();
    if let Some(len) = args.batch_max_len {
        options = options.with_batch_max_len(len);
    }

    let mut builder = JsonRpcServerBuilder::new(options);
    builder.register(
        "sum",
        handler_fn(|ctx: RequestContext| async move {
            let numbers: Vec<i64> = ctx.params()?;
            ctx.result(&numbers.iter().sum::<i64>())
        }),
    );
    builder.register(
        "div",
        handler_fn(|ctx: RequestContext| async move {
            let [dividend, divisor]: [f64; 2] = ctx.params()?;
            if divisor == 0.0 {
                return Err(JsonRpcErrorObject::invalid_params()
                    .with_data(json!({"reason": "division by zero"})));
            }
            ctx.result(&(dividend / divisor))
        }),
    );
    builder
        .use_global(RealIp)
        .use_middleware(Recovery)
        .use_middleware(Logging);

    let rpc = builder.build();
    info!(methods = ?rpc.methods(), batch_max_len = rpc.options().batch_max_len, "arith server ready");

    HttpRpcServer::builder(rpc)
        .bind_address(args.bind)
        .path("/rpc")
        .build()
        .run()
        .await?;

    Ok(())
}
