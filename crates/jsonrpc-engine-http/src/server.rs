//! HTTP JSON-RPC server

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{debug, error, info};

use jsonrpc_engine::JsonRpcServer;

use crate::{HttpRpcError, Result, RpcHttpHandler};

/// Configuration for the HTTP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Path of the JSON-RPC endpoint
    pub path: String,
    /// Maximum request body size
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8000)),
            path: "/rpc".to_string(),
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Builder for [`HttpRpcServer`]
pub struct HttpRpcServerBuilder {
    config: ServerConfig,
    server: JsonRpcServer,
}

impl HttpRpcServerBuilder {
    pub fn new(server: JsonRpcServer) -> Self {
        Self {
            config: ServerConfig::default(),
            server,
        }
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Set the JSON-RPC endpoint path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> HttpRpcServer {
        HttpRpcServer {
            handler: RpcHttpHandler::new(self.config, self.server),
        }
    }
}

/// HTTP/1.1 server for one JSON-RPC endpoint
#[derive(Clone)]
pub struct HttpRpcServer {
    handler: RpcHttpHandler,
}

impl HttpRpcServer {
    pub fn builder(server: JsonRpcServer) -> HttpRpcServerBuilder {
        HttpRpcServerBuilder::new(server)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.handler.config
    }

    pub fn handler(&self) -> &RpcHttpHandler {
        &self.handler
    }

    /// Bind the configured address and serve until an accept error
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config().bind_address).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener, one task per connection
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        info!(
            address = %listener.local_addr()?,
            path = %self.config().path,
            methods = ?self.handler.server.methods(),
            "JSON-RPC HTTP server listening"
        );

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            debug!(peer = %peer_addr, "new connection");

            let handler = self.handler.clone();
            tokio::spawn(async move {
                match handler.serve_connection(stream, peer_addr).await {
                    Ok(()) => {}
                    // client went away mid-request
                    Err(HttpRpcError::Http(err)) if err.is_incomplete_message() => {
                        debug!(peer = %peer_addr, "client disconnected: {}", err);
                    }
                    Err(err) => error!(peer = %peer_addr, "error serving connection: {}", err),
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpc_engine::{JsonRpcServerBuilder, Options};

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8000");
        assert_eq!(config.path, "/rpc");
        assert_eq!(config.max_body_size, 1024 * 1024);
    }

    #[test]
    fn test_builder() {
        let addr: SocketAddr = "0.0.0.0:3000".parse().unwrap();
        let server = HttpRpcServer::builder(JsonRpcServerBuilder::new(Options::default()).build())
            .bind_address(addr)
            .path("/api/rpc")
            .max_body_size(2048)
            .build();

        assert_eq!(server.config().bind_address, addr);
        assert_eq!(server.config().path, "/api/rpc");
        assert_eq!(server.config().max_body_size, 2048);
    }
}
