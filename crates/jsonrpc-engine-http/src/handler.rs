//! HTTP request handler for JSON-RPC messages

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Request, Response, StatusCode};
use http_body::Body;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::{debug, error, warn};

use jsonrpc_engine::{JsonRpcErrorObject, JsonRpcServer, Reply};

use crate::real_ip::ClientAddr;
use crate::{Result, ServerConfig};

/// `Content-Type` of every JSON reply
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Maps HTTP requests onto a [`JsonRpcServer`]
#[derive(Clone)]
pub struct RpcHttpHandler {
    pub(crate) config: Arc<ServerConfig>,
    pub(crate) server: JsonRpcServer,
}

impl RpcHttpHandler {
    pub fn new(config: ServerConfig, server: JsonRpcServer) -> Self {
        Self {
            config: Arc::new(config),
            server,
        }
    }

    /// Handle one HTTP request.
    ///
    /// `peer` is stored in the request extensions as [`ClientAddr`] so
    /// middleware and handlers can see who is calling.
    pub async fn handle<B>(&self, req: Request<B>, peer: Option<SocketAddr>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let (mut parts, body) = req.into_parts();

        if parts.uri.path() != self.config.path {
            debug!(path = parts.uri.path(), "no JSON-RPC endpoint at path");
            return plain(StatusCode::NOT_FOUND, "Not Found");
        }

        if let Err(reply) = self.server.admit(&parts) {
            return reply_response(reply);
        }

        if let Some(peer) = peer {
            parts.extensions.insert(ClientAddr(peer.ip()));
        }

        let body = match Limited::new(body, self.config.max_body_size).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                warn!(limit = self.config.max_body_size, "request body too large");
                return plain(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
            }
            Err(err) => {
                error!(error = %err, "failed to read request body");
                return reply_response(Reply::envelope_error(JsonRpcErrorObject::internal_error()));
            }
        };

        reply_response(self.server.handle_message(parts, body).await)
    }

    /// Serve every request on one accepted connection
    pub async fn serve_connection(self, stream: TcpStream, peer: SocketAddr) -> Result<()> {
        let io = TokioIo::new(stream);
        let service = service_fn(move |req: Request<Incoming>| {
            let handler = self.clone();
            async move { Ok::<_, Infallible>(handler.handle(req, Some(peer)).await) }
        });

        http1::Builder::new().serve_connection(io, service).await?;
        Ok(())
    }
}

/// Turn a [`Reply`] into an HTTP response
pub fn reply_response(reply: Reply) -> Response<Full<Bytes>> {
    let status = reply.status();
    let mut response = match reply {
        Reply::Json(body) => {
            let mut response = Response::new(Full::new(body));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
            response
        }
        _ => Response::new(Full::new(Bytes::new())),
    };
    *response.status_mut() = status;
    response
}

fn plain(status: StatusCode, message: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(message.as_bytes())));
    *response.status_mut() = status;
    response
}
