//! HTTP Transport Tests
//!
//! - status code mapping for transport rejections
//! - body size limit and unreadable bodies
//! - client address propagation through `ClientAddr` and `RealIp`
//! - a full round trip over TCP with reqwest

use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Request, Response, StatusCode};
use http_body::Frame;
use http_body_util::{BodyExt, Full};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use jsonrpc_engine::prelude::*;

use crate::handler::JSON_CONTENT_TYPE;
use crate::{ClientAddr, HttpRpcServer, RealIp, RpcHttpHandler, ServerConfig};

fn rpc_server() -> JsonRpcServer {
    let mut builder = JsonRpcServerBuilder::new(Options::default());
    builder.register(
        "sum",
        handler_fn(|ctx: RequestContext| async move {
            let numbers: Vec<i64> = ctx.params()?;
            ctx.result(&numbers.iter().sum::<i64>())
        }),
    );
    builder.register(
        "whoami",
        handler_fn(|ctx: RequestContext| async move {
            let ip = ClientAddr::from_context(&ctx).map(|ip| ip.to_string());
            ctx.result(&ip)
        }),
    );
    builder.use_global(RealIp);
    builder.use_middleware(Recovery);
    builder.build()
}

fn handler(config: ServerConfig) -> RpcHttpHandler {
    RpcHttpHandler::new(config, rpc_server())
}

fn request(method: Method, path: &str, content_type: &str, body: &'static str) -> Request<Full<Bytes>> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(CONTENT_TYPE, content_type)
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

async fn body_bytes(response: Response<Full<Bytes>>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn body_json(response: Response<Full<Bytes>>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_json_rpc_request_handling() {
    let handler = handler(ServerConfig::default());
    let response = handler
        .handle(
            request(
                Method::POST,
                "/rpc",
                "application/json",
                r#"{"jsonrpc":"2.0","method":"sum","params":[1,2,3,4],"id":1}"#,
            ),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        JSON_CONTENT_TYPE
    );
    assert_eq!(
        body_json(response).await,
        json!({"jsonrpc": "2.0", "id": 1, "result": 10})
    );
}

#[tokio::test]
async fn test_notification_has_empty_body() {
    let handler = handler(ServerConfig::default());
    let response = handler
        .handle(
            request(
                Method::POST,
                "/rpc",
                "application/json",
                r#"{"jsonrpc":"2.0","method":"sum","params":[1]}"#,
            ),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(CONTENT_TYPE).is_none());
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_transport_rejections() {
    let handler = handler(ServerConfig::default());

    let response = handler
        .handle(request(Method::GET, "/rpc", "application/json", ""), None)
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(body_bytes(response).await.is_empty());

    let response = handler
        .handle(request(Method::POST, "/rpc", "text/plain", "{}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let response = handler
        .handle(request(Method::POST, "/other", "application/json", "{}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_json_rpc_errors_are_200() {
    let handler = handler(ServerConfig::default());
    let response = handler
        .handle(
            request(
                Method::POST,
                "/rpc",
                "application/json",
                r#"{"jsonrpc": "2.0", "method": "foobar, "params": "bar", "baz]"#,
            ),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "Parse error"}})
    );
}

#[tokio::test]
async fn test_body_size_limit() {
    let handler = handler(ServerConfig {
        max_body_size: 16,
        ..ServerConfig::default()
    });
    let response = handler
        .handle(
            request(
                Method::POST,
                "/rpc",
                "application/json",
                r#"{"jsonrpc":"2.0","method":"sum","params":[1,2,3,4],"id":1}"#,
            ),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

/// Body that yields one data frame and then fails
struct FailingBody {
    sent: bool,
}

impl http_body::Body for FailingBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        if !self.sent {
            self.sent = true;
            return Poll::Ready(Some(Ok(Frame::data(Bytes::from_static(b"{\"jsonrpc\"")))));
        }
        Poll::Ready(Some(Err(std::io::Error::other("connection reset"))))
    }
}

#[tokio::test]
async fn test_unreadable_body_is_internal_error() {
    let handler = handler(ServerConfig::default());
    let req = Request::builder()
        .method(Method::POST)
        .uri("/rpc")
        .header(CONTENT_TYPE, "application/json")
        .body(FailingBody { sent: false })
        .unwrap();

    let response = handler.handle(req, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32603, "message": "Internal error"}})
    );
}

#[tokio::test]
async fn test_peer_address_reaches_handler() {
    let handler = handler(ServerConfig::default());
    let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();

    let response = handler
        .handle(
            request(
                Method::POST,
                "/rpc",
                "application/json",
                r#"{"jsonrpc":"2.0","method":"whoami","id":1}"#,
            ),
            Some(peer),
        )
        .await;
    assert_eq!(body_json(response).await["result"], json!("192.0.2.10"));

    let mut forwarded = request(
        Method::POST,
        "/rpc",
        "application/json",
        r#"{"jsonrpc":"2.0","method":"whoami","id":1}"#,
    );
    forwarded
        .headers_mut()
        .insert("x-forwarded-for", "203.0.113.5, 10.0.0.2".parse().unwrap());
    let response = handler.handle(forwarded, Some(peer)).await;
    assert_eq!(body_json(response).await["result"], json!("203.0.113.5"));
}

#[tokio::test]
async fn test_loopback_round_trip() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpRpcServer::builder(rpc_server()).bind_address(addr).build();
    let serving = tokio::spawn(async move { server.serve(listener).await });

    let client = reqwest::Client::new();
    let url = format!("http://{addr}/rpc");

    let response = client
        .post(&url)
        .json(&json!([
            {"jsonrpc": "2.0", "method": "sum", "params": [1, 2, 3, 4], "id": 1},
            {"jsonrpc": "2.0", "method": "sum", "params": [1, 2], "id": 2},
            {"jsonrpc": "2.0", "method": "sum", "params": [7]}
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let mut responses: Vec<Value> = response.json().await.unwrap();
    responses.sort_by_key(|item| item["id"].as_i64());
    assert_eq!(
        responses,
        vec![
            json!({"jsonrpc": "2.0", "id": 1, "result": 10}),
            json!({"jsonrpc": "2.0", "id": 2, "result": 3}),
        ]
    );

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);

    serving.abort();
}
