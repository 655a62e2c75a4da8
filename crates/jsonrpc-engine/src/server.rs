//! Server builder, frozen server and message dispatch

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::request::Parts;
use http::{Method, StatusCode, header};
use tracing::{debug, error, warn};

use crate::batch;
use crate::context::RequestContext;
use crate::error::{JsonRpcError, JsonRpcErrorObject};
use crate::executor::execute_batch;
use crate::handler::{Handler, SharedHandler};
use crate::middleware::{
    GlobalMiddleware, Middleware, SharedGlobalMiddleware, SharedMiddleware, compose,
};
use crate::request::JsonRpcRequest;
use crate::response::{JsonRpcMessage, encode_error, encode_replies};
use crate::scanner::is_whitespace;
use crate::service::{RegistrationError, Service, ServiceRegistry};

/// Default cap on the number of requests in one batch
pub const DEFAULT_BATCH_MAX_LEN: usize = 10;

/// Default expected request content type
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Server options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Largest batch that is dispatched; longer ones are rejected whole
    pub batch_max_len: usize,
    /// Required prefix of the request `Content-Type` header
    pub content_type: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            batch_max_len: DEFAULT_BATCH_MAX_LEN,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

impl Options {
    pub fn with_batch_max_len(mut self, batch_max_len: usize) -> Self {
        self.batch_max_len = batch_max_len;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Zero or empty values mean "unset" and fall back to the defaults
    fn normalized(mut self) -> Self {
        if self.batch_max_len == 0 {
            self.batch_max_len = DEFAULT_BATCH_MAX_LEN;
        }
        if self.content_type.is_empty() {
            self.content_type = DEFAULT_CONTENT_TYPE.to_string();
        }
        self
    }
}

/// Transport-neutral outcome of one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The request verb was not POST; no body
    MethodNotAllowed,
    /// The content type did not match; no body
    UnsupportedMediaType,
    /// Every request was a notification
    NoContent,
    /// A serialized response, single object or array
    Json(Bytes),
    /// The response could not be serialized
    SerializationFailed,
}

impl Reply {
    pub fn status(&self) -> StatusCode {
        match self {
            Reply::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Reply::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Reply::NoContent | Reply::Json(_) => StatusCode::OK,
            Reply::SerializationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Reply::Json(body) => Some(body),
            _ => None,
        }
    }

    /// Single error envelope with `"id": null`
    pub fn envelope_error(error: JsonRpcErrorObject) -> Self {
        match encode_error(&JsonRpcError::envelope(error)) {
            Ok(body) => Reply::Json(body),
            Err(e) => {
                error!(error = %e, "failed to serialize error envelope");
                Reply::SerializationFailed
            }
        }
    }

    fn from_messages(messages: &[JsonRpcMessage]) -> Self {
        match encode_replies(messages) {
            Ok(Some(body)) => Reply::Json(body),
            Ok(None) => Reply::NoContent,
            Err(e) => {
                error!(error = %e, "failed to serialize response");
                Reply::SerializationFailed
            }
        }
    }
}

/// Collects services and middleware during startup.
///
/// ```rust
/// use jsonrpc_engine::prelude::*;
///
/// let mut builder = JsonRpcServerBuilder::new(Options::default());
/// builder
///     .register("ping", handler_fn(|ctx: RequestContext| async move { ctx.result("pong") }))
///     .use_middleware(Logging);
/// builder.use_middleware(Recovery);
///
/// let server = builder.build();
/// assert!(server.has_method("PING"));
/// ```
pub struct JsonRpcServerBuilder {
    options: Options,
    registry: ServiceRegistry,
    middlewares: Vec<SharedMiddleware>,
    globals: Vec<SharedGlobalMiddleware>,
}

impl Default for JsonRpcServerBuilder {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl JsonRpcServerBuilder {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            registry: ServiceRegistry::new(),
            middlewares: Vec::new(),
            globals: Vec::new(),
        }
    }

    /// Register a method.
    ///
    /// # Panics
    ///
    /// On an empty or already registered name. Registration happens once at
    /// startup, so this is treated as a programming error; use
    /// [`try_register`](Self::try_register) to handle it instead.
    pub fn register<H: Handler + 'static>(&mut self, name: &str, handler: H) -> &mut Service {
        match self.registry.register(name, Arc::new(handler)) {
            Ok(service) => service,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_register<H: Handler + 'static>(
        &mut self,
        name: &str,
        handler: H,
    ) -> Result<&mut Service, RegistrationError> {
        self.registry.register(name, Arc::new(handler))
    }

    /// Add middleware that wraps every service
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Add middleware that runs once per inbound message
    pub fn use_global<G: GlobalMiddleware + 'static>(&mut self, middleware: G) -> &mut Self {
        self.globals.push(Arc::new(middleware));
        self
    }

    /// Compose every chain and freeze the registry
    pub fn build(self) -> JsonRpcServer {
        let options = self.options.normalized();
        let server_middlewares = self.middlewares;

        let routes: HashMap<String, Route> = self
            .registry
            .into_services()
            .map(|service| {
                let chain = compose(
                    Arc::clone(service.handler()),
                    service.middlewares(),
                    &server_middlewares,
                );
                (service.name().to_owned(), Route { service, chain })
            })
            .collect();

        debug!(
            services = routes.len(),
            middlewares = server_middlewares.len(),
            globals = self.globals.len(),
            batch_max_len = options.batch_max_len,
            "JSON-RPC server built"
        );

        JsonRpcServer {
            inner: Arc::new(ServerInner {
                options,
                routes,
                globals: self.globals,
            }),
        }
    }
}

struct Route {
    service: Service,
    chain: SharedHandler,
}

struct ServerInner {
    options: Options,
    routes: HashMap<String, Route>,
    globals: Vec<SharedGlobalMiddleware>,
}

/// Immutable, cheaply cloneable server
#[derive(Clone)]
pub struct JsonRpcServer {
    inner: Arc<ServerInner>,
}

impl std::fmt::Debug for JsonRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcServer")
            .field("options", &self.inner.options)
            .field("methods", &self.methods())
            .finish()
    }
}

impl JsonRpcServer {
    pub fn builder(options: Options) -> JsonRpcServerBuilder {
        JsonRpcServerBuilder::new(options)
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    /// Case-insensitive service lookup
    pub fn get_service(&self, name: &str) -> Option<&Service> {
        self.route(name).map(|route| &route.service)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.route(name).is_some()
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.inner.routes.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }

    fn route(&self, name: &str) -> Option<&Route> {
        if name.is_empty() {
            return None;
        }
        self.inner.routes.get(&name.to_lowercase())
    }

    /// Transport-level checks made before the body is read
    pub fn admit(&self, parts: &Parts) -> Result<(), Reply> {
        if parts.method != Method::POST {
            debug!(method = %parts.method, "rejecting non-POST request");
            return Err(Reply::MethodNotAllowed);
        }

        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with(self.inner.options.content_type.as_str()) {
            debug!(content_type, "rejecting unsupported content type");
            return Err(Reply::UnsupportedMediaType);
        }

        Ok(())
    }

    /// Admit, run global middleware, then dispatch
    pub async fn process(&self, parts: Parts, body: Bytes) -> Reply {
        if let Err(reply) = self.admit(&parts) {
            return reply;
        }
        self.handle_message(parts, body).await
    }

    /// Run global middleware, then dispatch
    pub async fn handle_message(&self, mut parts: Parts, body: Bytes) -> Reply {
        for global in &self.inner.globals {
            if let Err(error) = global.before_dispatch(&mut parts).await {
                debug!(code = error.code, "global middleware aborted the message");
                return Reply::envelope_error(error);
            }
        }
        self.dispatch(Arc::new(parts), body).await
    }

    /// Parse and execute one inbound message.
    ///
    /// `transport` is shared read-only by every request of a batch.
    pub async fn dispatch(&self, transport: Arc<Parts>, body: Bytes) -> Reply {
        if body.iter().all(|c| is_whitespace(*c)) {
            debug!("empty request body");
            return Reply::envelope_error(JsonRpcErrorObject::invalid_request());
        }

        if !batch::is_array(&body) {
            let message = self.handle_one(transport, &body).await;
            return Reply::from_messages(message.as_slice());
        }

        let spans = match batch::split(&body) {
            Ok(spans) => spans,
            Err(e) => {
                debug!(error = %e, "malformed batch");
                return Reply::envelope_error(e.to_error_object());
            }
        };
        if spans.is_empty() {
            debug!("empty batch");
            return Reply::envelope_error(JsonRpcErrorObject::invalid_request());
        }
        if spans.len() > self.inner.options.batch_max_len {
            warn!(
                len = spans.len(),
                max = self.inner.options.batch_max_len,
                "batch too long"
            );
            return Reply::envelope_error(JsonRpcErrorObject::max_batch_exceeded());
        }

        let elements = spans.into_iter().map(|span| body.slice(span)).collect();
        let messages = execute_batch(self, transport, elements).await;
        Reply::from_messages(&messages)
    }

    /// Validate, route and run a single request object.
    ///
    /// Returns `None` for notifications, whatever the outcome.
    pub(crate) async fn handle_one(
        &self,
        transport: Arc<Parts>,
        data: &Bytes,
    ) -> Option<JsonRpcMessage> {
        let request = match JsonRpcRequest::parse(data) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "invalid request");
                let error = e.to_error_object();
                if e.is_envelope_level() {
                    return Some(JsonRpcMessage::error(None, error));
                }
                let id = e.id().cloned()?;
                return Some(JsonRpcMessage::error(Some(id), error));
            }
        };

        let Some(route) = self.route(&request.method) else {
            debug!(method = %request.method, "method not found");
            let id = request.id?;
            return Some(JsonRpcMessage::error(
                Some(id),
                JsonRpcErrorObject::method_not_found(),
            ));
        };

        let id = request.id.clone();
        let result = route
            .chain
            .call(RequestContext::new(request, transport))
            .await;

        Some(JsonRpcMessage::from_result(id?, result))
    }
}
