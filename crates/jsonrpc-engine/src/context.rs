//! Per-call request context

use std::collections::HashMap;
use std::sync::Arc;

use http::request::Parts;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::JsonRpcErrorObject;
use crate::request::JsonRpcRequest;
use crate::types::RequestId;

/// Everything a handler and its middleware see for one call.
///
/// Cloning is cheap; clones share the same key/value store, so a value set
/// by an outer middleware is visible to the layers it wraps.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request: Arc<JsonRpcRequest>,
    transport: Arc<Parts>,
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl RequestContext {
    pub fn new(request: JsonRpcRequest, transport: Arc<Parts>) -> Self {
        Self {
            request: Arc::new(request),
            transport,
            values: Arc::default(),
        }
    }

    /// Request id; `None` for notifications
    pub fn id(&self) -> Option<&RequestId> {
        self.request.id.as_ref()
    }

    /// Method name as sent by the client
    pub fn method(&self) -> &str {
        &self.request.method
    }

    pub fn is_notification(&self) -> bool {
        self.request.is_notification()
    }

    /// Undecoded `params` bytes
    pub fn raw_params(&self) -> Option<&[u8]> {
        self.request.params.as_deref()
    }

    /// Decode `params` into `T`.
    ///
    /// Absent params decode as JSON `null`, so `Option<T>` and `()` accept a
    /// call without params while any other type reports Invalid params.
    pub fn params<T: DeserializeOwned>(&self) -> Result<T, JsonRpcErrorObject> {
        let raw = self.raw_params().unwrap_or(b"null");
        serde_json::from_slice(raw).map_err(|e| {
            JsonRpcErrorObject::invalid_params().with_data(Value::String(e.to_string()))
        })
    }

    /// Encode a handler result
    pub fn result<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value, JsonRpcErrorObject> {
        serde_json::to_value(value).map_err(|e| {
            tracing::error!(method = %self.method(), error = %e, "failed to encode result");
            JsonRpcErrorObject::internal_error()
        })
    }

    /// Transport-level request head (headers, extensions, peer address)
    pub fn transport(&self) -> &Parts {
        &self.transport
    }

    /// Store a value for the layers further down the chain
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.values.write().insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }
}
