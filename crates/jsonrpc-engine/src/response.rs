//! Response model and assembler

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{JsonRpcError, JsonRpcErrorObject};
use crate::types::{JsonRpcVersion, RequestId};

/// A successful JSON-RPC response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: RequestId,
    pub result: Value,
}

impl JsonRpcResponse {
    pub fn new(id: RequestId, result: Value) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            result,
        }
    }
}

/// Union type that represents either a successful response or an error response
/// This keeps `result` and `error` mutually exclusive on the wire
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Successful response with result field
    Response(JsonRpcResponse),
    /// Error response with error field
    Error(JsonRpcError),
}

impl JsonRpcMessage {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self::Response(JsonRpcResponse::new(id, result))
    }

    pub fn error(id: Option<RequestId>, error: JsonRpcErrorObject) -> Self {
        Self::Error(JsonRpcError::new(id, error))
    }

    /// Build the message for a finished call
    pub fn from_result(id: RequestId, result: Result<Value, JsonRpcErrorObject>) -> Self {
        match result {
            Ok(value) => Self::success(id, value),
            Err(error) => Self::error(Some(id), error),
        }
    }

    /// Check if this is an error response
    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcMessage::Error(_))
    }

    /// Get the request ID from either response or error
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            JsonRpcMessage::Response(resp) => Some(&resp.id),
            JsonRpcMessage::Error(err) => err.id.as_ref(),
        }
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<JsonRpcError> for JsonRpcMessage {
    fn from(error: JsonRpcError) -> Self {
        Self::Error(error)
    }
}

/// Serialize the responses of one inbound message.
///
/// Returns `None` when there is nothing to send (every request was a
/// notification). A single response is written bare, more than one as an
/// array in the order given.
pub fn encode_replies(messages: &[JsonRpcMessage]) -> Result<Option<Bytes>, serde_json::Error> {
    let body = match messages {
        [] => return Ok(None),
        [single] => serde_json::to_vec(single)?,
        many => serde_json::to_vec(many)?,
    };
    Ok(Some(Bytes::from(body)))
}

/// Serialize a single envelope-level error.
pub fn encode_error(error: &JsonRpcError) -> Result<Bytes, serde_json::Error> {
    serde_json::to_vec(error).map(Bytes::from)
}
