use bytes::Bytes;
use thiserror::Error;

use crate::error::JsonRpcErrorObject;
use crate::escape::unescape_str;
use crate::scanner::{self, ScanError, Span};
use crate::types::{JsonRpcVersion, RequestId};

/// A validated JSON-RPC request.
///
/// `params` is the untouched byte span of the `params` member, sliced out of
/// the inbound body without copying; handlers decode it on demand.
#[derive(Debug, Clone)]
pub struct JsonRpcRequest {
    pub version: JsonRpcVersion,
    /// `None` marks a notification
    pub id: Option<RequestId>,
    pub method: String,
    pub params: Option<Bytes>,
}

impl JsonRpcRequest {
    /// Scan and validate one request object.
    pub fn parse(data: &Bytes) -> Result<Self, RequestError> {
        let envelope = scanner::scan(data)?;

        let id = match envelope.id {
            Some(span) => Some(RequestId::parse(span.bytes(data)).map_err(RequestError::Id)?),
            None => None,
        };

        if let Some(err) = envelope.field_error {
            // a mistyped id can not be echoed back
            let bad_id = matches!(err, ScanError::IncorrectFieldType { field: "id", .. });
            if bad_id && id.is_none() {
                return Err(RequestError::Scan(err));
            }
            return Err(RequestError::FieldType { id, source: err });
        }

        let version = envelope
            .jsonrpc
            .map(|span| string_value(data, span))
            .transpose()?
            .and_then(|v| JsonRpcVersion::parse(&v));
        let Some(version) = version else {
            return Err(RequestError::Version { id });
        };

        let Some(method) = envelope.method else {
            return Err(RequestError::MissingMethod { id });
        };
        let method = string_value(data, method)?.into_owned();

        let params = envelope.params.map(|span| data.slice(span.range()));

        Ok(Self {
            version,
            id,
            method,
            params,
        })
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

fn string_value(data: &[u8], span: Span) -> Result<std::borrow::Cow<'_, str>, ScanError> {
    let raw = &data[span.inner()];
    Ok(unescape_str(raw, raw.contains(&b'\\'))?)
}

/// Why a request object was rejected before dispatch
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("malformed request: {0}")]
    Scan(#[from] ScanError),

    #[error("invalid request id: {0}")]
    Id(#[source] serde_json::Error),

    #[error("invalid request: {source}")]
    FieldType {
        id: Option<RequestId>,
        #[source]
        source: ScanError,
    },

    #[error("missing or unsupported jsonrpc version")]
    Version { id: Option<RequestId> },

    #[error("missing method")]
    MissingMethod { id: Option<RequestId> },
}

impl RequestError {
    /// Id of the rejected request, when it could be recovered.
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            RequestError::Version { id }
            | RequestError::MissingMethod { id }
            | RequestError::FieldType { id, .. } => id.as_ref(),
            RequestError::Scan(_) | RequestError::Id(_) => None,
        }
    }

    /// Failures where the envelope itself could not be read; these are
    /// answered with `"id": null` because no id is known.
    pub fn is_envelope_level(&self) -> bool {
        matches!(self, RequestError::Scan(_) | RequestError::Id(_))
    }

    pub fn to_error_object(&self) -> JsonRpcErrorObject {
        match self {
            RequestError::Scan(err) if err.is_field_type_error() => {
                JsonRpcErrorObject::invalid_request()
            }
            RequestError::Scan(_) | RequestError::Id(_) => JsonRpcErrorObject::parse_error(),
            RequestError::FieldType { .. }
            | RequestError::Version { .. }
            | RequestError::MissingMethod { .. } => {
                JsonRpcErrorObject::invalid_request()
            }
        }
    }
}
