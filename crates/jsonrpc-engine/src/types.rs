use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// The `id` of a JSON-RPC request, kept as the raw JSON token.
///
/// Responses echo the id byte-for-byte, so `1.50`, `"abc"` and `null` come
/// back exactly as the client sent them. The envelope scanner only admits
/// strings, numbers and `null` here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Box<RawValue>);

impl RequestId {
    /// Parse a raw scalar JSON token
    pub fn parse(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice::<Box<RawValue>>(raw).map(Self)
    }

    /// The raw JSON token as sent by the client
    pub fn as_raw(&self) -> &str {
        self.0.get()
    }

    pub fn is_null(&self) -> bool {
        self.as_raw() == "null"
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_raw().parse().ok()
    }

    /// Decoded string content, if the id is a JSON string
    pub fn as_string(&self) -> Option<String> {
        serde_json::from_str(self.as_raw()).ok()
    }
}

impl PartialEq for RequestId {
    fn eq(&self, other: &Self) -> bool {
        self.as_raw() == other.as_raw()
    }
}

impl Eq for RequestId {}

impl Hash for RequestId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_raw().hash(state);
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_raw())
    }
}

/// JSON-RPC version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonRpcVersion {
    #[default]
    V2_0,
}

impl JsonRpcVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonRpcVersion::V2_0 => crate::JSONRPC_VERSION,
        }
    }

    pub fn parse(version: &str) -> Option<Self> {
        match version {
            crate::JSONRPC_VERSION => Some(JsonRpcVersion::V2_0),
            _ => None,
        }
    }
}

impl fmt::Display for JsonRpcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        JsonRpcVersion::parse(&s).ok_or_else(|| {
            serde::de::Error::custom(format!("Invalid JSON-RPC version: {}", s))
        })
    }
}
