//! JSON-RPC 2.0 request and response types.
//!
//! Requests are decoded leniently from a JSON object so that every shape
//! fault can be answered with a precise error code by the dispatcher.
//! Responses are built strictly: the outcome is an enum, so a response can
//! never carry both `result` and `error`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Protocol version accepted in requests and written in every response.
pub const JSONRPC_VERSION: &str = "2.0";

/// Correlation identifier echoed from request to response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric identifier.
    Number(Number),
    /// String identifier.
    String(String),
    /// Absent or explicit `null` identifier.
    #[default]
    Null,
}

impl RequestId {
    /// Converts a raw `id` member, returning `None` for types JSON-RPC does
    /// not allow (booleans, arrays, objects).
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Number(number) => Some(Self::Number(number.clone())),
            Value::String(text) => Some(Self::String(text.clone())),
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Returns `true` for the null identifier.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// A decoded request object.
///
/// Every member is optional at this layer. The dispatcher decides which
/// absences are errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    jsonrpc: Option<Value>,
    id: RequestId,
    id_valid: bool,
    method: Option<String>,
    params: Option<Value>,
}

impl Request {
    /// Builds a request from a top-level JSON object.
    ///
    /// The `jsonrpc` member is kept as raw JSON, so only the string `"2.0"`
    /// is a supported version. A non-string `method` is treated as absent.
    #[must_use]
    pub fn from_object(mut object: Map<String, Value>) -> Self {
        let jsonrpc = object.remove("jsonrpc");
        let (id, id_valid) = match object.remove("id") {
            None => (RequestId::Null, true),
            Some(raw) => {
                RequestId::from_value(&raw).map_or((RequestId::Null, false), |id| (id, true))
            }
        };
        let method = match object.remove("method") {
            Some(Value::String(method)) => Some(method),
            _ => None,
        };

        Self {
            jsonrpc,
            id,
            id_valid,
            method,
            params: object.remove("params"),
        }
    }

    /// Builds a request from any JSON value, returning `None` unless it is an
    /// object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(Self::from_object(object)),
            _ => None,
        }
    }

    /// The `jsonrpc` member, if present and a string.
    #[must_use]
    pub fn jsonrpc(&self) -> Option<&str> {
        self.jsonrpc.as_ref().and_then(Value::as_str)
    }

    /// Returns `true` unless a `jsonrpc` member is present with a value other
    /// than the string [`JSONRPC_VERSION`].
    #[must_use]
    pub fn has_supported_version(&self) -> bool {
        self.jsonrpc
            .as_ref()
            .is_none_or(|version| version.as_str() == Some(JSONRPC_VERSION))
    }

    /// Identifier to echo. Null when absent or of an unsupported type.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        &self.id
    }

    /// Returns `false` when the request carried an `id` of a type JSON-RPC
    /// forbids.
    #[must_use]
    pub const fn has_valid_id(&self) -> bool {
        self.id_valid
    }

    /// Method name, if present and a string.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Raw `params` member.
    #[must_use]
    pub const fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }
}

/// Standard and server-reserved error codes emitted by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The payload was not a UTF-8 JSON object.
    ParseError,
    /// Framing fault, bad version, or bad id.
    InvalidRequest,
    /// Unknown or missing method.
    MethodNotFound,
    /// Tool-call parameters failed validation.
    InvalidParams,
    /// The server failed while producing a response.
    ServerError,
}

impl ErrorCode {
    /// Numeric code written on the wire.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::ServerError => -32000,
        }
    }

    /// Maps a numeric code back to a known variant.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            -32700 => Some(Self::ParseError),
            -32600 => Some(Self::InvalidRequest),
            -32601 => Some(Self::MethodNotFound),
            -32602 => Some(Self::InvalidParams),
            -32000 => Some(Self::ServerError),
            _ => None,
        }
    }
}

/// The `error` member of a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
}

impl ErrorObject {
    /// Builds an error object for a known code.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
        }
    }

    /// Known code for this error, if any.
    #[must_use]
    pub const fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_code(self.code)
    }
}

/// Exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOutcome {
    /// Successful result payload.
    Result(Value),
    /// Error payload.
    Error(ErrorObject),
}

/// A response ready to be framed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    jsonrpc: String,
    id: RequestId,
    #[serde(flatten)]
    outcome: ResponseOutcome,
}

impl Response {
    /// Builds a successful response.
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            outcome: ResponseOutcome::Result(result),
        }
    }

    /// Builds an error response.
    #[must_use]
    pub fn error(id: RequestId, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            outcome: ResponseOutcome::Error(ErrorObject::new(code, message)),
        }
    }

    /// Protocol version written on the wire.
    #[must_use]
    pub fn jsonrpc(&self) -> &str {
        &self.jsonrpc
    }

    /// Echoed identifier.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        &self.id
    }

    /// Result or error payload.
    #[must_use]
    pub const fn outcome(&self) -> &ResponseOutcome {
        &self.outcome
    }

    /// Result payload, when the response succeeded.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        match &self.outcome {
            ResponseOutcome::Result(value) => Some(value),
            ResponseOutcome::Error(_) => None,
        }
    }

    /// Error payload, when the response failed.
    #[must_use]
    pub const fn error_object(&self) -> Option<&ErrorObject> {
        match &self.outcome {
            ResponseOutcome::Error(error) => Some(error),
            ResponseOutcome::Result(_) => None,
        }
    }

    /// Returns `true` for error responses.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Error(_))
    }
}
