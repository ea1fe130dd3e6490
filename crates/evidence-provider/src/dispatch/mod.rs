//! JSON-RPC request routing.
//!
//! The dispatcher turns every decoded [`Request`] into exactly one
//! [`Response`]. Shape checks run in a fixed order:
//!
//! 1. a `jsonrpc` member other than `"2.0"` is an invalid request;
//! 2. an `id` that is not a number, string, or null is an invalid request;
//! 3. the method routes to `tools/list` or `tools/call`, and anything else
//!    is `method not found`.
//!
//! Tool-call parameter faults are invalid params. Provider failures are not
//! protocol errors: they come back inside a successful result.

mod tool_call;

use evidence_protocol::{ErrorCode, Request, RequestId, Response};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::evidence::{EvidenceProvider, EvidenceResult, handle_evidence_query};

pub use self::tool_call::{TOOL_NAME, ToolCallParams, ToolParamsError};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Description advertised by `tools/list`.
pub const TOOL_DESCRIPTION: &str = "Resolve an evidence query against this provider.";

/// Methods the provider answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `tools/list`
    ToolsList,
    /// `tools/call`
    ToolsCall,
}

impl Method {
    /// Parses a method name. Names are case-sensitive.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "tools/list" => Some(Self::ToolsList),
            "tools/call" => Some(Self::ToolsCall),
            _ => None,
        }
    }

    /// Wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ToolsList => "tools/list",
            Self::ToolsCall => "tools/call",
        }
    }
}

/// Static `tools/list` result.
#[must_use]
pub fn tool_list() -> Value {
    json!({
        "tools": [{
            "name": TOOL_NAME,
            "description": TOOL_DESCRIPTION,
            "input_schema": {"type": "object"},
        }]
    })
}

/// Routes requests to the tool handlers.
#[derive(Debug, Default, Clone)]
pub struct Dispatcher<P> {
    provider: P,
}

impl<P: EvidenceProvider> Dispatcher<P> {
    /// Creates a dispatcher backed by `provider`.
    #[must_use]
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The provider answering `tools/call`.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Produces the response for one request.
    #[must_use]
    pub fn handle_request(&self, request: &Request) -> Response {
        let id = request.id().clone();

        if !request.has_supported_version() {
            warn!(
                target: DISPATCH_TARGET,
                jsonrpc = request.jsonrpc(),
                "rejecting unsupported json-rpc version"
            );
            return Response::error(id, ErrorCode::InvalidRequest, "invalid json-rpc version");
        }
        if !request.has_valid_id() {
            warn!(target: DISPATCH_TARGET, "rejecting request id of unsupported type");
            return Response::error(RequestId::Null, ErrorCode::InvalidRequest, "invalid request id");
        }

        let Some(method) = request.method().and_then(Method::parse) else {
            debug!(
                target: DISPATCH_TARGET,
                method = request.method(),
                "method not found"
            );
            return Response::error(id, ErrorCode::MethodNotFound, "method not found");
        };

        debug!(target: DISPATCH_TARGET, method = method.as_str(), "routing request");
        match method {
            Method::ToolsList => Response::success(id, tool_list()),
            Method::ToolsCall => self.handle_tool_call(id, request.params()),
        }
    }

    fn handle_tool_call(&self, id: RequestId, params: Option<&Value>) -> Response {
        let call = match ToolCallParams::parse(params) {
            Ok(call) => call,
            Err(error) => {
                debug!(target: DISPATCH_TARGET, ?error, "invalid tool call params");
                return Response::error(id, ErrorCode::InvalidParams, error.to_string());
            }
        };

        let result = handle_evidence_query(&self.provider, call.query(), call.context());
        if let Some(error) = result.error() {
            debug!(
                target: DISPATCH_TARGET,
                code = error.code.as_str(),
                "evidence query reported a domain error"
            );
        }

        match tool_call_result(&result) {
            Ok(payload) => Response::success(id, payload),
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "failed to encode evidence result");
                Response::error(id, ErrorCode::ServerError, "failed to encode evidence result")
            }
        }
    }
}

/// Wraps a result in the tool-call content envelope.
fn tool_call_result(result: &EvidenceResult) -> Result<Value, serde_json::Error> {
    let encoded = serde_json::to_value(result)?;
    Ok(json!({
        "content": [{"type": "json", "json": encoded}]
    }))
}
