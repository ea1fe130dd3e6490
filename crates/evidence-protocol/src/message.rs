//! Frame payload decoding.

use serde_json::Value;
use tracing::debug;

use crate::jsonrpc::Request;

const MESSAGE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::message");

/// Decodes a frame payload into a [`Request`].
///
/// Returns `None` when the payload is not UTF-8, is not valid JSON, or is
/// valid JSON whose top level is not an object. Callers answer `None` with a
/// parse error carrying a null id.
#[must_use]
pub fn parse_request(payload: &[u8]) -> Option<Request> {
    let text = match std::str::from_utf8(payload) {
        Ok(text) => text,
        Err(error) => {
            debug!(target: MESSAGE_TARGET, %error, "payload is not utf-8");
            return None;
        }
    };
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(error) => {
            debug!(target: MESSAGE_TARGET, %error, "payload is not json");
            return None;
        }
    };
    let request = Request::from_value(value);
    if request.is_none() {
        debug!(target: MESSAGE_TARGET, "payload is not a json object");
    }
    request
}
