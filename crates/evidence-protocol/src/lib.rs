//! Wire protocol for the stdio evidence provider.
//!
//! Messages travel as JSON-RPC 2.0 objects wrapped in the Content-Length
//! framing used by language servers:
//!
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <payload>
//! ```
//!
//! The crate is split along the path a message takes:
//!
//! - [`codec`] reads and writes frames with hard ceilings on header and body
//!   size, classifying failures as fatal or recoverable.
//! - [`message`] turns a frame payload into a [`Request`], rejecting anything
//!   that is not a UTF-8 JSON object.
//! - [`jsonrpc`] holds the request, response, and error-code types.
//!
//! Nothing here knows about tools or evidence; routing lives in the
//! `evidence-provider` crate.

pub mod codec;
pub mod jsonrpc;
pub mod message;

#[cfg(test)]
mod tests;

pub use self::codec::{
    FatalReason, Frame, FrameError, FrameLimits, FrameWriteError, RecoverableReason, read_frame,
    write_frame,
};
pub use self::jsonrpc::{ErrorCode, ErrorObject, JSONRPC_VERSION, Request, RequestId, Response};
pub use self::message::parse_request;
