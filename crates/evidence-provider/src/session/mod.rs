//! The request loop.
//!
//! A [`Session`] owns both ends of the byte stream for its whole run. Each
//! iteration reads one frame and writes exactly one response, except at a
//! clean end of stream, where nothing is written.

use std::io::{BufRead, Write};

use evidence_protocol::{
    ErrorCode, FatalReason, FrameError, FrameLimits, FrameWriteError, RequestId, Response,
    parse_request, read_frame, write_frame,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::evidence::EvidenceProvider;

/// Tracing target for session operations.
pub(crate) const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The input closed cleanly between frames.
    EndOfStream,
    /// A fatal framing fault was reported and the loop stopped.
    FatalFrame(FatalReason),
}

impl SessionEnd {
    /// Returns `true` when the session ended without a framing fault.
    #[must_use]
    pub const fn is_clean(self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

/// Counters reported when a session stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Why the loop stopped.
    pub end: SessionEnd,
    /// Frames decoded into requests and dispatched.
    pub frames_handled: u64,
    /// Frames answered with a framing or parse error.
    pub frames_rejected: u64,
}

/// Failures that end a session without a protocol answer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A response could not be written to the output stream.
    #[error("failed to write response: {0}")]
    Write(#[from] FrameWriteError),
}

/// Drives the read, dispatch, and write loop.
#[derive(Debug)]
pub struct Session<R, W, P> {
    reader: R,
    writer: W,
    dispatcher: Dispatcher<P>,
    limits: FrameLimits,
    frames_handled: u64,
    frames_rejected: u64,
}

impl<R, W, P> Session<R, W, P>
where
    R: BufRead,
    W: Write,
    P: EvidenceProvider,
{
    /// Creates a session over `reader` and `writer`.
    #[must_use]
    pub const fn new(reader: R, writer: W, dispatcher: Dispatcher<P>, limits: FrameLimits) -> Self {
        Self {
            reader,
            writer,
            dispatcher,
            limits,
            frames_handled: 0,
            frames_rejected: 0,
        }
    }

    /// Runs until the input ends or a fatal framing fault occurs.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Write`] when a response cannot be written.
    pub fn run(mut self) -> Result<SessionSummary, SessionError> {
        info!(
            target: SESSION_TARGET,
            max_header_bytes = self.limits.max_header_bytes(),
            max_body_bytes = self.limits.max_body_bytes(),
            "session started"
        );

        let end = loop {
            if let Some(end) = self.step()? {
                break end;
            }
        };

        let summary = self.summary(end);
        info!(
            target: SESSION_TARGET,
            end = ?summary.end,
            frames_handled = summary.frames_handled,
            frames_rejected = summary.frames_rejected,
            "session stopped"
        );
        Ok(summary)
    }

    /// Handles one frame. Returns the end state once the loop must stop.
    fn step(&mut self) -> Result<Option<SessionEnd>, SessionError> {
        let frame = match read_frame(&mut self.reader, &self.limits) {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(Some(SessionEnd::EndOfStream)),
            Err(error) => return self.reject_frame(&error),
        };

        let response = match parse_request(frame.payload()) {
            Some(request) => {
                self.frames_handled = self.frames_handled.saturating_add(1);
                self.dispatcher.handle_request(&request)
            }
            None => {
                self.frames_rejected = self.frames_rejected.saturating_add(1);
                warn!(
                    target: SESSION_TARGET,
                    content_length = frame.declared_length(),
                    "payload is not a json-rpc object"
                );
                Response::error(RequestId::Null, ErrorCode::ParseError, "invalid json")
            }
        };

        self.send(&response)?;
        Ok(None)
    }

    fn reject_frame(&mut self, error: &FrameError) -> Result<Option<SessionEnd>, SessionError> {
        self.frames_rejected = self.frames_rejected.saturating_add(1);
        warn!(
            target: SESSION_TARGET,
            %error,
            fatal = error.is_fatal(),
            "rejecting frame"
        );

        let response = Response::error(RequestId::Null, ErrorCode::InvalidRequest, error.message());
        self.send(&response)?;

        match error {
            FrameError::Fatal { reason, .. } => Ok(Some(SessionEnd::FatalFrame(*reason))),
            FrameError::Recoverable { .. } => Ok(None),
        }
    }

    fn send(&mut self, response: &Response) -> Result<(), SessionError> {
        let written = write_frame(&mut self.writer, response)?;
        debug!(
            target: SESSION_TARGET,
            bytes = written,
            error = response.is_error(),
            "response written"
        );
        Ok(())
    }

    const fn summary(&self, end: SessionEnd) -> SessionSummary {
        SessionSummary {
            end,
            frames_handled: self.frames_handled,
            frames_rejected: self.frames_rejected,
        }
    }
}
