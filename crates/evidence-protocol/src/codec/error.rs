//! Framing failures.
//!
//! A [`FrameError`] is either fatal, meaning the byte stream can no longer be
//! trusted, or recoverable, meaning one message was rejected and the stream
//! is still aligned on a frame boundary. Callers branch on the variant (or
//! [`FrameError::is_fatal`]) and use the reason's display text as the
//! client-facing message.

use std::io;

use strum::Display;
use thiserror::Error;

/// Reasons a frame read ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FatalReason {
    /// Header bytes exceeded the configured ceiling before the blank line.
    #[strum(to_string = "headers too large")]
    HeadersTooLarge,
    /// The header block ended without a `Content-Length` header.
    #[strum(to_string = "missing content length")]
    MissingContentLength,
    /// `Content-Length` was not a positive decimal integer.
    #[strum(to_string = "invalid content length")]
    InvalidContentLength,
    /// The stream closed part-way through a frame.
    #[strum(to_string = "unexpected eof")]
    UnexpectedEof,
    /// The underlying stream reported an I/O error.
    #[strum(to_string = "stream read failed")]
    ReadFailed,
}

/// Reasons a single frame is rejected while the stream stays usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RecoverableReason {
    /// The declared body exceeded the ceiling and was drained unread.
    #[strum(to_string = "payload too large")]
    PayloadTooLarge,
}

/// Outcome of a failed frame read.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The stream is no longer trustworthy; stop reading.
    #[error("{reason}")]
    Fatal {
        /// Why the session must end.
        reason: FatalReason,
        /// Underlying I/O failure, when one caused the fault.
        #[source]
        source: Option<io::Error>,
    },
    /// One frame was rejected; the next read starts on a frame boundary.
    #[error("{reason}")]
    Recoverable {
        /// Why the frame was rejected.
        reason: RecoverableReason,
    },
}

impl FrameError {
    /// Builds a fatal error with no underlying I/O cause.
    #[must_use]
    pub const fn fatal(reason: FatalReason) -> Self {
        Self::Fatal {
            reason,
            source: None,
        }
    }

    /// Builds a recoverable error.
    #[must_use]
    pub const fn recoverable(reason: RecoverableReason) -> Self {
        Self::Recoverable { reason }
    }

    /// Maps an I/O error raised mid-frame.
    ///
    /// A premature end of stream keeps its own reason so clients see
    /// `unexpected eof` rather than a generic read failure.
    #[must_use]
    pub fn from_io(source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            return Self::fatal(FatalReason::UnexpectedEof);
        }
        Self::Fatal {
            reason: FatalReason::ReadFailed,
            source: Some(source),
        }
    }

    /// Returns `true` when the session must stop after reporting this error.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }

    /// Client-facing message for the error response.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Fatal { reason, .. } => reason.to_string(),
            Self::Recoverable { reason } => reason.to_string(),
        }
    }
}

/// Failures while writing a response frame.
#[derive(Debug, Error)]
pub enum FrameWriteError {
    /// The response could not be encoded as JSON.
    #[error("failed to serialize response: {source}")]
    Serialize {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
    /// Writing or flushing the stream failed.
    #[error("failed to write response frame: {source}")]
    Write {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
