//! Content-Length frame codec.
//!
//! Reads are bounded in both dimensions an attacker controls. Header lines
//! are pulled through a reader capped at the remaining header budget, so a
//! newline-free flood stops one byte past the ceiling. Bodies above the body
//! ceiling are never allocated: they are drained in fixed-size chunks and
//! reported as [`RecoverableReason::PayloadTooLarge`], which leaves the
//! stream positioned at the start of the next frame.

mod error;

use std::io::{self, BufRead, Read, Write};

use tracing::{debug, warn};

use crate::jsonrpc::Response;

pub use self::error::{FatalReason, FrameError, FrameWriteError, RecoverableReason};

/// Tracing target for codec operations.
pub(crate) const CODEC_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::codec");

const CONTENT_LENGTH: &[u8] = b"content-length";

/// Resource ceilings applied to every frame read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimits {
    max_header_bytes: usize,
    max_body_bytes: usize,
    drain_chunk_bytes: usize,
}

impl FrameLimits {
    /// Header ceiling used when none is configured (8 KiB).
    pub const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;
    /// Body ceiling used when none is configured (1 MiB).
    pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
    /// Drain chunk used when none is configured (8 KiB).
    pub const DEFAULT_DRAIN_CHUNK_BYTES: usize = 8 * 1024;

    /// Creates limits from explicit ceilings.
    ///
    /// Zero values are raised to one byte so the codec always makes progress;
    /// configuration validation rejects zeros before they reach this point.
    #[must_use]
    pub fn new(max_header_bytes: usize, max_body_bytes: usize, drain_chunk_bytes: usize) -> Self {
        Self {
            max_header_bytes: max_header_bytes.max(1),
            max_body_bytes: max_body_bytes.max(1),
            drain_chunk_bytes: drain_chunk_bytes.max(1),
        }
    }

    /// Ceiling on cumulative header bytes, line terminators included.
    #[must_use]
    pub const fn max_header_bytes(&self) -> usize {
        self.max_header_bytes
    }

    /// Ceiling on a body that will be buffered.
    #[must_use]
    pub const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Buffer size used while draining an oversized body.
    #[must_use]
    pub const fn drain_chunk_bytes(&self) -> usize {
        self.drain_chunk_bytes
    }
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self {
            max_header_bytes: Self::DEFAULT_MAX_HEADER_BYTES,
            max_body_bytes: Self::DEFAULT_MAX_BODY_BYTES,
            drain_chunk_bytes: Self::DEFAULT_DRAIN_CHUNK_BYTES,
        }
    }
}

/// One complete frame body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Vec<u8>,
}

impl Frame {
    /// Wraps a payload read from the stream.
    #[must_use]
    pub const fn new(payload: Vec<u8>) -> Self {
        Self { payload }
    }

    /// Length announced by the frame's `Content-Length` header.
    #[must_use]
    pub fn declared_length(&self) -> usize {
        self.payload.len()
    }

    /// Raw body bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consumes the frame, returning the body bytes.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Reads one frame from `reader`.
///
/// Returns `Ok(None)` when the stream ends cleanly before any header byte.
///
/// # Errors
///
/// Returns [`FrameError::Fatal`] for oversized or malformed headers, a
/// missing or non-positive `Content-Length`, a truncated frame, or an I/O
/// failure. Returns [`FrameError::Recoverable`] when the body exceeded the
/// ceiling and was drained.
pub fn read_frame(
    reader: &mut impl BufRead,
    limits: &FrameLimits,
) -> Result<Option<Frame>, FrameError> {
    let Some(content_length) = read_headers(reader, limits)? else {
        return Ok(None);
    };

    if content_length > limits.max_body_bytes {
        warn!(
            target: CODEC_TARGET,
            content_length,
            max_body_bytes = limits.max_body_bytes,
            "draining oversized frame body"
        );
        drain_body(reader, content_length, limits.drain_chunk_bytes)?;
        return Err(FrameError::recoverable(RecoverableReason::PayloadTooLarge));
    }

    let mut payload = vec![0_u8; content_length];
    reader.read_exact(&mut payload).map_err(FrameError::from_io)?;
    debug!(target: CODEC_TARGET, content_length, "read frame");
    Ok(Some(Frame::new(payload)))
}

/// Writes `response` as one frame and flushes.
///
/// Returns the body length written.
///
/// # Errors
///
/// Returns [`FrameWriteError`] if serialization, writing, or flushing fails.
pub fn write_frame(
    writer: &mut impl Write,
    response: &Response,
) -> Result<usize, FrameWriteError> {
    let payload =
        serde_json::to_vec(response).map_err(|source| FrameWriteError::Serialize { source })?;
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());

    writer
        .write_all(header.as_bytes())
        .map_err(|source| FrameWriteError::Write { source })?;
    writer
        .write_all(&payload)
        .map_err(|source| FrameWriteError::Write { source })?;
    writer
        .flush()
        .map_err(|source| FrameWriteError::Write { source })?;

    Ok(payload.len())
}

/// Reads the header block and returns the declared body length.
fn read_headers(
    reader: &mut impl BufRead,
    limits: &FrameLimits,
) -> Result<Option<usize>, FrameError> {
    let mut header_bytes = 0_usize;
    let mut content_length: Option<usize> = None;
    let mut line = Vec::new();

    loop {
        line.clear();
        let budget = limits
            .max_header_bytes
            .saturating_sub(header_bytes)
            .saturating_add(1);
        let mut limited = Read::take(&mut *reader, u64::try_from(budget).unwrap_or(u64::MAX));
        let bytes_read = limited
            .read_until(b'\n', &mut line)
            .map_err(FrameError::from_io)?;

        if bytes_read == 0 {
            if header_bytes == 0 {
                return Ok(None);
            }
            return Err(FrameError::fatal(FatalReason::UnexpectedEof));
        }

        header_bytes = header_bytes.saturating_add(bytes_read);
        if header_bytes > limits.max_header_bytes {
            return Err(FrameError::fatal(FatalReason::HeadersTooLarge));
        }
        if !line.ends_with(b"\n") {
            // Still within budget, so the stream closed mid-line.
            return Err(FrameError::fatal(FatalReason::UnexpectedEof));
        }

        let content = strip_line_ending(&line);
        if content.is_empty() {
            break;
        }
        if let Some(length) = parse_content_length(content)? {
            content_length = Some(length);
        }
    }

    match content_length {
        None => Err(FrameError::fatal(FatalReason::MissingContentLength)),
        Some(0) => Err(FrameError::fatal(FatalReason::InvalidContentLength)),
        Some(length) => Ok(Some(length)),
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let without_lf = line.strip_suffix(b"\n").unwrap_or(line);
    without_lf.strip_suffix(b"\r").unwrap_or(without_lf)
}

/// Returns the value of a `Content-Length` header, or `None` for any other
/// header line.
fn parse_content_length(header_line: &[u8]) -> Result<Option<usize>, FrameError> {
    let mut parts = header_line.splitn(2, |byte| *byte == b':');
    let name = parts.next().unwrap_or_default().trim_ascii();
    let Some(raw_value) = parts.next() else {
        return Ok(None);
    };
    if !name.eq_ignore_ascii_case(CONTENT_LENGTH) {
        return Ok(None);
    }

    let digits = raw_value.trim_ascii();
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(FrameError::fatal(FatalReason::InvalidContentLength));
    }
    std::str::from_utf8(digits)
        .ok()
        .and_then(|text| text.parse::<usize>().ok())
        .map(Some)
        .ok_or_else(|| FrameError::fatal(FatalReason::InvalidContentLength))
}

/// Discards exactly `remaining` body bytes in bounded chunks.
fn drain_body(
    reader: &mut impl Read,
    mut remaining: usize,
    chunk_bytes: usize,
) -> Result<(), FrameError> {
    let mut chunk = vec![0_u8; chunk_bytes.min(remaining).max(1)];
    while remaining > 0 {
        let window = remaining.min(chunk.len());
        let Some(buffer) = chunk.get_mut(..window) else {
            break;
        };
        match reader.read(buffer) {
            Ok(0) => return Err(FrameError::fatal(FatalReason::UnexpectedEof)),
            Ok(read) => remaining = remaining.saturating_sub(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(FrameError::from_io(error)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
