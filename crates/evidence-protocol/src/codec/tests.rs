//! Unit tests for the Content-Length frame codec.

use std::io::{self, BufRead, BufReader, Cursor, Read, Write};

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::jsonrpc::{ErrorCode, RequestId, Response};

#[fixture]
fn limits() -> FrameLimits {
    FrameLimits::default()
}

fn framed(body: &[u8]) -> Vec<u8> {
    let mut bytes = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

fn read_all(input: &[u8], limits: &FrameLimits) -> Result<Option<Frame>, FrameError> {
    let mut reader = Cursor::new(input.to_vec());
    read_frame(&mut reader, limits)
}

fn expect_fatal(result: Result<Option<Frame>, FrameError>) -> FatalReason {
    match result {
        Err(FrameError::Fatal { reason, .. }) => reason,
        other => panic!("expected fatal frame error, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Successful reads
// ---------------------------------------------------------------------------

#[rstest]
#[case::crlf(b"Content-Length: 5\r\n\r\nhello".as_slice())]
#[case::bare_lf(b"Content-Length: 5\n\nhello".as_slice())]
#[case::lowercase(b"content-length: 5\r\n\r\nhello".as_slice())]
#[case::uppercase(b"CONTENT-LENGTH: 5\r\n\r\nhello".as_slice())]
#[case::padded_value(b"Content-Length:    5  \r\n\r\nhello".as_slice())]
#[case::extra_headers(
    b"Content-Type: application/json\r\nContent-Length: 5\r\nX-Trace: 1\r\n\r\nhello".as_slice()
)]
#[case::duplicate_last_wins(b"Content-Length: 2\r\nContent-Length: 5\r\n\r\nhello".as_slice())]
fn reads_declared_payload(#[case] input: &[u8], limits: FrameLimits) {
    let frame = read_all(input, &limits)
        .expect("frame should read")
        .expect("frame should be present");

    assert_eq!(frame.payload(), b"hello");
    assert_eq!(frame.declared_length(), 5);
}

#[rstest]
fn payload_is_byte_identical_including_non_utf8(limits: FrameLimits) {
    let body = [0xff_u8, 0x00, b'{', 0xc3, 0x28, b'}'];
    let frame = read_all(&framed(&body), &limits)
        .expect("frame should read")
        .expect("frame should be present");

    assert_eq!(frame.into_payload(), body.to_vec());
}

#[rstest]
fn reads_consecutive_frames(limits: FrameLimits) {
    let mut input = framed(b"first");
    input.extend(framed(b"second"));
    let mut reader = Cursor::new(input);

    let first = read_frame(&mut reader, &limits).expect("first frame");
    let second = read_frame(&mut reader, &limits).expect("second frame");
    let end = read_frame(&mut reader, &limits).expect("clean eof");

    assert_eq!(first.map(Frame::into_payload), Some(b"first".to_vec()));
    assert_eq!(second.map(Frame::into_payload), Some(b"second".to_vec()));
    assert!(end.is_none());
}

#[rstest]
fn clean_eof_before_headers_returns_none(limits: FrameLimits) {
    let result = read_all(b"", &limits).expect("empty stream is not an error");

    assert!(result.is_none());
}

// ---------------------------------------------------------------------------
// Fatal header faults
// ---------------------------------------------------------------------------

#[rstest]
fn missing_content_length_is_fatal(limits: FrameLimits) {
    let reason = expect_fatal(read_all(b"X-Test: 1\r\n\r\nhello", &limits));

    assert_eq!(reason, FatalReason::MissingContentLength);
    assert_eq!(reason.to_string(), "missing content length");
}

#[rstest]
#[case::alphabetic("abc")]
#[case::negative("-5")]
#[case::signed("+5")]
#[case::empty("")]
#[case::zero("0")]
#[case::fractional("4.5")]
#[case::overflow("999999999999999999999999999999")]
fn invalid_content_length_is_fatal(#[case] value: &str, limits: FrameLimits) {
    let input = format!("Content-Length: {value}\r\n\r\nhello");
    let reason = expect_fatal(read_all(input.as_bytes(), &limits));

    assert_eq!(reason, FatalReason::InvalidContentLength);
    assert_eq!(reason.to_string(), "invalid content length");
}

#[test]
fn newline_free_header_flood_is_fatal() {
    let limits = FrameLimits::new(64, 1024, 64);
    let flood = vec![b'a'; 10_000];
    let mut reader = Cursor::new(flood);

    let reason = expect_fatal(read_frame(&mut reader, &limits));

    assert_eq!(reason, FatalReason::HeadersTooLarge);
    assert!(
        reader.position() <= 65,
        "codec consumed {} bytes past a 64 byte ceiling",
        reader.position()
    );
}

#[test]
fn many_small_header_lines_exceed_ceiling() {
    let limits = FrameLimits::new(64, 1024, 64);
    let input = "X-Pad: 1\r\n".repeat(20);

    let reason = expect_fatal(read_all(input.as_bytes(), &limits));

    assert_eq!(reason, FatalReason::HeadersTooLarge);
}

#[test]
fn headers_exactly_at_ceiling_are_accepted() {
    let header = b"Content-Length: 2\r\n\r\n";
    let limits = FrameLimits::new(header.len(), 1024, 64);
    let mut input = header.to_vec();
    input.extend_from_slice(b"ok");

    let frame = read_all(&input, &limits)
        .expect("frame at ceiling should read")
        .expect("frame should be present");

    assert_eq!(frame.payload(), b"ok");
}

#[rstest]
#[case::mid_line(b"Content-Len".as_slice())]
#[case::before_blank_line(b"Content-Length: 5\r\n".as_slice())]
fn eof_inside_headers_is_fatal(#[case] input: &[u8], limits: FrameLimits) {
    let reason = expect_fatal(read_all(input, &limits));

    assert_eq!(reason, FatalReason::UnexpectedEof);
}

// ---------------------------------------------------------------------------
// Body faults
// ---------------------------------------------------------------------------

#[rstest]
#[case::empty_body(b"Content-Length: 10\r\n\r\n".as_slice())]
#[case::short_body(b"Content-Length: 10\r\n\r\nhello".as_slice())]
fn short_body_is_fatal_unexpected_eof(#[case] input: &[u8], limits: FrameLimits) {
    let error = read_all(input, &limits).expect_err("short body must fail");

    assert!(error.is_fatal());
    assert_eq!(error.message(), "unexpected eof");
}

#[test]
fn oversized_body_is_drained_and_stream_realigns() {
    let limits = FrameLimits::new(1024, 16, 4);
    let mut input = framed(&[b'x'; 100]);
    input.extend(framed(b"{\"ok\":true}"));
    let mut reader = Cursor::new(input);

    let error = read_frame(&mut reader, &limits).expect_err("oversized frame must fail");
    assert!(!error.is_fatal());
    assert_eq!(error.message(), "payload too large");
    assert!(matches!(
        error,
        FrameError::Recoverable {
            reason: RecoverableReason::PayloadTooLarge
        }
    ));

    let next = read_frame(&mut reader, &limits)
        .expect("next frame should read")
        .expect("next frame should be present");
    assert_eq!(next.payload(), b"{\"ok\":true}");
}

#[test]
fn huge_declared_length_is_drained_without_buffering() {
    let limits = FrameLimits::new(1024, 1024, 64);
    let declared: u64 = 50 * 1024 * 1024;
    let header = format!("Content-Length: {declared}\r\n\r\n");
    let stream = Cursor::new(header.into_bytes())
        .chain(io::repeat(b'z').take(declared))
        .chain(Cursor::new(framed(b"after")));
    let mut reader = RecordingReader::new(BufReader::with_capacity(16, stream));

    let error = read_frame(&mut reader, &limits).expect_err("huge frame must be rejected");
    assert!(!error.is_fatal());
    assert!(
        reader.largest_read <= limits.drain_chunk_bytes(),
        "drain requested {} bytes in one read",
        reader.largest_read
    );

    let next = read_frame(&mut reader, &limits)
        .expect("frame after drain")
        .expect("frame after drain should be present");
    assert_eq!(next.payload(), b"after");
}

#[test]
fn truncated_oversized_body_is_fatal() {
    let limits = FrameLimits::new(1024, 16, 4);
    let mut input = b"Content-Length: 100\r\n\r\n".to_vec();
    input.extend_from_slice(&[b'x'; 40]);

    let reason = expect_fatal(read_all(&input, &limits));

    assert_eq!(reason, FatalReason::UnexpectedEof);
}

#[test]
fn io_failure_is_fatal_and_keeps_source() {
    let mut reader = BufReader::new(FailingReader);

    let error = read_frame(&mut reader, &FrameLimits::default()).expect_err("read must fail");

    match error {
        FrameError::Fatal {
            reason: FatalReason::ReadFailed,
            source: Some(source),
        } => assert_eq!(source.kind(), io::ErrorKind::BrokenPipe),
        other => panic!("expected ReadFailed with source, got {other:?}"),
    }
}

#[test]
fn zero_limits_are_raised_to_one() {
    let limits = FrameLimits::new(0, 0, 0);

    assert_eq!(limits.max_header_bytes(), 1);
    assert_eq!(limits.max_body_bytes(), 1);
    assert_eq!(limits.drain_chunk_bytes(), 1);
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

#[test]
fn write_frame_emits_content_length_header() {
    let response = Response::success(RequestId::from(1), json!({"tools": []}));
    let mut output = Vec::new();

    let written = write_frame(&mut output, &response).expect("write succeeds");

    let text = String::from_utf8(output).expect("utf8 output");
    let (header, body) = text.split_once("\r\n\r\n").expect("header separator");
    assert_eq!(header, format!("Content-Length: {written}"));
    assert_eq!(body.len(), written);
}

#[rstest]
#[case::success(Response::success(RequestId::from("abc"), json!({"content": [{"type": "json"}]})))]
#[case::error(Response::error(RequestId::Null, ErrorCode::InvalidRequest, "headers too large"))]
#[case::numeric_error(Response::error(RequestId::from(7), ErrorCode::MethodNotFound, "method not found"))]
fn written_frames_read_back_as_equal_responses(#[case] response: Response, limits: FrameLimits) {
    let mut wire = Vec::new();
    write_frame(&mut wire, &response).expect("write succeeds");

    let frame = read_all(&wire, &limits)
        .expect("frame should read")
        .expect("frame should be present");
    let decoded: Response = serde_json::from_slice(frame.payload()).expect("decode response");

    assert_eq!(decoded, response);
}

#[test]
fn write_failure_is_reported() {
    let response = Response::success(RequestId::Null, json!(null));

    let error = write_frame(&mut FailingWriter, &response).expect_err("write must fail");

    assert!(matches!(error, FrameWriteError::Write { .. }));
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Records the largest buffer handed to `read` so tests can prove the drain
/// path never asks for the declared length in one go.
struct RecordingReader<R> {
    inner: R,
    largest_read: usize,
}

impl<R> RecordingReader<R> {
    const fn new(inner: R) -> Self {
        Self {
            inner,
            largest_read: 0,
        }
    }
}

impl<R: Read> Read for RecordingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.largest_read = self.largest_read.max(buf.len());
        self.inner.read(buf)
    }
}

impl<R: BufRead> BufRead for RecordingReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amount: usize) {
        self.inner.consume(amount);
    }
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }
}

struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
