use crate::logging::LogFormat;

/// Default log filter expression used by the provider binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Ceiling on cumulative header bytes for a single frame (8 KiB).
pub const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;

/// Ceiling on a single frame body (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Chunk size used when draining an oversized body (8 KiB).
pub const DEFAULT_DRAIN_CHUNK_BYTES: usize = 8 * 1024;

/// Default log filter expression used by the provider binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the provider binary.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
