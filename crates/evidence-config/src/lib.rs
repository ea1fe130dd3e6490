//! Runtime configuration for the evidence provider.
//!
//! Settings resolve from command-line flags first, then from
//! `EVIDENCE_PROVIDER_*` environment variables, then from the built-in
//! defaults. The provider is spawned by an orchestrator that
//! owns its stdio, so there is no configuration file layer: everything the
//! process needs travels on its command line or in its environment.

mod defaults;
mod logging;

use std::ffi::OsString;

use clap::Parser;
use thiserror::Error;

pub use self::defaults::{
    DEFAULT_DRAIN_CHUNK_BYTES, DEFAULT_LOG_FILTER, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_MAX_HEADER_BYTES, default_log_filter, default_log_format,
};
pub use self::logging::{LogFormat, LogFormatParseError};

/// Resolved provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "evidence-provider",
    version,
    about = "Content-Length framed JSON-RPC evidence provider over stdio"
)]
pub struct Config {
    /// Tracing filter directive applied to stderr logs.
    #[arg(long, env = "EVIDENCE_PROVIDER_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,

    /// Log output format (`json` or `compact`).
    #[arg(long, env = "EVIDENCE_PROVIDER_LOG_FORMAT", default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// Ceiling on cumulative header bytes per frame.
    #[arg(
        long,
        env = "EVIDENCE_PROVIDER_MAX_HEADER_BYTES",
        default_value_t = DEFAULT_MAX_HEADER_BYTES
    )]
    pub max_header_bytes: usize,

    /// Ceiling on a frame body; larger bodies are drained and rejected.
    #[arg(
        long,
        env = "EVIDENCE_PROVIDER_MAX_BODY_BYTES",
        default_value_t = DEFAULT_MAX_BODY_BYTES
    )]
    pub max_body_bytes: usize,

    /// Chunk size used while draining an oversized body.
    #[arg(
        long,
        env = "EVIDENCE_PROVIDER_DRAIN_CHUNK_BYTES",
        default_value_t = DEFAULT_DRAIN_CHUNK_BYTES
    )]
    pub drain_chunk_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: default_log_format(),
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            drain_chunk_bytes: DEFAULT_DRAIN_CHUNK_BYTES,
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when flags fail to parse or the resolved
    /// limits are inconsistent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list.
    ///
    /// The first item is treated as the binary name, as with
    /// [`std::env::args_os`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when flags fail to parse or the resolved
    /// limits are inconsistent.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let config = Self::try_parse_from(args)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the frame limits describe a usable codec.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroLimit`] for any zero limit. A drain chunk
    /// larger than the body ceiling is accepted: draining never reads past
    /// the declared length.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("max_header_bytes", self.max_header_bytes),
            ("max_body_bytes", self.max_body_bytes),
            ("drain_chunk_bytes", self.drain_chunk_bytes),
        ];
        match limits.iter().find(|(_, value)| *value == 0) {
            Some(&(field, _)) => Err(ConfigError::ZeroLimit { field }),
            None => Ok(()),
        }
    }

    /// Tracing filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command-line or environment input failed to parse.
    ///
    /// This also carries clap's `--help` and `--version` requests, which the
    /// binary renders and exits on.
    #[error(transparent)]
    Cli(#[from] clap::Error),

    /// A frame limit was configured as zero.
    #[error("{field} must be greater than zero")]
    ZeroLimit {
        /// Name of the offending setting.
        field: &'static str,
    },
}
