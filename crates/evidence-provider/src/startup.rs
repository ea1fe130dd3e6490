//! Process bootstrap: configuration, telemetry, and the stdio session.

use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use evidence_config::{Config, ConfigError};
use evidence_protocol::FrameLimits;
use thiserror::Error;
use tracing::error;

use crate::dispatch::Dispatcher;
use crate::evidence::EchoProvider;
use crate::session::{Session, SessionError, SessionSummary};
use crate::telemetry::{self, TelemetryError};

const STARTUP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::startup");

/// Exit status for rejected configuration.
const EXIT_CONFIG: u8 = 2;

/// Failures before or during the session that stop the process.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Telemetry could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// The session could not write a response.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Frame ceilings taken from the resolved configuration.
#[must_use]
pub fn frame_limits(config: &Config) -> FrameLimits {
    FrameLimits::new(
        config.max_header_bytes,
        config.max_body_bytes,
        config.drain_chunk_bytes,
    )
}

/// Runs the echo provider over `input` and `output` with `config`.
///
/// # Errors
///
/// Returns [`StartupError`] when telemetry cannot be installed or a response
/// cannot be written.
pub fn serve<R, W>(config: &Config, input: R, output: W) -> Result<SessionSummary, StartupError>
where
    R: BufRead,
    W: Write,
{
    telemetry::initialise(config)?;
    let session = Session::new(
        input,
        output,
        Dispatcher::new(EchoProvider::new()),
        frame_limits(config),
    );
    Ok(session.run()?)
}

/// Binary entry point with substitutable arguments and streams.
///
/// Exit status is 0 when the input ends cleanly, 1 after a fatal framing
/// fault or output failure, and 2 for rejected configuration. Help and
/// version requests print to `output` and exit 0.
///
/// # Errors
///
/// Returns an I/O error only when a diagnostic cannot be written.
pub fn run<I, T, R, W, E>(args: I, input: R, output: &mut W, stderr: &mut E) -> io::Result<ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    R: BufRead,
    W: Write,
    E: Write,
{
    let config = match Config::load_from_iter(args) {
        Ok(config) => config,
        Err(ConfigError::Cli(clap_error)) => {
            let rendered = clap_error.render();
            if clap_error.use_stderr() {
                write!(stderr, "{rendered}")?;
            } else {
                write!(output, "{rendered}")?;
                output.flush()?;
            }
            let status = u8::try_from(clap_error.exit_code()).unwrap_or(EXIT_CONFIG);
            return Ok(ExitCode::from(status));
        }
        Err(config_error) => {
            writeln!(stderr, "evidence-provider: {config_error}")?;
            return Ok(ExitCode::from(EXIT_CONFIG));
        }
    };

    match serve(&config, input, &mut *output) {
        Ok(summary) if summary.end.is_clean() => Ok(ExitCode::SUCCESS),
        Ok(_) => Ok(ExitCode::FAILURE),
        Err(StartupError::Telemetry(telemetry_error)) => {
            writeln!(stderr, "evidence-provider: {telemetry_error}")?;
            Ok(ExitCode::FAILURE)
        }
        Err(session_error) => {
            error!(target: STARTUP_TARGET, error = %session_error, "session aborted");
            Ok(ExitCode::FAILURE)
        }
    }
}
