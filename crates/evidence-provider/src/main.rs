//! `evidence-provider` binary.
//!
//! Reads framed requests on stdin and writes framed responses on stdout.
//! Diagnostics go to stderr.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    evidence_provider::run(std::env::args_os(), stdin, &mut stdout, &mut stderr)
        .unwrap_or(ExitCode::FAILURE)
}
