//! Content-Length framed JSON-RPC evidence provider over stdio.
//!
//! The provider answers two methods. `tools/list` advertises the single
//! `evidence_query` tool, and `tools/call` resolves a query through an
//! [`EvidenceProvider`]. Framing and JSON-RPC types live in
//! `evidence-protocol`; this crate owns routing, the evidence model, and the
//! session loop that ties them to a byte stream.
//!
//! ```no_run
//! use std::io;
//!
//! use evidence_config::Config;
//! use evidence_provider::serve;
//!
//! # fn main() -> Result<(), evidence_provider::StartupError> {
//! let config = Config::default();
//! let summary = serve(&config, io::stdin().lock(), io::stdout().lock())?;
//! assert!(summary.end.is_clean());
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod evidence;
pub mod session;
mod startup;
pub mod telemetry;

#[cfg(test)]
mod tests;

pub use self::dispatch::{Dispatcher, Method, TOOL_NAME, ToolCallParams, ToolParamsError};
pub use self::evidence::{
    EchoProvider, EvidenceContext, EvidenceProvider, EvidenceProviderError, EvidenceQuery,
    EvidenceResult, EvidenceValue, TrustLane, handle_evidence_query,
};
pub use self::session::{Session, SessionEnd, SessionError, SessionSummary};
pub use self::startup::{StartupError, frame_limits, run, serve};
