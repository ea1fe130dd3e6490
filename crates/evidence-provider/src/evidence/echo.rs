//! Reference provider that echoes `params.value` back as verified JSON.

use tracing::debug;

use super::{
    EvidenceContext, EvidenceProvider, EvidenceProviderError, EvidenceQuery, EvidenceResult,
    EvidenceValue, TrustLane,
};

const EVIDENCE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::evidence");

/// Value of `params.value` that makes [`EchoProvider`] fail on purpose.
pub(crate) const FORCED_ERROR_VALUE: &str = "error";

/// Echoes the query's `params.value`.
///
/// The string `"error"` produces a `provider_error` so callers can exercise
/// the failure path end to end.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoProvider;

impl EchoProvider {
    /// MIME type attached to every echoed value.
    pub const CONTENT_TYPE: &'static str = "application/json";

    /// Creates the provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EvidenceProvider for EchoProvider {
    fn query(
        &self,
        query: &EvidenceQuery,
        context: &EvidenceContext,
    ) -> Result<EvidenceResult, EvidenceProviderError> {
        debug!(
            target: EVIDENCE_TARGET,
            provider_id = query.provider_id(),
            check_id = query.check_id(),
            run_id = context.run_id(),
            "echoing evidence query"
        );

        let Some(value) = query.params().get("value") else {
            return Err(EvidenceProviderError::invalid_params(
                "params.value is required",
            ));
        };
        if value.as_str() == Some(FORCED_ERROR_VALUE) {
            return Err(EvidenceProviderError::provider_error("forced error"));
        }

        Ok(
            EvidenceResult::resolved(EvidenceValue::Json(value.clone()), TrustLane::Verified)
                .with_content_type(Self::CONTENT_TYPE),
        )
    }
}
