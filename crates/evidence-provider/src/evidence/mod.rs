//! Evidence queries, results, and the provider seam.
//!
//! A provider answers one [`EvidenceQuery`] in the scope of an
//! [`EvidenceContext`]. Failures it reports are domain outcomes: they travel
//! back inside a successful tool-call result as an [`EvidenceResult`] whose
//! `error` member is populated, never as a JSON-RPC error.

mod echo;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use self::echo::EchoProvider;

/// A query addressed to a provider check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceQuery {
    provider_id: Option<String>,
    check_id: Option<String>,
    params: Map<String, Value>,
}

impl EvidenceQuery {
    /// Builds a query from its parameters alone.
    #[must_use]
    pub fn new(params: Map<String, Value>) -> Self {
        Self {
            provider_id: None,
            check_id: None,
            params,
        }
    }

    /// Reads a query object.
    ///
    /// Identifiers that are not strings are dropped. A missing or non-object
    /// `params` member becomes an empty map.
    #[must_use]
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_owned);
        let params = match object.get("params") {
            Some(Value::Object(params)) => params.clone(),
            _ => Map::new(),
        };
        Self {
            provider_id: text("provider_id"),
            check_id: text("check_id"),
            params,
        }
    }

    /// Provider the query was routed to.
    #[must_use]
    pub fn provider_id(&self) -> Option<&str> {
        self.provider_id.as_deref()
    }

    /// Check within the provider.
    #[must_use]
    pub fn check_id(&self) -> Option<&str> {
        self.check_id.as_deref()
    }

    /// Provider-specific parameters.
    #[must_use]
    pub const fn params(&self) -> &Map<String, Value> {
        &self.params
    }
}

/// The run context a query is evaluated in.
///
/// The object is kept verbatim; accessors read the well-known members.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceContext {
    fields: Map<String, Value>,
}

impl EvidenceContext {
    /// Wraps a context object.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Tenant owning the run.
    #[must_use]
    pub fn tenant_id(&self) -> Option<u64> {
        self.fields.get("tenant_id").and_then(Value::as_u64)
    }

    /// Namespace within the tenant.
    #[must_use]
    pub fn namespace_id(&self) -> Option<u64> {
        self.fields.get("namespace_id").and_then(Value::as_u64)
    }

    /// Run identifier.
    #[must_use]
    pub fn run_id(&self) -> Option<&str> {
        self.text("run_id")
    }

    /// Scenario identifier.
    #[must_use]
    pub fn scenario_id(&self) -> Option<&str> {
        self.text("scenario_id")
    }

    /// Stage identifier.
    #[must_use]
    pub fn stage_id(&self) -> Option<&str> {
        self.text("stage_id")
    }

    /// Trigger identifier.
    #[must_use]
    pub fn trigger_id(&self) -> Option<&str> {
        self.text("trigger_id")
    }

    /// Raw member lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The whole context object.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

/// A resolved evidence value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EvidenceValue {
    /// Arbitrary JSON.
    Json(Value),
    /// Raw bytes, written as an array of integers.
    Bytes(Vec<u8>),
}

/// Trust classification attached to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLane {
    /// The provider checked the value against its source.
    Verified,
    /// The value is reported without independent verification.
    Asserted,
}

/// Structured domain failure reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct EvidenceProviderError {
    /// Machine-readable code such as `invalid_params`.
    pub code: String,
    /// Human-readable description.
    pub message: String,
    /// Optional structured context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl EvidenceProviderError {
    /// Code for queries missing or misusing parameters.
    pub const INVALID_PARAMS: &'static str = "invalid_params";
    /// Code for failures inside the provider itself.
    pub const PROVIDER_ERROR: &'static str = "provider_error";

    /// Builds an error with an arbitrary code.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Builds an `invalid_params` error.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_PARAMS, message)
    }

    /// Builds a `provider_error` error.
    #[must_use]
    pub fn provider_error(message: impl Into<String>) -> Self {
        Self::new(Self::PROVIDER_ERROR, message)
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Outcome of one evidence query.
///
/// Exactly one of `value` and `error` is set. Every member is written on
/// the wire, with explicit nulls for absent provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceResult {
    value: Option<EvidenceValue>,
    lane: Option<TrustLane>,
    error: Option<EvidenceProviderError>,
    evidence_hash: Option<Value>,
    evidence_ref: Option<Value>,
    evidence_anchor: Option<Value>,
    signature: Option<Value>,
    content_type: Option<String>,
}

impl EvidenceResult {
    /// A resolved value with no provenance attached.
    #[must_use]
    pub const fn resolved(value: EvidenceValue, lane: TrustLane) -> Self {
        Self {
            value: Some(value),
            lane: Some(lane),
            error: None,
            evidence_hash: None,
            evidence_ref: None,
            evidence_anchor: None,
            signature: None,
            content_type: None,
        }
    }

    /// A failed resolution. Value, lane, and provenance are all null.
    #[must_use]
    pub const fn failed(error: EvidenceProviderError) -> Self {
        Self {
            value: None,
            lane: None,
            error: Some(error),
            evidence_hash: None,
            evidence_ref: None,
            evidence_anchor: None,
            signature: None,
            content_type: None,
        }
    }

    /// Sets the MIME type of the value.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Attaches a digest of the evidence.
    #[must_use]
    pub fn with_evidence_hash(mut self, hash: Value) -> Self {
        self.evidence_hash = Some(hash);
        self
    }

    /// Attaches a reference to where the evidence is stored.
    #[must_use]
    pub fn with_evidence_ref(mut self, reference: Value) -> Self {
        self.evidence_ref = Some(reference);
        self
    }

    /// Attaches an anchor tying the evidence to its source.
    #[must_use]
    pub fn with_evidence_anchor(mut self, anchor: Value) -> Self {
        self.evidence_anchor = Some(anchor);
        self
    }

    /// Attaches a signature over the evidence.
    #[must_use]
    pub fn with_signature(mut self, signature: Value) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Resolved value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&EvidenceValue> {
        self.value.as_ref()
    }

    /// Trust lane of the value.
    #[must_use]
    pub const fn lane(&self) -> Option<TrustLane> {
        self.lane
    }

    /// Domain error, if resolution failed.
    #[must_use]
    pub const fn error(&self) -> Option<&EvidenceProviderError> {
        self.error.as_ref()
    }

    /// MIME type of the value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Evidence digest.
    #[must_use]
    pub const fn evidence_hash(&self) -> Option<&Value> {
        self.evidence_hash.as_ref()
    }

    /// Evidence storage reference.
    #[must_use]
    pub const fn evidence_ref(&self) -> Option<&Value> {
        self.evidence_ref.as_ref()
    }

    /// Evidence anchor.
    #[must_use]
    pub const fn evidence_anchor(&self) -> Option<&Value> {
        self.evidence_anchor.as_ref()
    }

    /// Evidence signature.
    #[must_use]
    pub const fn signature(&self) -> Option<&Value> {
        self.signature.as_ref()
    }
}

/// Resolves evidence queries.
pub trait EvidenceProvider {
    /// Answers `query` within `context`.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceProviderError`] when the query cannot be resolved.
    /// The error is reported to the caller inside a successful result.
    fn query(
        &self,
        query: &EvidenceQuery,
        context: &EvidenceContext,
    ) -> Result<EvidenceResult, EvidenceProviderError>;
}

impl<P: EvidenceProvider + ?Sized> EvidenceProvider for &P {
    fn query(
        &self,
        query: &EvidenceQuery,
        context: &EvidenceContext,
    ) -> Result<EvidenceResult, EvidenceProviderError> {
        (**self).query(query, context)
    }
}

/// Runs `provider` and folds a provider error into a failed result.
#[must_use]
pub fn handle_evidence_query<P: EvidenceProvider + ?Sized>(
    provider: &P,
    query: &EvidenceQuery,
    context: &EvidenceContext,
) -> EvidenceResult {
    provider
        .query(query, context)
        .unwrap_or_else(EvidenceResult::failed)
}
