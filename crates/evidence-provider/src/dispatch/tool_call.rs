//! Validation of `tools/call` parameters.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::evidence::{EvidenceContext, EvidenceQuery};

/// Name of the only registered tool.
pub const TOOL_NAME: &str = "evidence_query";

/// Reasons `tools/call` parameters are rejected.
///
/// The display text is the message sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolParamsError {
    /// `params` was absent or not an object.
    #[error("invalid tool params")]
    NotAnObject,
    /// `params.name` did not name the registered tool.
    #[error("invalid tool params")]
    UnknownTool {
        /// The name supplied, when it was a string.
        name: Option<String>,
    },
    /// `params.arguments` was absent or not an object.
    #[error("invalid tool params")]
    ArgumentsNotAnObject,
    /// `arguments.query` or `arguments.context` was absent or not an object.
    #[error("missing query or context")]
    MissingQueryOrContext {
        /// The member that failed.
        field: &'static str,
    },
}

/// Validated `tools/call` parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallParams {
    query: EvidenceQuery,
    context: EvidenceContext,
}

impl ToolCallParams {
    /// Validates raw request parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ToolParamsError`] naming the first shape violation found.
    pub fn parse(raw_params: Option<&Value>) -> Result<Self, ToolParamsError> {
        let Some(Value::Object(params)) = raw_params else {
            return Err(ToolParamsError::NotAnObject);
        };

        match params.get("name") {
            Some(Value::String(name)) if name == TOOL_NAME => {}
            Some(Value::String(name)) => {
                return Err(ToolParamsError::UnknownTool {
                    name: Some(name.clone()),
                });
            }
            _ => return Err(ToolParamsError::UnknownTool { name: None }),
        }

        let Some(Value::Object(arguments)) = params.get("arguments") else {
            return Err(ToolParamsError::ArgumentsNotAnObject);
        };
        let query = object_member(arguments, "query")?;
        let context = object_member(arguments, "context")?;

        Ok(Self {
            query: EvidenceQuery::from_object(query),
            context: EvidenceContext::new(context.clone()),
        })
    }

    /// The evidence query.
    #[must_use]
    pub const fn query(&self) -> &EvidenceQuery {
        &self.query
    }

    /// The run context.
    #[must_use]
    pub const fn context(&self) -> &EvidenceContext {
        &self.context
    }
}

fn object_member<'a>(
    arguments: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Map<String, Value>, ToolParamsError> {
    match arguments.get(field) {
        Some(Value::Object(member)) => Ok(member),
        _ => Err(ToolParamsError::MissingQueryOrContext { field }),
    }
}
