//! Crate-level behaviour tests for evidence-provider.
