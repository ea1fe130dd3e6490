//! Crate-level behaviour tests for evidence-protocol.
