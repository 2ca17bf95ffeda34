//! Behaviour tests for pipeline execution.
