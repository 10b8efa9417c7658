//! Core domain models for Rule Sync
//!
//! This crate contains the shared data structures used across
//! the reconciliation engine: package policies and their inputs,
//! rule templates, and the rule instances generated from them.

pub mod error;
pub mod models;

pub use error::CoreError;
pub use models::*;

/// Saved object type for rule templates
pub const CSP_RULE_TEMPLATE_SAVED_OBJECT_TYPE: &str = "csp-rule-template";

/// Saved object type for generated rule instances
pub const CSP_RULE_SAVED_OBJECT_TYPE: &str = "csp_rule";

/// Input type used when no single benchmark input is enabled
pub const CLOUDBEAT_VANILLA: &str = "cloudbeat/cis_k8s";
