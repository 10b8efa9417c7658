//! Error types for the core crate

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid rule template: {0}")]
    InvalidRuleTemplate(String),
}
