//! Error types for holon_core.
//!
//! Only structural misuse is an error here. Routine outcomes such as an
//! agent running out of energy or a depth holding too few agents to pair
//! are reported through return values instead.

use thiserror::Error;

/// Main error type for core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Invalid population index, population count, cap or duplicate id.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced agent does not exist where the caller said it would.
    #[error("Agent not found: {0}")]
    NotFound(String),
}

/// Result type alias for holon_core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Creates a new validation error.
    #[must_use]
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a new not found error.
    #[must_use]
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound(what.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
