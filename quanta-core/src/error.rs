//! Structured errors for callers that surface failures to users or tools
//!
//! Crate-level error enums (`NumberError`, and `ConversionError` in
//! quanta-units) convert into `QuantaError`, which carries a machine-readable
//! code and an optional suggestion.

use crate::NumberError;
use serde::{Deserialize, Serialize};

/// Standard error codes (machine-readable)
pub mod codes {
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const DIV_ZERO: &str = "DIV_ZERO";
    pub const PRECISION_LOSS: &str = "PRECISION_LOSS";
    pub const NOT_FINITE: &str = "NOT_FINITE";
    pub const INCOMPATIBLE_DIMENSIONS: &str = "INCOMPATIBLE_DIMENSIONS";
    pub const NO_CONVERSION_PATH: &str = "NO_CONVERSION_PATH";
    pub const NON_LINEAR_CONVERSION: &str = "NON_LINEAR_CONVERSION";
    pub const CONFIGURATION_NOT_FOUND: &str = "CONFIGURATION_NOT_FOUND";
    pub const UNIT_NOT_FOUND: &str = "UNIT_NOT_FOUND";
    pub const INVALID_UNIT: &str = "INVALID_UNIT";
    pub const ALIAS_CONFLICT: &str = "ALIAS_CONFLICT";
}

/// Structured error with a stable code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantaError {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Propagation notes
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
}

impl QuantaError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
            notes: Vec::new(),
        }
    }

    /// Builder: add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Builder: add propagation note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    // ========== Common Error Constructors ==========

    pub fn parse_error(details: impl Into<String>) -> Self {
        Self::new(codes::PARSE_ERROR, format!("Parse error: {}", details.into()))
            .with_suggestion("Use an integer, decimal, exponent or n/d literal")
    }

    pub fn div_zero() -> Self {
        Self::new(codes::DIV_ZERO, "Division by zero")
            .with_suggestion("Ensure divisor is not zero")
    }

    pub fn precision_loss(value: &str, target: &str) -> Self {
        Self::new(
            codes::PRECISION_LOSS,
            format!("{} cannot be represented exactly as {}", value, target),
        )
        .with_suggestion("Use the rounding variant to accept an approximation")
    }

    pub fn not_finite(value: &str) -> Self {
        Self::new(codes::NOT_FINITE, format!("Not a finite number: {}", value))
    }
}

impl std::fmt::Display for QuantaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for QuantaError {}

impl From<NumberError> for QuantaError {
    fn from(err: NumberError) -> Self {
        match err {
            NumberError::ParseError(s) => Self::parse_error(s),
            NumberError::DivisionByZero => Self::div_zero(),
            NumberError::PrecisionLoss { value, target } => Self::precision_loss(&value, target),
            NumberError::NotFinite(s) => Self::not_finite(&s),
        }
    }
}
