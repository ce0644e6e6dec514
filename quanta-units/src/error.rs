//! Errors that can occur during unit algebra, conversion and lookup

use quanta_core::{codes, NumberError, QuantaError};
use thiserror::Error;

use crate::DimensionVector;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Units have incompatible dimensions
    #[error("cannot convert {from} ({from_dim}) to {to} ({to_dim}): incompatible dimensions")]
    IncompatibleDimensions {
        from: String,
        to: String,
        from_dim: DimensionVector,
        to_dim: DimensionVector,
    },

    /// Same dimensions, but nothing registered or derivable connects them
    #[error("no conversion path from {from} to {to}")]
    NoConversionPath { from: String, to: String },

    /// An offset-bearing conversion used where only ratios compose
    #[error("{subject} has a non-zero offset and cannot be raised to power {exponent} or used inside a composite unit")]
    NonLinearConversion { subject: String, exponent: i32 },

    #[error("configuration not found: {0}")]
    ConfigurationNotFound(String),

    #[error("unit not found: {0}")]
    UnitNotFound(String),

    #[error("unit {0} already has a prefix")]
    AlreadyPrefixed(String),

    #[error("alias {alias} already belongs to {existing}")]
    AliasConflict { alias: String, existing: String },

    #[error("conversion ratio must not be zero")]
    ZeroRatio,

    #[error("unit exponent out of range")]
    ExponentOverflow,

    /// Structurally valid data that is not a canonical unit
    #[error("invalid unit: {0}")]
    InvalidUnit(String),

    /// Numeric error during conversion
    #[error("numeric error: {0}")]
    Number(#[from] NumberError),
}

impl From<ConversionError> for QuantaError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::IncompatibleDimensions { .. } => {
                QuantaError::new(codes::INCOMPATIBLE_DIMENSIONS, err.to_string())
                    .with_suggestion("Convert between units of the same dimension")
            }
            ConversionError::NoConversionPath { .. } => {
                QuantaError::new(codes::NO_CONVERSION_PATH, err.to_string())
                    .with_suggestion("Register a conversion between the two units")
            }
            ConversionError::NonLinearConversion { .. } => {
                QuantaError::new(codes::NON_LINEAR_CONVERSION, err.to_string())
                    .with_suggestion("Convert offset units such as °C to an absolute scale first")
            }
            ConversionError::ConfigurationNotFound(_) => {
                QuantaError::new(codes::CONFIGURATION_NOT_FOUND, err.to_string())
            }
            ConversionError::UnitNotFound(_) => {
                QuantaError::new(codes::UNIT_NOT_FOUND, err.to_string())
                    .with_suggestion("Check the alias spelling and alias type")
            }
            ConversionError::AlreadyPrefixed(_)
            | ConversionError::ZeroRatio
            | ConversionError::ExponentOverflow
            | ConversionError::InvalidUnit(_) => {
                QuantaError::new(codes::INVALID_UNIT, err.to_string())
            }
            ConversionError::AliasConflict { .. } => {
                QuantaError::new(codes::ALIAS_CONFLICT, err.to_string())
            }
            ConversionError::Number(e) => e.into(),
        }
    }
}
