//! Quanta Core - Fundamental types
//!
//! This crate provides the core types used throughout Quanta:
//! - `ExactNumber`: Arbitrary precision rational numbers
//! - `RoundingMode`: Policies for lossy narrowing
//! - `QuantaError`: Structured errors with stable codes

mod number;
mod rounding;
mod error;

pub use number::{ExactNumber, NumberError};
pub use rounding::RoundingMode;
pub use error::{QuantaError, codes};

// Re-exported so callers can build values from big integers directly
pub use dashu_int::{IBig, UBig};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{ExactNumber, NumberError, QuantaError, RoundingMode};
    pub use crate::error::codes;
}
