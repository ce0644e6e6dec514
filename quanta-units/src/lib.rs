//! Quanta Units - Exact quantities and the unit-conversion graph
//!
//! Provides unit-aware quantities with dimensional analysis and lossless
//! conversion between any units connected by registered affine transforms.
//!
//! Building blocks:
//! - `Dimension` / `DimensionVector`: base dimensions and their integer powers
//! - `Unit`: base, composite (m·s^-1) and prefixed (km) units
//! - `ConversionTransform`: `x * ratio + offset` with exact rationals
//! - `ConversionRegistry`: stored pairs plus their transitive closure
//! - `AliasRegistry`: names and symbols, combined across prefixes and units
//! - `Configuration`: the thread-safe aggregate of all of the above
//!
//! The `units` module defines the standard library (SI, imperial, time,
//! temperature, data) used by `Configuration::standard()`.

mod dimension;
mod error;
mod unit;
mod transform;
mod registry;
mod alias;
mod configuration;
mod quantity;
pub mod units;

pub use dimension::{Dimension, DimensionVector};
pub use error::ConversionError;
pub use unit::{BaseUnit, CompositeUnit, Prefix, PrefixedUnit, Unit};
pub use transform::ConversionTransform;
pub use registry::ConversionRegistry;
pub use alias::{Alias, AliasRegistry, AliasType};
pub use configuration::{AliasOwner, Configuration, ConfigurationBuilder, ConfigurationCatalog};
pub use quantity::Quantity;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Alias, AliasType, Configuration, ConversionError, ConversionTransform, Dimension, Quantity, Unit};
    pub use quanta_core::{ExactNumber, RoundingMode};
}

/// Route `tracing` output through the test harness
#[cfg(test)]
pub(crate) fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
