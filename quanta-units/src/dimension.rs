//! Dimensional analysis types
//!
//! A `Dimension` is an opaque identity (length, mass, ...). The dimensions of
//! a unit are a `DimensionVector`: each base dimension raised to a non-zero
//! integer exponent.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::ConversionError;

/// A fundamental measurable quantity, compared by identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dimension {
    id: Cow<'static, str>,
}

impl Dimension {
    /// Length dimension [L]
    pub const LENGTH: Dimension = Dimension::from_static("length");

    /// Mass dimension [M]
    pub const MASS: Dimension = Dimension::from_static("mass");

    /// Time dimension [T]
    pub const TIME: Dimension = Dimension::from_static("time");

    /// Electric current dimension [I]
    pub const CURRENT: Dimension = Dimension::from_static("current");

    /// Temperature dimension [Θ]
    pub const TEMPERATURE: Dimension = Dimension::from_static("temperature");

    /// Amount of substance dimension [N]
    pub const AMOUNT: Dimension = Dimension::from_static("amount");

    /// Luminous intensity dimension [J]
    pub const LUMINOSITY: Dimension = Dimension::from_static("luminosity");

    /// Information (bits, bytes)
    pub const INFORMATION: Dimension = Dimension::from_static("information");

    pub const fn from_static(id: &'static str) -> Self {
        Dimension { id: Cow::Borrowed(id) }
    }

    /// A user-defined dimension
    pub fn new(id: impl Into<String>) -> Self {
        Dimension { id: Cow::Owned(id.into()) }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Represents the dimensions of a physical quantity
/// as exponents of base dimensions. Zero exponents are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DimensionVector {
    exponents: BTreeMap<Dimension, i32>,
}

impl DimensionVector {
    /// Dimensionless quantity (no exponents)
    pub fn dimensionless() -> Self {
        Self::default()
    }

    /// A single base dimension to the first power
    pub fn of(dimension: Dimension) -> Self {
        DimensionVector { exponents: BTreeMap::from([(dimension, 1)]) }
    }

    /// Create from (dimension, exponent) pairs, combining repeats
    pub fn from_exponents(exponents: impl IntoIterator<Item = (Dimension, i32)>) -> Result<Self, ConversionError> {
        let mut result = BTreeMap::new();
        for (dimension, exp) in exponents {
            let total = result.entry(dimension).or_insert(0i32);
            *total = total.checked_add(exp).ok_or(ConversionError::ExponentOverflow)?;
        }
        result.retain(|_, exp| *exp != 0);
        Ok(DimensionVector { exponents: result })
    }

    pub fn exponent(&self, dimension: &Dimension) -> i32 {
        self.exponents.get(dimension).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Dimension, i32)> {
        self.exponents.iter().map(|(d, e)| (d, *e))
    }

    /// Check if this is a dimensionless quantity
    pub fn is_dimensionless(&self) -> bool {
        self.exponents.is_empty()
    }

    /// The base dimension, if this is exactly one dimension to the first power
    pub fn as_single(&self) -> Option<&Dimension> {
        match self.exponents.iter().next() {
            Some((dimension, 1)) if self.exponents.len() == 1 => Some(dimension),
            _ => None,
        }
    }

    /// Multiply dimensions (add exponents)
    pub fn multiply(&self, other: &DimensionVector) -> Result<DimensionVector, ConversionError> {
        Self::from_exponents(self.iter().chain(other.iter()).map(|(d, e)| (d.clone(), e)))
    }

    /// Divide dimensions (subtract exponents)
    pub fn divide(&self, other: &DimensionVector) -> Result<DimensionVector, ConversionError> {
        self.multiply(&other.invert()?)
    }

    /// Raise to integer power (multiply exponents)
    pub fn power(&self, exp: i32) -> Result<DimensionVector, ConversionError> {
        let exponents = self
            .iter()
            .map(|(d, e)| Ok((d.clone(), e.checked_mul(exp).ok_or(ConversionError::ExponentOverflow)?)))
            .collect::<Result<Vec<_>, ConversionError>>()?;
        Self::from_exponents(exponents)
    }

    /// Invert dimensions (negate exponents)
    pub fn invert(&self) -> Result<DimensionVector, ConversionError> {
        self.power(-1)
    }

    /// Get the dimension name if it matches a common dimension
    pub fn name(&self) -> Option<&'static str> {
        let entries: Vec<(&str, i32)> = self.iter().map(|(d, e)| (d.id(), e)).collect();
        match entries.as_slice() {
            [] => Some("dimensionless"),
            [("length", 1)] => Some("length"),
            [("mass", 1)] => Some("mass"),
            [("time", 1)] => Some("time"),
            [("current", 1)] => Some("current"),
            [("temperature", 1)] => Some("temperature"),
            [("amount", 1)] => Some("amount"),
            [("luminosity", 1)] => Some("luminosity"),
            [("information", 1)] => Some("information"),
            [("length", 1), ("time", -1)] => Some("velocity"),
            [("length", 1), ("time", -2)] => Some("acceleration"),
            [("length", 1), ("mass", 1), ("time", -2)] => Some("force"),
            [("length", 2), ("mass", 1), ("time", -2)] => Some("energy"),
            [("length", 2), ("mass", 1), ("time", -3)] => Some("power"),
            [("length", -1), ("mass", 1), ("time", -2)] => Some("pressure"),
            [("length", 2)] => Some("area"),
            [("length", 3)] => Some("volume"),
            [("time", -1)] => Some("frequency"),
            [("current", 1), ("time", 1)] => Some("charge"),
            _ => None,
        }
    }
}

impl From<Dimension> for DimensionVector {
    fn from(dimension: Dimension) -> Self {
        Self::of(dimension)
    }
}

impl fmt::Display for DimensionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        for (dimension, exp) in self.iter() {
            if exp == 1 {
                parts.push(dimension.to_string());
            } else {
                parts.push(format!("{}^{}", dimension, exp));
            }
        }

        if parts.is_empty() {
            write!(f, "1")
        } else {
            write!(f, "{}", parts.join("·"))
        }
    }
}
