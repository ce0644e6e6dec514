//! Affine conversion transforms: `target = source * ratio + offset`

use std::fmt;
use serde::{Serialize, Deserialize};
use quanta_core::ExactNumber;

use crate::ConversionError;

/// An affine map between two units of identical dimension. `ratio` is never zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TransformRepr")]
pub struct ConversionTransform {
    ratio: ExactNumber,
    offset: ExactNumber,
}

#[derive(Deserialize)]
struct TransformRepr {
    ratio: ExactNumber,
    offset: ExactNumber,
}

impl TryFrom<TransformRepr> for ConversionTransform {
    type Error = ConversionError;

    fn try_from(repr: TransformRepr) -> Result<Self, Self::Error> {
        ConversionTransform::new(repr.ratio, repr.offset)
    }
}

impl ConversionTransform {
    pub fn new(ratio: ExactNumber, offset: ExactNumber) -> Result<Self, ConversionError> {
        if ratio.is_zero() {
            return Err(ConversionError::ZeroRatio);
        }
        Ok(Self { ratio, offset })
    }

    /// Proportional conversion (no offset)
    pub fn linear(ratio: ExactNumber) -> Result<Self, ConversionError> {
        Self::new(ratio, ExactNumber::ZERO)
    }

    pub fn identity() -> Self {
        Self { ratio: ExactNumber::ONE, offset: ExactNumber::ZERO }
    }

    pub fn ratio(&self) -> &ExactNumber {
        &self.ratio
    }

    pub fn offset(&self) -> &ExactNumber {
        &self.offset
    }

    pub fn is_identity(&self) -> bool {
        self.ratio.is_one() && self.offset.is_zero()
    }

    /// No offset, so the transform composes into powers and composites
    pub fn is_linear(&self) -> bool {
        self.offset.is_zero()
    }

    /// Convert a value in the source unit to the target unit
    pub fn apply(&self, value: &ExactNumber) -> ExactNumber {
        value.mul(&self.ratio).add(&self.offset)
    }

    /// Compose `self: A→B` with `next: B→C` into `A→C`
    pub fn reduce(&self, next: &ConversionTransform) -> ConversionTransform {
        ConversionTransform {
            ratio: self.ratio.mul(&next.ratio),
            offset: self.offset.mul(&next.ratio).add(&next.offset),
        }
    }

    /// The inverse map `B→A`
    pub fn reciprocal(&self) -> Result<ConversionTransform, ConversionError> {
        let ratio = self.ratio.reciprocal()?;
        let offset = self.offset.neg().mul(&ratio);
        Ok(ConversionTransform { ratio, offset })
    }

    /// The conversion between the units raised to `exponent`
    ///
    /// Only linear transforms have powers other than 1.
    pub fn pow(&self, exponent: i32) -> Result<ConversionTransform, ConversionError> {
        if exponent == 1 {
            return Ok(self.clone());
        }
        if !self.is_linear() {
            return Err(ConversionError::NonLinearConversion {
                subject: self.to_string(),
                exponent,
            });
        }
        Ok(ConversionTransform {
            ratio: self.ratio.pow(exponent)?,
            offset: ExactNumber::ZERO,
        })
    }
}

impl fmt::Display for ConversionTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_linear() {
            write!(f, "x * {}", self.ratio)
        } else {
            write!(f, "x * {} + {}", self.ratio, self.offset)
        }
    }
}
