//! Quantity type - an exact value with an associated unit

use std::cmp::Ordering;
use std::fmt;
use serde::{Serialize, Deserialize};
use quanta_core::{ExactNumber, NumberError, RoundingMode};

use crate::{Configuration, ConversionError, DimensionVector, Unit};

/// A physical quantity: an exact numeric value with an associated unit
///
/// Equality is structural: `1 km` and `1000 m` are different values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    value: ExactNumber,
    unit: Unit,
}

impl Quantity {
    pub fn new(value: impl Into<ExactNumber>, unit: Unit) -> Self {
        Quantity { value: value.into(), unit }
    }

    /// Parse the value exactly ("0.0254", "1/3", "1.5e3")
    pub fn parse(value: &str, unit: Unit) -> Result<Self, ConversionError> {
        Ok(Quantity::new(value.parse::<ExactNumber>()?, unit))
    }

    /// Create from a float through its shortest decimal form
    pub fn from_f64(value: f64, unit: Unit) -> Result<Self, ConversionError> {
        Ok(Quantity::new(ExactNumber::from_f64(value)?, unit))
    }

    /// Create a dimensionless quantity (pure number)
    pub fn dimensionless(value: impl Into<ExactNumber>) -> Self {
        Quantity::new(value, Unit::one())
    }

    pub fn value(&self) -> &ExactNumber {
        &self.value
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn into_parts(self) -> (ExactNumber, Unit) {
        (self.value, self.unit)
    }

    pub fn dimensions(&self) -> DimensionVector {
        self.unit.dimensions()
    }

    pub fn is_dimensionless(&self) -> bool {
        self.unit.is_dimensionless()
    }

    /// Check if two quantities have compatible dimensions
    pub fn is_compatible(&self, other: &Quantity) -> bool {
        self.unit.is_compatible(&other.unit)
    }

    // ========== Conversion ==========

    /// Convert using the standard configuration
    pub fn convert_to(&self, target: &Unit) -> Result<Quantity, ConversionError> {
        self.convert_with(target, Configuration::standard())
    }

    pub fn convert_with(&self, target: &Unit, config: &Configuration) -> Result<Quantity, ConversionError> {
        config.convert(self, target)
    }

    // ========== Arithmetic ==========

    /// Add in the left operand's unit, using the standard configuration
    pub fn add(&self, other: &Quantity) -> Result<Quantity, ConversionError> {
        self.add_with(other, Configuration::standard())
    }

    pub fn add_with(&self, other: &Quantity, config: &Configuration) -> Result<Quantity, ConversionError> {
        let rhs = self.aligned(other, config)?;
        Ok(Quantity::new(self.value.add(&rhs), self.unit.clone()))
    }

    /// Subtract in the left operand's unit, using the standard configuration
    pub fn sub(&self, other: &Quantity) -> Result<Quantity, ConversionError> {
        self.sub_with(other, Configuration::standard())
    }

    pub fn sub_with(&self, other: &Quantity, config: &Configuration) -> Result<Quantity, ConversionError> {
        let rhs = self.aligned(other, config)?;
        Ok(Quantity::new(self.value.sub(&rhs), self.unit.clone()))
    }

    /// Multiply two quantities (units multiply)
    pub fn mul(&self, other: &Quantity) -> Result<Quantity, ConversionError> {
        Ok(Quantity::new(self.value.mul(&other.value), self.unit.multiply(&other.unit)?))
    }

    /// Divide two quantities (units divide)
    pub fn div(&self, other: &Quantity) -> Result<Quantity, ConversionError> {
        let value = self.value.checked_div(&other.value)?;
        Ok(Quantity::new(value, self.unit.divide(&other.unit)?))
    }

    /// Raise to an integer power
    pub fn pow(&self, exp: i32) -> Result<Quantity, ConversionError> {
        let unit = self.unit.pow(exp)?;
        Ok(Quantity::new(self.value.pow(exp)?, unit))
    }

    pub fn neg(&self) -> Quantity {
        Quantity::new(self.value.neg(), self.unit.clone())
    }

    pub fn abs(&self) -> Quantity {
        Quantity::new(self.value.abs(), self.unit.clone())
    }

    /// Order two quantities after converting `other` into this unit
    pub fn compare_with(&self, other: &Quantity, config: &Configuration) -> Result<Ordering, ConversionError> {
        let rhs = self.aligned(other, config)?;
        Ok(self.value.cmp(&rhs))
    }

    /// `other`'s value expressed in this unit
    fn aligned(&self, other: &Quantity, config: &Configuration) -> Result<ExactNumber, ConversionError> {
        if !self.is_compatible(other) {
            return Err(ConversionError::IncompatibleDimensions {
                from: other.unit.to_string(),
                to: self.unit.to_string(),
                from_dim: other.dimensions(),
                to_dim: self.dimensions(),
            });
        }
        Ok(other.convert_with(&self.unit, config)?.value)
    }

    // ========== Value extraction ==========

    pub fn to_f64(&self) -> f64 {
        self.value.to_f64()
    }

    pub fn to_f64_exact(&self) -> Result<f64, NumberError> {
        self.value.to_f64_exact()
    }

    pub fn to_i64(&self, mode: RoundingMode) -> i64 {
        self.value.to_i64(mode)
    }

    pub fn to_i64_exact(&self) -> Result<i64, NumberError> {
        self.value.to_i64_exact()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.value.as_i64()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit == Unit::one() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::*;
    use crate::ConversionTransform;

    fn n(s: &str) -> ExactNumber {
        s.parse().unwrap()
    }

    #[test]
    fn test_inches_feet_meters() {
        let foot = Quantity::new(1, FOOT);
        assert_eq!(foot.convert_to(&METER).unwrap(), Quantity::new(n("0.3048"), METER));

        let back = Quantity::new(1, METER).convert_to(&FOOT).unwrap();
        assert_eq!(back.value(), &ExactNumber::from_ratio(1250, 381).unwrap());
        assert_eq!(back.mul(&Quantity::dimensionless(n("0.3048"))).unwrap().value(), &ExactNumber::ONE);
    }

    #[test]
    fn test_celsius_fahrenheit() {
        let freezing = Quantity::new(0, CELSIUS).convert_to(&FAHRENHEIT).unwrap();
        assert_eq!(freezing, Quantity::new(32, FAHRENHEIT));
        let boiling = Quantity::new(100, CELSIUS).convert_to(&FAHRENHEIT).unwrap();
        assert_eq!(boiling.value(), &ExactNumber::from(212));

        let body = Quantity::new(37, CELSIUS);
        let round_trip = body.convert_to(&FAHRENHEIT).unwrap().convert_to(&CELSIUS).unwrap();
        assert_eq!(round_trip, body);
        assert_eq!(Quantity::new(0, CELSIUS).convert_to(&KELVIN).unwrap().value(), &n("273.15"));
    }

    #[test]
    fn test_add_converts_right_operand() {
        let km = METER.with_prefix(KILO).unwrap();
        let sum = Quantity::new(3, METER).add(&Quantity::new(1, km.clone())).unwrap();
        assert_eq!(sum, Quantity::new(1003, METER));

        let sum = Quantity::new(1, km.clone()).add(&Quantity::new(3, METER)).unwrap();
        assert_eq!(sum, Quantity::new(n("1.003"), km));

        let err = Quantity::new(3, METER).add(&Quantity::new(1, GRAM)).unwrap_err();
        assert!(matches!(err, ConversionError::IncompatibleDimensions { .. }));
    }

    #[test]
    fn test_sub_and_compare() {
        let config = Configuration::standard();
        let diff = Quantity::new(1, FOOT).sub(&Quantity::new(6, INCH)).unwrap();
        assert_eq!(diff, Quantity::new(n("0.5"), FOOT));

        let yard = Quantity::new(1, YARD);
        let meter = Quantity::new(1, METER);
        assert_eq!(yard.compare_with(&meter, config), Ok(Ordering::Less));
        assert_eq!(meter.compare_with(&Quantity::new(100, METER.with_prefix(CENTI).unwrap()), config), Ok(Ordering::Equal));
        assert!(yard.compare_with(&Quantity::new(1, SECOND), config).is_err());
    }

    #[test]
    fn test_mul_div_pow() {
        let distance = Quantity::new(100, METER);
        let time = Quantity::new(8, SECOND);
        let speed = distance.div(&time).unwrap();
        assert_eq!(speed.value(), &n("12.5"));
        assert_eq!(speed.dimensions().name(), Some("velocity"));

        let area = distance.mul(&distance).unwrap();
        assert_eq!(area, Quantity::new(10000, METER.pow(2).unwrap()));
        assert_eq!(distance.pow(2).unwrap(), area);
        assert_eq!(distance.pow(-1).unwrap().value(), &n("0.01"));

        let err = distance.div(&Quantity::new(0, SECOND)).unwrap_err();
        assert_eq!(err, ConversionError::Number(NumberError::DivisionByZero));
    }

    #[test]
    fn test_exponent_overflow_is_an_error() {
        let huge = Quantity::new(1, METER.pow(1 << 30).unwrap());
        assert_eq!(huge.mul(&huge), Err(ConversionError::ExponentOverflow));
        assert_eq!(huge.pow(4), Err(ConversionError::ExponentOverflow));
        assert_eq!(
            Quantity::new(2, METER.inverse().unwrap()).pow(i32::MIN),
            Err(ConversionError::ExponentOverflow)
        );
        assert_eq!(huge.div(&huge).unwrap(), Quantity::dimensionless(1));
    }

    #[test]
    fn test_speed_conversion() {
        let km_per_hour = METER.with_prefix(KILO).unwrap().divide(&HOUR).unwrap();
        let speed = Quantity::new(10, METER.divide(&SECOND).unwrap());
        assert_eq!(speed.convert_to(&km_per_hour).unwrap().value(), &ExactNumber::from(36));
    }

    #[test]
    fn test_neg_abs() {
        let q = Quantity::new(-5, KELVIN);
        assert_eq!(q.abs(), Quantity::new(5, KELVIN));
        assert_eq!(q.neg().neg(), q);
    }

    #[test]
    fn test_value_extraction() {
        let third = Quantity::new(ExactNumber::from_ratio(1, 3).unwrap(), METER);
        assert!(matches!(third.to_f64_exact(), Err(NumberError::PrecisionLoss { .. })));
        assert!((third.to_f64() - 1.0 / 3.0).abs() < 1e-15);
        assert_eq!(third.as_i64(), None);
        assert_eq!(third.to_i64(RoundingMode::Ceiling), 1);

        let whole = Quantity::parse("42", METER).unwrap();
        assert_eq!(whole.to_i64_exact(), Ok(42));
        assert_eq!(Quantity::from_f64(2.5, METER).unwrap().to_f64_exact(), Ok(2.5));
        assert!(Quantity::parse("abc", METER).is_err());
    }

    #[test]
    fn test_private_configuration() {
        let furlong = Unit::base_static("fur", crate::Dimension::LENGTH);
        let config = Configuration::builder("racing")
            .with_conversion(furlong.clone(), METER, ConversionTransform::linear(n("201.168")).unwrap())
            .build()
            .unwrap();
        let race = Quantity::new(8, furlong.clone());
        assert_eq!(race.convert_with(&METER, &config).unwrap().value(), &n("1609.344"));
        assert!(matches!(
            race.convert_to(&METER),
            Err(ConversionError::NoConversionPath { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Quantity::new(n("0.3048"), METER).to_string(), "0.3048 m");
        assert_eq!(Quantity::new(n("1/3"), METER.divide(&SECOND).unwrap()).to_string(), "1/3 m·s^-1");
        assert_eq!(Quantity::dimensionless(7).to_string(), "7");
    }

    #[test]
    fn test_serde_roundtrip() {
        let q = Quantity::new(n("1/3"), METER.with_prefix(KILO).unwrap());
        let json = serde_json::to_string(&q).unwrap();
        let back: Quantity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }
}
