//! Unit representation
//!
//! A unit is a base unit (an opaque leaf tied to one dimension), a composite
//! unit (non-composite units raised to integer exponents) or a prefixed unit
//! (a standard unit scaled by a prefix). Conversion factors are not stored on
//! units; they live in the `ConversionRegistry`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::{ConversionError, Dimension, DimensionVector};

/// A named multiplicative scale (kilo, milli, kibi, ...)
///
/// Only the identity lives here; the exact factor is registered with a
/// `ConversionRegistry`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Prefix {
    name: Cow<'static, str>,
    symbol: Cow<'static, str>,
}

impl Prefix {
    pub const fn from_static(name: &'static str, symbol: &'static str) -> Self {
        Prefix { name: Cow::Borrowed(name), symbol: Cow::Borrowed(symbol) }
    }

    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Prefix { name: Cow::Owned(name.into()), symbol: Cow::Owned(symbol.into()) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Reference unit for one dimension, identified by its symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BaseUnit {
    symbol: Cow<'static, str>,
    dimension: Dimension,
}

impl BaseUnit {
    pub const fn from_static(symbol: &'static str, dimension: Dimension) -> Self {
        BaseUnit { symbol: Cow::Borrowed(symbol), dimension }
    }

    pub fn new(symbol: impl Into<String>, dimension: Dimension) -> Self {
        BaseUnit { symbol: Cow::Owned(symbol.into()), dimension }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn dimension(&self) -> &Dimension {
        &self.dimension
    }
}

/// Product of non-composite units raised to non-zero exponents
///
/// Never a single component with exponent 1; that is the component itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "Vec<(Unit, i32)>", try_from = "Vec<(Unit, i32)>")]
pub struct CompositeUnit {
    components: BTreeMap<Unit, i32>,
    dimensions: DimensionVector,
}

impl CompositeUnit {
    /// Computes the dimensions once, so they are known to fit
    fn from_merged(components: BTreeMap<Unit, i32>) -> Result<Self, ConversionError> {
        let mut dimensions = DimensionVector::dimensionless();
        for (unit, &exp) in &components {
            dimensions = dimensions.multiply(&unit.dimensions().power(exp)?)?;
        }
        Ok(CompositeUnit { components, dimensions })
    }

    pub fn components(&self) -> impl Iterator<Item = (&Unit, i32)> {
        self.components.iter().map(|(u, e)| (u, *e))
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl From<CompositeUnit> for Vec<(Unit, i32)> {
    fn from(unit: CompositeUnit) -> Self {
        unit.components.into_iter().collect()
    }
}

impl TryFrom<Vec<(Unit, i32)>> for CompositeUnit {
    type Error = ConversionError;

    fn try_from(components: Vec<(Unit, i32)>) -> Result<Self, Self::Error> {
        match Unit::from_components(components)? {
            Unit::Composite(composite) => Ok(composite),
            unit => Err(ConversionError::InvalidUnit(format!("composite of the single unit {}", unit))),
        }
    }
}

/// A standard unit scaled by a prefix; the wrapped unit is never prefixed
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PrefixedUnitRepr")]
pub struct PrefixedUnit {
    prefix: Prefix,
    unit: Box<Unit>,
}

#[derive(Deserialize)]
struct PrefixedUnitRepr {
    prefix: Prefix,
    unit: Unit,
}

impl TryFrom<PrefixedUnitRepr> for PrefixedUnit {
    type Error = ConversionError;

    fn try_from(repr: PrefixedUnitRepr) -> Result<Self, Self::Error> {
        PrefixedUnit::new(repr.prefix, repr.unit)
    }
}

impl PrefixedUnit {
    pub fn new(prefix: Prefix, unit: Unit) -> Result<Self, ConversionError> {
        if let Unit::Prefixed(_) = unit {
            return Err(ConversionError::AlreadyPrefixed(unit.to_string()));
        }
        Ok(Self::new_unchecked(prefix, unit))
    }

    /// Caller guarantees `unit` is not prefixed
    pub(crate) fn new_unchecked(prefix: Prefix, unit: Unit) -> Self {
        PrefixedUnit { prefix, unit: Box::new(unit) }
    }

    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    /// The unprefixed standard unit
    pub fn unit(&self) -> &Unit {
        &self.unit
    }
}

impl fmt::Display for PrefixedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit.as_ref() {
            Unit::Composite(c) if !c.is_empty() => write!(f, "{}({})", self.prefix.symbol, self.unit),
            _ => write!(f, "{}{}", self.prefix.symbol, self.unit),
        }
    }
}

/// Represents a physical unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Base(BaseUnit),
    Composite(CompositeUnit),
    Prefixed(PrefixedUnit),
}

impl Unit {
    /// A base unit known at compile time
    pub const fn base_static(symbol: &'static str, dimension: Dimension) -> Unit {
        Unit::Base(BaseUnit::from_static(symbol, dimension))
    }

    /// A user-defined base unit
    pub fn base(symbol: impl Into<String>, dimension: Dimension) -> Unit {
        Unit::Base(BaseUnit::new(symbol, dimension))
    }

    /// The dimensionless unit (empty composite)
    pub fn one() -> Unit {
        Unit::Composite(CompositeUnit::default())
    }

    /// Build the canonical unit for a set of components
    ///
    /// Like terms are combined and zero exponents dropped. A single component
    /// with exponent 1 collapses to that component. Exponents, and the
    /// dimension exponents they add up to, must fit in an `i32`.
    pub fn from_components(components: impl IntoIterator<Item = (Unit, i32)>) -> Result<Unit, ConversionError> {
        let mut merged = BTreeMap::new();
        for (unit, exp) in components {
            accumulate(&mut merged, &unit, exp)?;
        }
        if merged.len() == 1 {
            if let Some((unit, 1)) = merged.iter().next() {
                return Ok(unit.clone());
            }
        }
        Ok(Unit::Composite(CompositeUnit::from_merged(merged)?))
    }

    /// Components as a map; base and prefixed units are their own component
    pub fn components(&self) -> BTreeMap<Unit, i32> {
        match self {
            Unit::Composite(c) => c.components.clone(),
            _ => BTreeMap::from([(self.clone(), 1)]),
        }
    }

    /// Multiply two units (e.g., m * m -> m^2)
    pub fn multiply(&self, other: &Unit) -> Result<Unit, ConversionError> {
        Unit::from_components(self.components().into_iter().chain(other.components()))
    }

    /// Divide two units (e.g., m / s -> m·s^-1)
    pub fn divide(&self, other: &Unit) -> Result<Unit, ConversionError> {
        self.multiply(&other.pow(-1)?)
    }

    /// Raise unit to a power (e.g., m^2, m^3)
    pub fn pow(&self, exp: i32) -> Result<Unit, ConversionError> {
        let components = self
            .components()
            .into_iter()
            .map(|(u, e)| Ok((u, e.checked_mul(exp).ok_or(ConversionError::ExponentOverflow)?)))
            .collect::<Result<Vec<_>, ConversionError>>()?;
        Unit::from_components(components)
    }

    pub fn inverse(&self) -> Result<Unit, ConversionError> {
        self.pow(-1)
    }

    /// Wrap this unit with `prefix`; prefixed units cannot be prefixed again
    pub fn with_prefix(&self, prefix: Prefix) -> Result<Unit, ConversionError> {
        Ok(Unit::Prefixed(PrefixedUnit::new(prefix, self.clone())?))
    }

    pub fn prefix(&self) -> Option<&Prefix> {
        match self {
            Unit::Prefixed(p) => Some(&p.prefix),
            _ => None,
        }
    }

    /// The unit without its prefix
    pub fn standard_unit(&self) -> &Unit {
        match self {
            Unit::Prefixed(p) => &p.unit,
            _ => self,
        }
    }

    pub fn is_prefixed(&self) -> bool {
        matches!(self, Unit::Prefixed(_))
    }

    /// The dimensional signature
    pub fn dimensions(&self) -> DimensionVector {
        match self {
            Unit::Base(b) => DimensionVector::of(b.dimension.clone()),
            Unit::Prefixed(p) => p.unit.dimensions(),
            Unit::Composite(c) => c.dimensions.clone(),
        }
    }

    /// Check if two units are dimensionally compatible (can be converted)
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimensions() == other.dimensions()
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimensions().is_dimensionless()
    }
}

/// Add `exp` of `unit` into `map`, expanding composites and dropping zeros
fn accumulate(map: &mut BTreeMap<Unit, i32>, unit: &Unit, exp: i32) -> Result<(), ConversionError> {
    match unit {
        Unit::Composite(c) => {
            for (inner, inner_exp) in c.components() {
                let scaled = inner_exp.checked_mul(exp).ok_or(ConversionError::ExponentOverflow)?;
                accumulate(map, inner, scaled)?;
            }
        }
        _ => {
            let total = map.entry(unit.clone()).or_insert(0);
            *total = total.checked_add(exp).ok_or(ConversionError::ExponentOverflow)?;
            if *total == 0 {
                map.remove(unit);
            }
        }
    }
    Ok(())
}

impl From<BaseUnit> for Unit {
    fn from(unit: BaseUnit) -> Self {
        Unit::Base(unit)
    }
}

impl From<PrefixedUnit> for Unit {
    fn from(unit: PrefixedUnit) -> Self {
        Unit::Prefixed(unit)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Base(b) => f.write_str(&b.symbol),
            Unit::Prefixed(p) => write!(f, "{}", p),
            Unit::Composite(c) if c.is_empty() => f.write_str("1"),
            Unit::Composite(c) => {
                let parts: Vec<String> = c
                    .components()
                    .map(|(unit, exp)| if exp == 1 { unit.to_string() } else { format!("{}^{}", unit, exp) })
                    .collect();
                f.write_str(&parts.join("·"))
            }
        }
    }
}
