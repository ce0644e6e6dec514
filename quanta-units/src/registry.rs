//! The conversion graph
//!
//! Every registered pair is stored in both directions, and each registration
//! extends the transitive closure of the touched component so that lookups of
//! stored pairs are a single hash probe. Pairs that were never registered are
//! derived structurally (prefixes, composite units) and then cached through the
//! same path.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};
use quanta_core::ExactNumber;

use crate::{ConversionError, ConversionTransform, Dimension, Prefix, PrefixedUnit, Unit};

#[derive(Debug, Clone, Default)]
pub struct ConversionRegistry {
    table: HashMap<Unit, HashMap<Unit, ConversionTransform>>,
    prefixes: HashMap<Prefix, ExactNumber>,
}

impl ConversionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the exact scale factor of `prefix` (kilo = 1000)
    pub fn register_prefix(&mut self, prefix: Prefix, factor: ExactNumber) -> Result<(), ConversionError> {
        if factor.is_zero() {
            return Err(ConversionError::ZeroRatio);
        }
        debug!(prefix = %prefix, factor = %factor, "registered prefix");
        self.prefixes.insert(prefix, factor);
        Ok(())
    }

    pub fn prefix_factor(&self, prefix: &Prefix) -> Option<&ExactNumber> {
        self.prefixes.get(prefix)
    }

    pub fn prefixes(&self) -> impl Iterator<Item = (&Prefix, &ExactNumber)> {
        self.prefixes.iter()
    }

    /// Register `source → target`, its reverse, and everything newly reachable
    ///
    /// Re-registering a pair overwrites it in both directions. Pairs derived
    /// from the old value are kept as they were.
    pub fn register(
        &mut self,
        source: &Unit,
        target: &Unit,
        transform: ConversionTransform,
    ) -> Result<(), ConversionError> {
        check_dimensions(source, target)?;
        if source == target {
            debug!(unit = %source, "ignoring conversion of a unit to itself");
            return Ok(());
        }
        debug!(%source, %target, %transform, "registered conversion");
        self.connect(source, target, transform)
    }

    /// The stored transform, if any, without derivation
    pub fn get(&self, source: &Unit, target: &Unit) -> Option<&ConversionTransform> {
        self.table.get(source)?.get(target)
    }

    pub fn contains(&self, source: &Unit, target: &Unit) -> bool {
        self.get(source, target).is_some()
    }

    /// Number of stored directed pairs
    pub fn len(&self) -> usize {
        self.table.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Resolve `source → target` from stored pairs only
    ///
    /// `Ok(None)` means the pair must be derived with [`lookup`](Self::lookup).
    pub fn lookup_cached(
        &self,
        source: &Unit,
        target: &Unit,
    ) -> Result<Option<ConversionTransform>, ConversionError> {
        check_dimensions(source, target)?;
        if source == target {
            return Ok(Some(ConversionTransform::identity()));
        }
        Ok(self.get(source, target).cloned())
    }

    /// Resolve `source → target`, deriving and caching when nothing is stored
    pub fn lookup(&mut self, source: &Unit, target: &Unit) -> Result<ConversionTransform, ConversionError> {
        if let Some(transform) = self.lookup_cached(source, target)? {
            trace!(%source, %target, "conversion cache hit");
            return Ok(transform);
        }

        let transform = self.derive(source, target)?;
        debug!(%source, %target, %transform, "derived conversion");
        // Intermediate lookups may already have closed over this pair
        if !self.contains(source, target) {
            self.connect(source, target, transform.clone())?;
        }
        Ok(transform)
    }

    fn derive(&mut self, source: &Unit, target: &Unit) -> Result<ConversionTransform, ConversionError> {
        match (source, target) {
            (Unit::Prefixed(p), _) if p.unit() == target => self.prefix_transform(p),
            (_, Unit::Prefixed(p)) if p.unit() == source => self.prefix_transform(p)?.reciprocal(),
            (Unit::Prefixed(p), _) => {
                let to_standard = self.prefix_transform(p)?;
                let onward = self.lookup(p.unit(), target)?;
                Ok(to_standard.reduce(&onward))
            }
            (_, Unit::Prefixed(p)) => {
                let to_standard = self.lookup(source, p.unit())?;
                let from_standard = self.prefix_transform(p)?.reciprocal()?;
                Ok(to_standard.reduce(&from_standard))
            }
            (Unit::Composite(_), _) | (_, Unit::Composite(_)) => self.composite_transform(source, target),
            _ => Err(no_path(source, target)),
        }
    }

    /// `prefixed → standard unit`
    fn prefix_transform(&self, unit: &PrefixedUnit) -> Result<ConversionTransform, ConversionError> {
        let factor = self
            .prefixes
            .get(unit.prefix())
            .ok_or_else(|| no_path(&Unit::Prefixed(unit.clone()), unit.unit()))?;
        ConversionTransform::linear(factor.clone())
    }

    /// Convert both sides to one reference unit per dimension and compare
    fn composite_transform(&mut self, source: &Unit, target: &Unit) -> Result<ConversionTransform, ConversionError> {
        let (source_factor, source_components) = self.expand(source)?;
        let (target_factor, target_components) = self.expand(target)?;

        let mut references: BTreeMap<Dimension, Unit> = BTreeMap::new();
        for unit in target_components.keys().chain(source_components.keys()) {
            let Some(dimension) = base_dimension(unit) else {
                return Err(no_path(source, target));
            };
            references.entry(dimension).or_insert_with(|| unit.clone());
        }

        let source_ratio = self.ratio_to_references(&source_components, &references)?;
        let target_ratio = self.ratio_to_references(&target_components, &references)?;

        let ratio = source_factor
            .mul(&source_ratio)
            .checked_div(&target_factor.mul(&target_ratio))?;
        ConversionTransform::linear(ratio)
    }

    /// Flatten `unit` into base components and the product of its prefix factors
    fn expand(&self, unit: &Unit) -> Result<(ExactNumber, BTreeMap<Unit, i32>), ConversionError> {
        match unit {
            Unit::Base(_) => Ok((ExactNumber::ONE, BTreeMap::from([(unit.clone(), 1)]))),
            Unit::Prefixed(p) => {
                let scale = self.prefix_transform(p)?;
                let (factor, components) = self.expand(p.unit())?;
                Ok((factor.mul(scale.ratio()), components))
            }
            Unit::Composite(c) => {
                let mut factor = ExactNumber::ONE;
                let mut components = BTreeMap::new();
                for (inner, exp) in c.components() {
                    let (inner_factor, inner_components) = self.expand(inner)?;
                    factor = factor.mul(&inner_factor.pow(exp)?);
                    for (base, base_exp) in inner_components {
                        let total = components.entry(base).or_insert(0i32);
                        *total = base_exp
                            .checked_mul(exp)
                            .and_then(|scaled| total.checked_add(scaled))
                            .ok_or(ConversionError::ExponentOverflow)?;
                    }
                }
                components.retain(|_, exp| *exp != 0);
                Ok((factor, components))
            }
        }
    }

    fn ratio_to_references(
        &mut self,
        components: &BTreeMap<Unit, i32>,
        references: &BTreeMap<Dimension, Unit>,
    ) -> Result<ExactNumber, ConversionError> {
        let mut ratio = ExactNumber::ONE;
        for (unit, &exp) in components {
            let reference = base_dimension(unit)
                .and_then(|d| references.get(&d))
                .ok_or_else(|| no_path(unit, unit))?;
            let transform = self.lookup(unit, reference)?;
            if !transform.is_linear() {
                return Err(ConversionError::NonLinearConversion {
                    subject: unit.to_string(),
                    exponent: exp,
                });
            }
            ratio = ratio.mul(transform.pow(exp)?.ratio());
        }
        Ok(ratio)
    }

    /// Store a pair in both directions and close the component over it
    fn connect(
        &mut self,
        source: &Unit,
        target: &Unit,
        transform: ConversionTransform,
    ) -> Result<(), ConversionError> {
        let into_source = self.incoming(source, target);
        let out_of_target = self.outgoing(target, source);

        let reverse = transform.reciprocal()?;
        self.insert_pair(source, target, transform.clone(), reverse);
        self.refresh_closure(source)?;
        self.refresh_closure(target)?;

        // Join the two former neighbourhoods through the new edge
        for (a, a_to_source) in &into_source {
            let a_to_target = a_to_source.reduce(&transform);
            for (b, target_to_b) in &out_of_target {
                if a == b || self.contains(a, b) {
                    continue;
                }
                let a_to_b = a_to_target.reduce(target_to_b);
                let b_to_a = a_to_b.reciprocal()?;
                trace!(source = %a, target = %b, transform = %a_to_b, "joined conversion");
                self.insert_pair(a, b, a_to_b, b_to_a);
            }
        }
        Ok(())
    }

    /// For every neighbour X of `unit` and every neighbour Y of X, store
    /// `unit → Y` through X unless a transform is already stored
    fn refresh_closure(&mut self, unit: &Unit) -> Result<(), ConversionError> {
        let mut reachable = Vec::new();
        if let Some(direct) = self.table.get(unit) {
            for (via, unit_to_via) in direct {
                let Some(onward) = self.table.get(via) else { continue };
                for (next, via_to_next) in onward {
                    if next != unit && !direct.contains_key(next) {
                        reachable.push((next.clone(), unit_to_via.reduce(via_to_next)));
                    }
                }
            }
        }

        for (next, transform) in reachable {
            if self.contains(unit, &next) {
                continue;
            }
            let reverse = transform.reciprocal()?;
            trace!(source = %unit, target = %next, %transform, "closure conversion");
            self.insert_pair(unit, &next, transform, reverse);
        }
        Ok(())
    }

    /// `(neighbour, neighbour → unit)` for every neighbour except `exclude`
    fn incoming(&self, unit: &Unit, exclude: &Unit) -> Vec<(Unit, ConversionTransform)> {
        self.neighbours(unit, exclude)
            .filter_map(|n| self.get(&n, unit).map(|t| (n, t.clone())))
            .collect()
    }

    /// `(neighbour, unit → neighbour)` for every neighbour except `exclude`
    fn outgoing(&self, unit: &Unit, exclude: &Unit) -> Vec<(Unit, ConversionTransform)> {
        self.neighbours(unit, exclude)
            .filter_map(|n| self.get(unit, &n).map(|t| (n, t.clone())))
            .collect()
    }

    fn neighbours<'a>(&'a self, unit: &Unit, exclude: &'a Unit) -> impl Iterator<Item = Unit> + 'a {
        self.table
            .get(unit)
            .into_iter()
            .flat_map(|m| m.keys())
            .filter(move |n| *n != exclude)
            .cloned()
    }

    fn insert_pair(
        &mut self,
        source: &Unit,
        target: &Unit,
        forward: ConversionTransform,
        reverse: ConversionTransform,
    ) {
        self.table.entry(source.clone()).or_default().insert(target.clone(), forward);
        self.table.entry(target.clone()).or_default().insert(source.clone(), reverse);
    }
}

fn check_dimensions(source: &Unit, target: &Unit) -> Result<(), ConversionError> {
    let from_dim = source.dimensions();
    let to_dim = target.dimensions();
    if from_dim != to_dim {
        return Err(ConversionError::IncompatibleDimensions {
            from: source.to_string(),
            to: target.to_string(),
            from_dim,
            to_dim,
        });
    }
    Ok(())
}

fn no_path(source: &Unit, target: &Unit) -> ConversionError {
    ConversionError::NoConversionPath {
        from: source.to_string(),
        to: target.to_string(),
    }
}

fn base_dimension(unit: &Unit) -> Option<Dimension> {
    match unit {
        Unit::Base(b) => Some(b.dimension().clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> ExactNumber {
        s.parse().unwrap()
    }

    fn linear(ratio: &str) -> ConversionTransform {
        ConversionTransform::linear(n(ratio)).unwrap()
    }

    fn length(symbol: &'static str) -> Unit {
        Unit::base_static(symbol, Dimension::LENGTH)
    }

    fn time(symbol: &'static str) -> Unit {
        Unit::base_static(symbol, Dimension::TIME)
    }

    fn kilo() -> Prefix {
        Prefix::from_static("kilo", "k")
    }

    fn imperial() -> ConversionRegistry {
        let mut registry = ConversionRegistry::new();
        registry.register(&length("in"), &length("m"), linear("0.0254")).unwrap();
        registry.register(&length("ft"), &length("in"), linear("12")).unwrap();
        registry
    }

    #[test]
    fn test_closure_on_registration() {
        let mut registry = imperial();
        assert!(registry.contains(&length("ft"), &length("m")));
        assert!(registry.contains(&length("m"), &length("ft")));
        assert_eq!(registry.len(), 6);

        let ft_to_m = registry.lookup(&length("ft"), &length("m")).unwrap();
        assert_eq!(ft_to_m.ratio(), &n("0.3048"));

        let m_to_ft = registry.lookup(&length("m"), &length("ft")).unwrap();
        assert_eq!(m_to_ft.ratio(), &ExactNumber::from_ratio(1250, 381).unwrap());
        assert!(ft_to_m.reduce(&m_to_ft).is_identity());
    }

    #[test]
    fn test_symmetric_after_registration() {
        let registry = imperial();
        for (a, b) in [("in", "m"), ("ft", "in"), ("ft", "m")] {
            let forward = registry.get(&length(a), &length(b)).unwrap();
            let reverse = registry.get(&length(b), &length(a)).unwrap();
            assert!(forward.reduce(reverse).is_identity(), "{} <-> {}", a, b);
        }
    }

    #[test]
    fn test_join_connects_components() {
        let mut registry = ConversionRegistry::new();
        registry.register(&length("a"), &length("b"), linear("2")).unwrap();
        registry.register(&length("c"), &length("d"), linear("3")).unwrap();
        assert!(!registry.contains(&length("a"), &length("d")));

        registry.register(&length("b"), &length("c"), linear("5")).unwrap();
        assert_eq!(registry.get(&length("a"), &length("d")).unwrap().ratio(), &n("30"));
        assert_eq!(registry.get(&length("d"), &length("a")).unwrap().ratio(), &n("1/30"));
        assert_eq!(registry.get(&length("b"), &length("d")).unwrap().ratio(), &n("15"));
        assert_eq!(registry.get(&length("c"), &length("a")).unwrap().ratio(), &n("1/10"));
        assert_eq!(registry.len(), 12);
    }

    #[test]
    fn test_overwrite_keeps_derived_entries() {
        let mut registry = imperial();
        registry.register(&length("in"), &length("m"), linear("0.025")).unwrap();

        assert_eq!(registry.get(&length("in"), &length("m")).unwrap().ratio(), &n("0.025"));
        assert_eq!(registry.get(&length("m"), &length("in")).unwrap().ratio(), &n("40"));
        // ft -> m was derived from the old in -> m and is not refreshed
        assert_eq!(registry.get(&length("ft"), &length("m")).unwrap().ratio(), &n("0.3048"));
    }

    #[test]
    fn test_self_and_mismatch() {
        let mut registry = ConversionRegistry::new();
        registry.register(&length("m"), &length("m"), linear("2")).unwrap();
        assert!(registry.is_empty());
        assert!(registry.lookup(&length("m"), &length("m")).unwrap().is_identity());

        let err = registry.register(&length("m"), &time("s"), linear("1")).unwrap_err();
        assert!(matches!(err, ConversionError::IncompatibleDimensions { .. }));
        let err = registry.lookup(&length("m"), &time("s")).unwrap_err();
        assert!(matches!(err, ConversionError::IncompatibleDimensions { .. }));
    }

    #[test]
    fn test_no_path() {
        let mut registry = imperial();
        let err = registry.lookup(&length("m"), &length("furlong")).unwrap_err();
        assert!(matches!(err, ConversionError::NoConversionPath { .. }));
        assert_eq!(registry.lookup_cached(&length("m"), &length("furlong")), Ok(None));
    }

    #[test]
    fn test_prefix_derivation() {
        let mut registry = imperial();
        registry.register_prefix(kilo(), n("1000")).unwrap();
        registry.register_prefix(Prefix::from_static("milli", "m"), n("0.001")).unwrap();
        let km = length("m").with_prefix(kilo()).unwrap();
        let mm = length("m").with_prefix(Prefix::from_static("milli", "m")).unwrap();

        assert_eq!(registry.lookup(&km, &length("m")).unwrap().ratio(), &n("1000"));
        assert_eq!(registry.lookup(&length("m"), &km).unwrap().ratio(), &n("0.001"));
        assert_eq!(registry.lookup(&km, &mm).unwrap().ratio(), &n("1000000"));
        assert_eq!(registry.lookup(&mm, &length("in")).unwrap().ratio(), &n("5/127"));

        // Cached with its closure
        assert!(registry.contains(&km, &length("ft")));
        assert_eq!(registry.lookup_cached(&km, &length("in")).unwrap().unwrap().ratio(), &n("1000/0.0254"));
    }

    #[test]
    fn test_unknown_prefix_factor() {
        let mut registry = imperial();
        let km = length("m").with_prefix(kilo()).unwrap();
        let err = registry.lookup(&km, &length("m")).unwrap_err();
        assert!(matches!(err, ConversionError::NoConversionPath { .. }));
        assert_eq!(registry.register_prefix(kilo(), ExactNumber::ZERO), Err(ConversionError::ZeroRatio));
    }

    #[test]
    fn test_composite_derivation() {
        let mut registry = ConversionRegistry::new();
        registry.register_prefix(kilo(), n("1000")).unwrap();
        registry.register(&time("min"), &time("s"), linear("60")).unwrap();
        registry.register(&time("h"), &time("min"), linear("60")).unwrap();

        let km = length("m").with_prefix(kilo()).unwrap();
        let meters_per_second = length("m").divide(&time("s")).unwrap();
        let km_per_hour = km.divide(&time("h")).unwrap();

        let transform = registry.lookup(&meters_per_second, &km_per_hour).unwrap();
        assert_eq!(transform.ratio(), &n("3.6"));
        assert!(transform.is_linear());
        assert!(registry.contains(&km_per_hour, &meters_per_second));
        assert_eq!(registry.lookup(&km_per_hour, &meters_per_second).unwrap().ratio(), &n("1/3.6"));
    }

    #[test]
    fn test_prefixed_composite_and_powers() {
        let mut registry = imperial();
        registry.register_prefix(kilo(), n("1000")).unwrap();

        let square_feet = length("ft").pow(2).unwrap();
        let square_meters = length("m").pow(2).unwrap();
        assert_eq!(registry.lookup(&square_feet, &square_meters).unwrap().ratio(), &n("0.09290304"));

        let per_meter = length("m").inverse().unwrap();
        let scaled = per_meter.with_prefix(kilo()).unwrap();
        assert_eq!(registry.lookup(&scaled, &per_meter).unwrap().ratio(), &n("1000"));
        assert_eq!(registry.lookup(&scaled, &length("in").inverse().unwrap()).unwrap().ratio(), &n("25.4"));
    }

    #[test]
    fn test_offset_rejected_in_composite() {
        let celsius = Unit::base_static("°C", Dimension::TEMPERATURE);
        let kelvin = Unit::base_static("K", Dimension::TEMPERATURE);
        let mut registry = ConversionRegistry::new();
        registry
            .register(&celsius, &kelvin, ConversionTransform::new(n("1"), n("273.15")).unwrap())
            .unwrap();

        let err = registry
            .lookup(&celsius.divide(&time("s")).unwrap(), &kelvin.divide(&time("s")).unwrap())
            .unwrap_err();
        assert!(matches!(err, ConversionError::NonLinearConversion { .. }));
        let err = registry.lookup(&celsius.pow(2).unwrap(), &kelvin.pow(2).unwrap()).unwrap_err();
        assert!(matches!(err, ConversionError::NonLinearConversion { exponent: 2, .. }));
    }

    #[test]
    fn test_expansion_exponent_overflow() {
        let mut registry = imperial();
        registry.register_prefix(kilo(), n("1000")).unwrap();

        // Dimensionless overall, but m alone reaches 2^31 once expanded
        let big = 1 << 30;
        let ratio = length("m").pow(big).unwrap().divide(&length("ft").pow(big).unwrap()).unwrap();
        let squared = ratio.with_prefix(kilo()).unwrap().pow(2).unwrap();
        assert!(squared.is_dimensionless());
        assert_eq!(registry.lookup(&squared, &Unit::one()), Err(ConversionError::ExponentOverflow));
    }
}
