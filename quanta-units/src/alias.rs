//! Human-readable names for dimensions, prefixes and units
//!
//! Aliases are scoped by an [`AliasType`], so "m" as a symbol and "m" as an
//! english name are different keys. Registering a prefix alias or a
//! standard-unit alias also generates the prefixed-unit aliases it combines
//! into ("kilo" + "meter" = "kilometer").

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::Hash;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::{ConversionError, Dimension, Prefix, PrefixedUnit, Unit};

/// Category of an alias ("english-name", "symbol", ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasType(Cow<'static, str>);

impl AliasType {
    pub const ENGLISH_NAME: AliasType = AliasType::from_static("english-name");
    pub const ENGLISH_PLURAL: AliasType = AliasType::from_static("english-plural");
    pub const SYMBOL: AliasType = AliasType::from_static("symbol");

    pub const fn from_static(id: &'static str) -> Self {
        AliasType(Cow::Borrowed(id))
    }

    pub fn new(id: impl Into<String>) -> Self {
        AliasType(Cow::Owned(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AliasType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Alias {
    alias_type: AliasType,
    text: String,
}

impl Alias {
    pub fn new(alias_type: AliasType, text: impl Into<String>) -> Self {
        Alias { alias_type, text: text.into() }
    }

    pub fn name(text: impl Into<String>) -> Self {
        Self::new(AliasType::ENGLISH_NAME, text)
    }

    pub fn plural(text: impl Into<String>) -> Self {
        Self::new(AliasType::ENGLISH_PLURAL, text)
    }

    pub fn symbol(text: impl Into<String>) -> Self {
        Self::new(AliasType::SYMBOL, text)
    }

    pub fn alias_type(&self) -> &AliasType {
        &self.alias_type
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.text, self.alias_type)
    }
}

/// Bidirectional owner/alias table; an alias belongs to at most one owner
#[derive(Debug, Clone)]
struct AliasTable<T> {
    forward: HashMap<T, BTreeSet<Alias>>,
    reverse: HashMap<Alias, T>,
}

impl<T> Default for AliasTable<T> {
    fn default() -> Self {
        AliasTable { forward: HashMap::new(), reverse: HashMap::new() }
    }
}

impl<T: Clone + Eq + Hash + fmt::Display> AliasTable<T> {
    /// `Ok(false)` when the pair is already present
    fn insert(&mut self, owner: &T, alias: Alias) -> Result<bool, ConversionError> {
        match self.reverse.get(&alias) {
            Some(existing) if existing == owner => return Ok(false),
            Some(existing) => {
                return Err(ConversionError::AliasConflict {
                    alias: alias.to_string(),
                    existing: existing.to_string(),
                })
            }
            None => {}
        }
        self.forward.entry(owner.clone()).or_default().insert(alias.clone());
        self.reverse.insert(alias, owner.clone());
        Ok(true)
    }

    fn find(&self, alias: &Alias) -> Option<&T> {
        self.reverse.get(alias)
    }

    fn aliases(&self, owner: &T, alias_type: Option<&AliasType>) -> BTreeSet<Alias> {
        self.forward
            .get(owner)
            .into_iter()
            .flatten()
            .filter(|a| alias_type.map_or(true, |t| a.alias_type() == t))
            .cloned()
            .collect()
    }

    /// Every `(owner, alias)` pair whose alias has type `alias_type`
    fn of_type<'a>(&'a self, alias_type: &'a AliasType) -> impl Iterator<Item = (&'a T, &'a Alias)> + 'a {
        self.reverse
            .iter()
            .filter(move |(alias, _)| alias.alias_type() == alias_type)
            .map(|(alias, owner)| (owner, alias))
    }
}

#[derive(Debug, Clone, Default)]
pub struct AliasRegistry {
    dimensions: AliasTable<Dimension>,
    prefixes: AliasTable<Prefix>,
    units: AliasTable<Unit>,
    prefixed_units: AliasTable<PrefixedUnit>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_dimension_alias(&mut self, dimension: &Dimension, alias: Alias) -> Result<bool, ConversionError> {
        self.dimensions.insert(dimension, alias)
    }

    /// Register a prefix alias and combine it with every standard-unit alias of the same type
    pub fn register_prefix_alias(&mut self, prefix: &Prefix, alias: Alias) -> Result<bool, ConversionError> {
        if !self.prefixes.insert(prefix, alias.clone())? {
            return Ok(false);
        }

        let combined: Vec<(PrefixedUnit, Alias)> = self
            .units
            .of_type(alias.alias_type())
            .map(|(unit, unit_alias)| {
                (
                    PrefixedUnit::new_unchecked(prefix.clone(), unit.clone()),
                    combine(&alias, unit_alias),
                )
            })
            .collect();
        self.propagate(combined);
        Ok(true)
    }

    /// Register an alias for a unit
    ///
    /// Standard-unit aliases are combined with every prefix alias of the
    /// same type. Prefixed units go straight to the prefixed-unit table.
    pub fn register_unit_alias(&mut self, unit: &Unit, alias: Alias) -> Result<bool, ConversionError> {
        if let Unit::Prefixed(prefixed) = unit {
            return self.register_prefixed_unit_alias(prefixed, alias);
        }
        if !self.units.insert(unit, alias.clone())? {
            return Ok(false);
        }

        let combined: Vec<(PrefixedUnit, Alias)> = self
            .prefixes
            .of_type(alias.alias_type())
            .map(|(prefix, prefix_alias)| {
                (
                    PrefixedUnit::new_unchecked(prefix.clone(), unit.clone()),
                    combine(prefix_alias, &alias),
                )
            })
            .collect();
        self.propagate(combined);
        Ok(true)
    }

    pub fn register_prefixed_unit_alias(&mut self, unit: &PrefixedUnit, alias: Alias) -> Result<bool, ConversionError> {
        self.prefixed_units.insert(unit, alias)
    }

    fn propagate(&mut self, combined: Vec<(PrefixedUnit, Alias)>) {
        for (unit, alias) in combined {
            if let Err(e) = self.prefixed_units.insert(&unit, alias) {
                debug!(unit = %unit, error = %e, "skipping generated alias");
            }
        }
    }

    pub fn find_dimension(&self, alias: &Alias) -> Option<Dimension> {
        self.dimensions.find(alias).cloned()
    }

    pub fn find_prefix(&self, alias: &Alias) -> Option<Prefix> {
        self.prefixes.find(alias).cloned()
    }

    /// Standard units first, then prefixed units, then prefix + unit decomposition
    pub fn find_unit(&self, alias: &Alias) -> Option<Unit> {
        if let Some(unit) = self.units.find(alias) {
            return Some(unit.clone());
        }
        if let Some(unit) = self.prefixed_units.find(alias) {
            return Some(Unit::Prefixed(unit.clone()));
        }
        self.decompose(alias)
    }

    /// Split the text into a prefix alias and a standard-unit alias, longest prefix first
    fn decompose(&self, alias: &Alias) -> Option<Unit> {
        let text = alias.text();
        text.char_indices()
            .map(|(i, _)| i)
            .filter(|&i| i > 0)
            .rev()
            .find_map(|split| {
                let (head, tail) = text.split_at(split);
                let prefix = self.prefixes.find(&Alias::new(alias.alias_type().clone(), head))?;
                let unit = self.units.find(&Alias::new(alias.alias_type().clone(), tail))?;
                Some(Unit::Prefixed(PrefixedUnit::new_unchecked(prefix.clone(), unit.clone())))
            })
    }

    pub fn dimension_aliases(&self, dimension: &Dimension, alias_type: Option<&AliasType>) -> BTreeSet<Alias> {
        self.dimensions.aliases(dimension, alias_type)
    }

    pub fn prefix_aliases(&self, prefix: &Prefix, alias_type: Option<&AliasType>) -> BTreeSet<Alias> {
        self.prefixes.aliases(prefix, alias_type)
    }

    pub fn unit_aliases(&self, unit: &Unit, alias_type: Option<&AliasType>) -> BTreeSet<Alias> {
        match unit {
            Unit::Prefixed(prefixed) => self.prefixed_units.aliases(prefixed, alias_type),
            _ => self.units.aliases(unit, alias_type),
        }
    }
}

fn combine(prefix_alias: &Alias, unit_alias: &Alias) -> Alias {
    Alias::new(
        unit_alias.alias_type().clone(),
        format!("{}{}", prefix_alias.text(), unit_alias.text()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meter() -> Unit {
        Unit::base_static("m", Dimension::LENGTH)
    }

    fn kilo() -> Prefix {
        Prefix::from_static("kilo", "k")
    }

    fn kilometer() -> Unit {
        meter().with_prefix(kilo()).unwrap()
    }

    #[test]
    fn test_propagation_prefix_after_unit() {
        let mut aliases = AliasRegistry::new();
        assert_eq!(aliases.register_unit_alias(&meter(), Alias::name("meter")), Ok(true));
        assert_eq!(aliases.register_prefix_alias(&kilo(), Alias::name("kilo")), Ok(true));

        assert_eq!(aliases.find_unit(&Alias::name("kilometer")), Some(kilometer()));
        assert!(aliases.unit_aliases(&kilometer(), None).contains(&Alias::name("kilometer")));
    }

    #[test]
    fn test_propagation_unit_after_prefix() {
        let mut aliases = AliasRegistry::new();
        aliases.register_prefix_alias(&kilo(), Alias::name("kilo")).unwrap();
        aliases.register_unit_alias(&meter(), Alias::name("meter")).unwrap();

        assert_eq!(aliases.find_unit(&Alias::name("kilometer")), Some(kilometer()));
        assert_eq!(
            aliases.unit_aliases(&kilometer(), Some(&AliasType::ENGLISH_NAME)),
            BTreeSet::from([Alias::name("kilometer")])
        );
    }

    #[test]
    fn test_propagation_respects_alias_type() {
        let mut aliases = AliasRegistry::new();
        aliases.register_unit_alias(&meter(), Alias::name("meter")).unwrap();
        aliases.register_unit_alias(&meter(), Alias::symbol("m")).unwrap();
        aliases.register_prefix_alias(&kilo(), Alias::symbol("k")).unwrap();

        assert_eq!(aliases.find_unit(&Alias::symbol("km")), Some(kilometer()));
        assert_eq!(aliases.find_unit(&Alias::symbol("kmeter")), None);
        assert_eq!(aliases.find_unit(&Alias::name("km")), None);
        assert_eq!(aliases.unit_aliases(&kilometer(), None).len(), 1);
    }

    #[test]
    fn test_idempotent_and_conflict() {
        let mut aliases = AliasRegistry::new();
        let second = Unit::base_static("s", Dimension::TIME);
        assert_eq!(aliases.register_unit_alias(&meter(), Alias::symbol("m")), Ok(true));
        assert_eq!(aliases.register_unit_alias(&meter(), Alias::symbol("m")), Ok(false));

        let err = aliases.register_unit_alias(&second, Alias::symbol("m")).unwrap_err();
        assert!(matches!(err, ConversionError::AliasConflict { .. }));
        assert_eq!(aliases.find_unit(&Alias::symbol("m")), Some(meter()));
        assert!(aliases.unit_aliases(&second, None).is_empty());
    }

    #[test]
    fn test_generated_conflict_is_skipped() {
        let mut aliases = AliasRegistry::new();
        let are = Unit::base_static("am", Dimension::new("area-ish"));
        let deci = Prefix::from_static("deci", "d");
        let deca = Prefix::from_static("deca", "da");
        aliases.register_unit_alias(&meter(), Alias::symbol("m")).unwrap();
        aliases.register_unit_alias(&are, Alias::symbol("am")).unwrap();
        aliases.register_prefix_alias(&deci, Alias::symbol("d")).unwrap();

        // "da" + "m" collides with the generated "d" + "am"
        assert_eq!(aliases.register_prefix_alias(&deca, Alias::symbol("da")), Ok(true));
        assert_eq!(
            aliases.find_unit(&Alias::symbol("dam")),
            Some(are.with_prefix(deci.clone()).unwrap())
        );
        assert!(aliases.unit_aliases(&meter().with_prefix(deca).unwrap(), None).is_empty());
    }

    #[test]
    fn test_decompose_longest_prefix_first() {
        let mut aliases = AliasRegistry::new();
        let deca = Prefix::from_static("deca", "da");
        aliases.register_prefix_alias(&Prefix::from_static("deci", "d"), Alias::symbol("d")).unwrap();
        aliases.register_prefix_alias(&deca, Alias::symbol("da")).unwrap();
        aliases.units.insert(&meter(), Alias::symbol("m")).unwrap();
        aliases.units.insert(&Unit::base_static("am", Dimension::new("area-ish")), Alias::symbol("am")).unwrap();

        // nothing was propagated, so lookups fall back to decomposition
        assert_eq!(
            aliases.find_unit(&Alias::symbol("dam")),
            Some(meter().with_prefix(deca).unwrap())
        );
        assert_eq!(aliases.find_unit(&Alias::symbol("xm")), None);
    }

    #[test]
    fn test_decompose_multibyte_prefix() {
        let mut aliases = AliasRegistry::new();
        let micro = Prefix::from_static("micro", "μ");
        aliases.prefixes.insert(&micro, Alias::symbol("μ")).unwrap();
        aliases.units.insert(&meter(), Alias::symbol("m")).unwrap();

        assert_eq!(aliases.find_unit(&Alias::symbol("μm")), Some(meter().with_prefix(micro).unwrap()));
        assert_eq!(aliases.find_unit(&Alias::symbol("μ")), None);
        assert_eq!(aliases.find_unit(&Alias::symbol("")), None);
    }

    #[test]
    fn test_dimension_and_prefix_lookup() {
        let mut aliases = AliasRegistry::new();
        aliases.register_dimension_alias(&Dimension::LENGTH, Alias::name("length")).unwrap();
        aliases.register_dimension_alias(&Dimension::LENGTH, Alias::name("distance")).unwrap();
        aliases.register_prefix_alias(&kilo(), Alias::symbol("k")).unwrap();

        assert_eq!(aliases.find_dimension(&Alias::name("distance")), Some(Dimension::LENGTH));
        assert_eq!(aliases.find_prefix(&Alias::symbol("k")), Some(kilo()));
        assert_eq!(aliases.find_prefix(&Alias::name("k")), None);
        assert_eq!(aliases.dimension_aliases(&Dimension::LENGTH, None).len(), 2);
        assert_eq!(aliases.prefix_aliases(&kilo(), Some(&AliasType::ENGLISH_NAME)).len(), 0);
    }
}
