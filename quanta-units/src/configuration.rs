//! Configuration - the aggregate that owns a conversion graph and its aliases
//!
//! A `Configuration` is safe to share between threads. Registration takes the
//! write lock of the table it touches for the whole update, so readers never
//! see a half-built closure.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use parking_lot::RwLock;
use tracing::debug;
use quanta_core::ExactNumber;

use crate::{
    Alias, AliasRegistry, AliasType, ConversionError, ConversionRegistry, ConversionTransform, Dimension,
    DimensionVector, Prefix, Quantity, Unit,
};

/// Anything that can carry aliases
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AliasOwner {
    Dimension(Dimension),
    Prefix(Prefix),
    Unit(Unit),
}

impl From<Dimension> for AliasOwner {
    fn from(dimension: Dimension) -> Self {
        AliasOwner::Dimension(dimension)
    }
}

impl From<Prefix> for AliasOwner {
    fn from(prefix: Prefix) -> Self {
        AliasOwner::Prefix(prefix)
    }
}

impl From<Unit> for AliasOwner {
    fn from(unit: Unit) -> Self {
        AliasOwner::Unit(unit)
    }
}

/// Alias types tried by [`Configuration::find_unit_by_text`], in order
const TEXT_SEARCH_ORDER: [AliasType; 3] = [AliasType::SYMBOL, AliasType::ENGLISH_NAME, AliasType::ENGLISH_PLURAL];

#[derive(Debug, Default)]
pub struct Configuration {
    name: String,
    conversions: RwLock<ConversionRegistry>,
    aliases: RwLock<AliasRegistry>,
    preferred_units: RwLock<HashMap<DimensionVector, Unit>>,
    unit_groups: RwLock<HashMap<Unit, String>>,
}

impl Configuration {
    pub fn new(name: impl Into<String>) -> Self {
        Configuration {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn builder(name: impl Into<String>) -> ConfigurationBuilder {
        ConfigurationBuilder {
            configuration: Configuration::new(name),
            error: None,
        }
    }

    /// The process-wide standard configuration, built on first use
    pub fn standard() -> &'static Configuration {
        &crate::units::STANDARD
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ========== Registration ==========

    pub fn register_prefix(&self, prefix: Prefix, factor: ExactNumber) -> Result<(), ConversionError> {
        self.conversions.write().register_prefix(prefix, factor)
    }

    pub fn register(&self, source: &Unit, target: &Unit, transform: ConversionTransform) -> Result<(), ConversionError> {
        self.conversions.write().register(source, target, transform)
    }

    /// Register all aliases or none of them
    ///
    /// The first conflict is returned and the alias tables are left as they were.
    pub fn register_alias(
        &self,
        owner: impl Into<AliasOwner>,
        aliases: impl IntoIterator<Item = Alias>,
    ) -> Result<(), ConversionError> {
        let owner = owner.into();
        let mut registry = self.aliases.write();
        let mut staged = registry.clone();
        for alias in aliases {
            let added = match &owner {
                AliasOwner::Dimension(d) => staged.register_dimension_alias(d, alias)?,
                AliasOwner::Prefix(p) => staged.register_prefix_alias(p, alias)?,
                AliasOwner::Unit(u) => staged.register_unit_alias(u, alias)?,
            };
            if !added {
                debug!(owner = ?owner, "alias already registered");
            }
        }
        *registry = staged;
        Ok(())
    }

    /// Make `unit` the preferred unit of its dimensions
    pub fn register_preferred_unit(&self, unit: Unit) {
        self.preferred_units.write().insert(unit.dimensions(), unit);
    }

    pub fn register_unit_group(&self, unit: Unit, group: impl Into<String>) {
        self.unit_groups.write().insert(unit, group.into());
    }

    // ========== Conversion ==========

    pub fn lookup(&self, source: &Unit, target: &Unit) -> Result<ConversionTransform, ConversionError> {
        let cached = self.conversions.read().lookup_cached(source, target)?;
        if let Some(transform) = cached {
            return Ok(transform);
        }
        self.conversions.write().lookup(source, target)
    }

    pub fn convert(&self, quantity: &Quantity, target: &Unit) -> Result<Quantity, ConversionError> {
        let transform = self.lookup(quantity.unit(), target)?;
        Ok(Quantity::new(transform.apply(quantity.value()), target.clone()))
    }

    /// Convert to the preferred unit of the quantity's dimensions, if one is registered
    pub fn to_preferred(&self, quantity: &Quantity) -> Result<Quantity, ConversionError> {
        match self.preferred_unit(&quantity.dimensions()) {
            Some(unit) => self.convert(quantity, &unit),
            None => Ok(quantity.clone()),
        }
    }

    /// Re-express the quantity in the unit of its group that reads best
    ///
    /// Units outside any group are returned unchanged.
    pub fn simplify(&self, quantity: &Quantity) -> Quantity {
        let Some(group) = self.unit_group(quantity.unit()) else {
            return quantity.clone();
        };

        let mut best = quantity.clone();
        let mut best_score = score_value(quantity.value());

        for unit in self.units_in_group(&group) {
            if !unit.is_compatible(quantity.unit()) {
                continue;
            }
            if let Ok(converted) = self.convert(quantity, &unit) {
                let score = score_value(converted.value());
                if score > best_score {
                    best_score = score;
                    best = converted;
                }
            }
        }

        best
    }

    // ========== Lookup ==========

    pub fn find_unit(&self, alias: &Alias) -> Option<Unit> {
        self.aliases.read().find_unit(alias)
    }

    pub fn find_prefix(&self, alias: &Alias) -> Option<Prefix> {
        self.aliases.read().find_prefix(alias)
    }

    pub fn find_dimension(&self, alias: &Alias) -> Option<Dimension> {
        self.aliases.read().find_dimension(alias)
    }

    /// Find a unit by symbol, then english name, then english plural
    pub fn find_unit_by_text(&self, text: &str) -> Option<Unit> {
        let aliases = self.aliases.read();
        TEXT_SEARCH_ORDER
            .iter()
            .find_map(|t| aliases.find_unit(&Alias::new(t.clone(), text)))
    }

    pub fn require_unit(&self, text: &str) -> Result<Unit, ConversionError> {
        self.find_unit_by_text(text)
            .ok_or_else(|| ConversionError::UnitNotFound(text.to_string()))
    }

    pub fn aliases(&self, owner: &AliasOwner, alias_type: Option<&AliasType>) -> BTreeSet<Alias> {
        let aliases = self.aliases.read();
        match owner {
            AliasOwner::Dimension(d) => aliases.dimension_aliases(d, alias_type),
            AliasOwner::Prefix(p) => aliases.prefix_aliases(p, alias_type),
            AliasOwner::Unit(u) => aliases.unit_aliases(u, alias_type),
        }
    }

    pub fn preferred_unit(&self, dimensions: &DimensionVector) -> Option<Unit> {
        self.preferred_units.read().get(dimensions).cloned()
    }

    pub fn unit_group(&self, unit: &Unit) -> Option<String> {
        self.unit_groups.read().get(unit).cloned()
    }

    /// Members of `group`, in unit order
    pub fn units_in_group(&self, group: &str) -> Vec<Unit> {
        let mut units: Vec<Unit> = self
            .unit_groups
            .read()
            .iter()
            .filter(|(_, g)| g.as_str() == group)
            .map(|(u, _)| u.clone())
            .collect();
        units.sort();
        units
    }
}

/// Score a value based on how "nice" it is for display (1-1000 is ideal)
fn score_value(value: &ExactNumber) -> f64 {
    let abs_val = value.abs();
    if abs_val.is_zero() {
        return 1.0;
    }

    let approx = abs_val.to_f64();
    if !approx.is_finite() {
        return 10.0;
    }

    if (1.0..=1000.0).contains(&approx) {
        100.0 - (approx.log10() - 1.5).abs() * 10.0
    } else if (0.001..1.0).contains(&approx) {
        50.0 - approx.log10().abs() * 5.0
    } else if approx > 1000.0 && approx <= 1_000_000.0 {
        50.0 - (approx.log10() - 3.0) * 5.0
    } else {
        10.0
    }
}

/// Fluent construction of a [`Configuration`]; the first failing step is reported by `build`
#[derive(Debug)]
pub struct ConfigurationBuilder {
    configuration: Configuration,
    error: Option<ConversionError>,
}

impl ConfigurationBuilder {
    pub fn with_prefix(self, prefix: Prefix, factor: ExactNumber) -> Self {
        self.step(|c| c.register_prefix(prefix, factor))
    }

    pub fn with_conversion(self, source: Unit, target: Unit, transform: ConversionTransform) -> Self {
        self.step(|c| c.register(&source, &target, transform))
    }

    pub fn with_alias(self, owner: impl Into<AliasOwner>, aliases: impl IntoIterator<Item = Alias>) -> Self {
        self.step(|c| c.register_alias(owner, aliases))
    }

    pub fn with_preferred_unit(self, unit: Unit) -> Self {
        self.step(|c| {
            c.register_preferred_unit(unit);
            Ok(())
        })
    }

    pub fn with_unit_group(self, unit: Unit, group: impl Into<String>) -> Self {
        self.step(|c| {
            c.register_unit_group(unit, group);
            Ok(())
        })
    }

    pub fn build(self) -> Result<Configuration, ConversionError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.configuration),
        }
    }

    fn step(mut self, f: impl FnOnce(&Configuration) -> Result<(), ConversionError>) -> Self {
        if self.error.is_none() {
            if let Err(e) = f(&self.configuration) {
                self.error = Some(e);
            }
        }
        self
    }
}

/// Named configurations plus one distinguished default
///
/// Configurations are never removed. Inserting a name that is already
/// present keeps the existing configuration.
#[derive(Debug)]
pub struct ConfigurationCatalog {
    configurations: HashMap<String, Arc<Configuration>>,
    default_name: String,
}

impl ConfigurationCatalog {
    /// A catalog whose default is `default`
    pub fn new(default: Configuration) -> Self {
        let default_name = default.name().to_string();
        let configurations = HashMap::from([(default_name.clone(), Arc::new(default))]);
        ConfigurationCatalog { configurations, default_name }
    }

    /// Add a configuration, returning the one now registered under its name
    pub fn insert(&mut self, configuration: Configuration) -> Arc<Configuration> {
        let name = configuration.name().to_string();
        if let Some(existing) = self.configurations.get(&name) {
            debug!(name = %name, "configuration already in catalog");
            return Arc::clone(existing);
        }
        let configuration = Arc::new(configuration);
        self.configurations.insert(name, Arc::clone(&configuration));
        configuration
    }

    pub fn get(&self, name: &str) -> Result<Arc<Configuration>, ConversionError> {
        self.configurations
            .get(name)
            .cloned()
            .ok_or_else(|| ConversionError::ConfigurationNotFound(name.to_string()))
    }

    pub fn default_configuration(&self) -> Arc<Configuration> {
        // The default name always refers to an inserted configuration
        match self.configurations.get(&self.default_name) {
            Some(configuration) => Arc::clone(configuration),
            None => Arc::new(Configuration::new(self.default_name.clone())),
        }
    }

    pub fn set_default(&mut self, name: &str) -> Result<(), ConversionError> {
        if !self.configurations.contains_key(name) {
            return Err(ConversionError::ConfigurationNotFound(name.to_string()));
        }
        self.default_name = name.to_string();
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.configurations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ConfigurationCatalog {
    /// A catalog whose default is a fresh standard configuration
    fn default() -> Self {
        Self::new(crate::units::standard_configuration())
    }
}
