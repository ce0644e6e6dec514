//! Standard unit definitions - SI and binary prefixes, SI base units and
//! common imperial, time, temperature and data units

use std::fmt;
use std::sync::LazyLock;
use tracing::error;
use quanta_core::ExactNumber;

use crate::{Alias, Configuration, ConversionError, ConversionTransform, Dimension, Prefix, Unit};

/// Standard configuration shared by the process
pub(crate) static STANDARD: LazyLock<Configuration> = LazyLock::new(standard_configuration);

// ========== Prefixes ==========

pub const QUECTO: Prefix = Prefix::from_static("quecto", "q");
pub const RONTO: Prefix = Prefix::from_static("ronto", "r");
pub const YOCTO: Prefix = Prefix::from_static("yocto", "y");
pub const ZEPTO: Prefix = Prefix::from_static("zepto", "z");
pub const ATTO: Prefix = Prefix::from_static("atto", "a");
pub const FEMTO: Prefix = Prefix::from_static("femto", "f");
pub const PICO: Prefix = Prefix::from_static("pico", "p");
pub const NANO: Prefix = Prefix::from_static("nano", "n");
pub const MICRO: Prefix = Prefix::from_static("micro", "μ");
pub const MILLI: Prefix = Prefix::from_static("milli", "m");
pub const CENTI: Prefix = Prefix::from_static("centi", "c");
pub const DECI: Prefix = Prefix::from_static("deci", "d");
pub const DECA: Prefix = Prefix::from_static("deca", "da");
pub const HECTO: Prefix = Prefix::from_static("hecto", "h");
pub const KILO: Prefix = Prefix::from_static("kilo", "k");
pub const MEGA: Prefix = Prefix::from_static("mega", "M");
pub const GIGA: Prefix = Prefix::from_static("giga", "G");
pub const TERA: Prefix = Prefix::from_static("tera", "T");
pub const PETA: Prefix = Prefix::from_static("peta", "P");
pub const EXA: Prefix = Prefix::from_static("exa", "E");
pub const ZETTA: Prefix = Prefix::from_static("zetta", "Z");
pub const YOTTA: Prefix = Prefix::from_static("yotta", "Y");
pub const RONNA: Prefix = Prefix::from_static("ronna", "R");
pub const QUETTA: Prefix = Prefix::from_static("quetta", "Q");

pub const KIBI: Prefix = Prefix::from_static("kibi", "Ki");
pub const MEBI: Prefix = Prefix::from_static("mebi", "Mi");
pub const GIBI: Prefix = Prefix::from_static("gibi", "Gi");
pub const TEBI: Prefix = Prefix::from_static("tebi", "Ti");
pub const PEBI: Prefix = Prefix::from_static("pebi", "Pi");
pub const EXBI: Prefix = Prefix::from_static("exbi", "Ei");
pub const ZEBI: Prefix = Prefix::from_static("zebi", "Zi");
pub const YOBI: Prefix = Prefix::from_static("yobi", "Yi");

/// SI prefixes with their power of ten
pub const SI_PREFIXES: [(Prefix, i32); 24] = [
    (QUECTO, -30),
    (RONTO, -27),
    (YOCTO, -24),
    (ZEPTO, -21),
    (ATTO, -18),
    (FEMTO, -15),
    (PICO, -12),
    (NANO, -9),
    (MICRO, -6),
    (MILLI, -3),
    (CENTI, -2),
    (DECI, -1),
    (DECA, 1),
    (HECTO, 2),
    (KILO, 3),
    (MEGA, 6),
    (GIGA, 9),
    (TERA, 12),
    (PETA, 15),
    (EXA, 18),
    (ZETTA, 21),
    (YOTTA, 24),
    (RONNA, 27),
    (QUETTA, 30),
];

/// Binary prefixes with their power of two
pub const BINARY_PREFIXES: [(Prefix, u32); 8] = [
    (KIBI, 10),
    (MEBI, 20),
    (GIBI, 30),
    (TEBI, 40),
    (PEBI, 50),
    (EXBI, 60),
    (ZEBI, 70),
    (YOBI, 80),
];

// ========== Units ==========

pub const METER: Unit = Unit::base_static("m", Dimension::LENGTH);
pub const GRAM: Unit = Unit::base_static("g", Dimension::MASS);
pub const SECOND: Unit = Unit::base_static("s", Dimension::TIME);
pub const AMPERE: Unit = Unit::base_static("A", Dimension::CURRENT);
pub const KELVIN: Unit = Unit::base_static("K", Dimension::TEMPERATURE);
pub const MOLE: Unit = Unit::base_static("mol", Dimension::AMOUNT);
pub const CANDELA: Unit = Unit::base_static("cd", Dimension::LUMINOSITY);
pub const BIT: Unit = Unit::base_static("bit", Dimension::INFORMATION);

pub const INCH: Unit = Unit::base_static("in", Dimension::LENGTH);
pub const FOOT: Unit = Unit::base_static("ft", Dimension::LENGTH);
pub const YARD: Unit = Unit::base_static("yd", Dimension::LENGTH);
pub const MILE: Unit = Unit::base_static("mi", Dimension::LENGTH);
pub const NAUTICAL_MILE: Unit = Unit::base_static("nmi", Dimension::LENGTH);

pub const POUND: Unit = Unit::base_static("lb", Dimension::MASS);
pub const OUNCE: Unit = Unit::base_static("oz", Dimension::MASS);
pub const STONE: Unit = Unit::base_static("st", Dimension::MASS);
pub const TONNE: Unit = Unit::base_static("t", Dimension::MASS);

pub const MINUTE: Unit = Unit::base_static("min", Dimension::TIME);
pub const HOUR: Unit = Unit::base_static("h", Dimension::TIME);
pub const DAY: Unit = Unit::base_static("d", Dimension::TIME);
pub const WEEK: Unit = Unit::base_static("wk", Dimension::TIME);

pub const CELSIUS: Unit = Unit::base_static("°C", Dimension::TEMPERATURE);
pub const FAHRENHEIT: Unit = Unit::base_static("°F", Dimension::TEMPERATURE);

pub const BYTE: Unit = Unit::base_static("B", Dimension::INFORMATION);

/// Build a fresh standard configuration
///
/// Definitions that fail to register are logged and skipped.
pub fn standard_configuration() -> Configuration {
    let config = Configuration::new("standard");
    register_dimensions(&config);
    register_prefixes(&config);
    register_length_units(&config);
    register_mass_units(&config);
    register_time_units(&config);
    register_temperature_units(&config);
    register_si_units(&config);
    register_data_units(&config);
    register_preferred_units(&config);
    config
}

fn register_dimensions(config: &Configuration) {
    let names = [
        (Dimension::LENGTH, "length"),
        (Dimension::MASS, "mass"),
        (Dimension::TIME, "time"),
        (Dimension::CURRENT, "electric current"),
        (Dimension::TEMPERATURE, "temperature"),
        (Dimension::AMOUNT, "amount of substance"),
        (Dimension::LUMINOSITY, "luminous intensity"),
        (Dimension::INFORMATION, "information"),
    ];
    for (dimension, name) in names {
        let result = config.register_alias(dimension.clone(), [Alias::name(name)]);
        check(result, "dimension", &dimension);
    }
}

fn register_prefixes(config: &Configuration) {
    for (prefix, exponent) in SI_PREFIXES {
        define_prefix(config, prefix, ExactNumber::from_decimal(1, -exponent));
    }
    for (prefix, bits) in BINARY_PREFIXES {
        define_prefix(config, prefix, ExactNumber::from(1u128 << bits));
    }
}

fn register_length_units(config: &Configuration) {
    define(config, &METER, "meter", "meters");
    define(config, &INCH, "inch", "inches");
    define(config, &FOOT, "foot", "feet");
    define(config, &YARD, "yard", "yards");
    define(config, &MILE, "mile", "miles");
    define(config, &NAUTICAL_MILE, "nautical mile", "nautical miles");

    linear(config, &INCH, &METER, "0.0254");
    linear(config, &FOOT, &INCH, "12");
    linear(config, &YARD, &FOOT, "3");
    linear(config, &MILE, &YARD, "1760");
    linear(config, &NAUTICAL_MILE, &METER, "1852");

    group(config, "metric-length", [METER, prefixed(&METER, KILO), prefixed(&METER, CENTI), prefixed(&METER, MILLI)]);
    group(config, "imperial-length", [INCH, FOOT, YARD, MILE]);
}

fn register_mass_units(config: &Configuration) {
    define(config, &GRAM, "gram", "grams");
    define(config, &POUND, "pound", "pounds");
    define(config, &OUNCE, "ounce", "ounces");
    define(config, &STONE, "stone", "stones");
    define(config, &TONNE, "tonne", "tonnes");

    linear(config, &POUND, &GRAM, "453.59237");
    linear(config, &OUNCE, &POUND, "1/16");
    linear(config, &STONE, &POUND, "14");
    linear(config, &TONNE, &GRAM, "1000000");

    group(config, "metric-mass", [prefixed(&GRAM, MILLI), GRAM, prefixed(&GRAM, KILO), TONNE]);
    group(config, "imperial-mass", [OUNCE, POUND, STONE]);
}

fn register_time_units(config: &Configuration) {
    define(config, &SECOND, "second", "seconds");
    define(config, &MINUTE, "minute", "minutes");
    define(config, &HOUR, "hour", "hours");
    define(config, &DAY, "day", "days");
    define(config, &WEEK, "week", "weeks");

    linear(config, &MINUTE, &SECOND, "60");
    linear(config, &HOUR, &MINUTE, "60");
    linear(config, &DAY, &HOUR, "24");
    linear(config, &WEEK, &DAY, "7");

    group(config, "time", [SECOND, MINUTE, HOUR, DAY, WEEK]);
}

fn register_temperature_units(config: &Configuration) {
    define(config, &KELVIN, "kelvin", "kelvins");
    define(config, &CELSIUS, "degree Celsius", "degrees Celsius");
    define(config, &FAHRENHEIT, "degree Fahrenheit", "degrees Fahrenheit");

    affine(config, &CELSIUS, &KELVIN, "1", "273.15");
    affine(config, &CELSIUS, &FAHRENHEIT, "1.8", "32");
}

fn register_si_units(config: &Configuration) {
    define(config, &AMPERE, "ampere", "amperes");
    define(config, &MOLE, "mole", "moles");
    define(config, &CANDELA, "candela", "candelas");
}

fn register_data_units(config: &Configuration) {
    define(config, &BIT, "bit", "bits");
    define(config, &BYTE, "byte", "bytes");

    linear(config, &BYTE, &BIT, "8");

    group(
        config,
        "data",
        [BYTE, prefixed(&BYTE, KILO), prefixed(&BYTE, MEGA), prefixed(&BYTE, GIGA), prefixed(&BYTE, TERA)],
    );
}

fn register_preferred_units(config: &Configuration) {
    for unit in [METER, prefixed(&GRAM, KILO), SECOND, AMPERE, KELVIN, MOLE, CANDELA, BIT] {
        config.register_preferred_unit(unit);
    }
}

// ========== Helpers ==========

fn define_prefix(config: &Configuration, prefix: Prefix, factor: ExactNumber) {
    let name = prefix.name().to_string();
    let aliases = [Alias::name(&name), Alias::plural(&name), Alias::symbol(prefix.symbol())];
    let result = config
        .register_prefix(prefix.clone(), factor)
        .and_then(|()| config.register_alias(prefix.clone(), aliases));
    check(result, "prefix", &prefix);
}

/// Register english name, plural and symbol aliases for a unit
fn define(config: &Configuration, unit: &Unit, name: &str, plural: &str) {
    let aliases = [Alias::name(name), Alias::plural(plural), Alias::symbol(unit.to_string())];
    check(config.register_alias(unit.clone(), aliases), "unit", unit);
}

fn linear(config: &Configuration, source: &Unit, target: &Unit, ratio: &str) {
    affine(config, source, target, ratio, "0");
}

fn affine(config: &Configuration, source: &Unit, target: &Unit, ratio: &str, offset: &str) {
    let result = parse_transform(ratio, offset).and_then(|t| config.register(source, target, t));
    check(result, "conversion", source);
}

fn parse_transform(ratio: &str, offset: &str) -> Result<ConversionTransform, ConversionError> {
    ConversionTransform::new(ratio.parse()?, offset.parse()?)
}

fn group<const N: usize>(config: &Configuration, name: &str, units: [Unit; N]) {
    for unit in units {
        config.register_unit_group(unit, name);
    }
}

/// Prefixed forms of standard units are always valid
fn prefixed(unit: &Unit, prefix: Prefix) -> Unit {
    Unit::Prefixed(crate::PrefixedUnit::new_unchecked(prefix, unit.clone()))
}

fn check(result: Result<(), ConversionError>, what: &str, subject: &dyn fmt::Display) {
    if let Err(e) = result {
        error!(what, subject = %subject, error = %e, "failed to load standard definition");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AliasOwner, AliasType, Quantity};

    fn n(s: &str) -> ExactNumber {
        s.parse().unwrap()
    }

    fn config() -> &'static Configuration {
        crate::init_test_logging();
        Configuration::standard()
    }

    #[test]
    fn test_prefix_factors() {
        let config = config();
        let km = prefixed(&METER, KILO);
        assert_eq!(config.lookup(&km, &METER).unwrap().ratio(), &n("1000"));
        let nm = prefixed(&METER, NANO);
        assert_eq!(config.lookup(&nm, &METER).unwrap().ratio(), &n("1e-9"));
        let kib = prefixed(&BYTE, KIBI);
        assert_eq!(config.lookup(&kib, &BYTE).unwrap().ratio(), &ExactNumber::from(1024));
        let yib = prefixed(&BYTE, YOBI);
        assert_eq!(
            config.lookup(&yib, &BYTE).unwrap().ratio(),
            &n("1208925819614629174706176")
        );
    }

    #[test]
    fn test_imperial_length() {
        let config = config();
        let km = config.require_unit("kilometers").unwrap();
        assert_eq!(config.lookup(&MILE, &km).unwrap().ratio(), &n("1.609344"));
        assert_eq!(config.lookup(&NAUTICAL_MILE, &FOOT).unwrap().ratio(), &n("1852/0.3048"));
        assert_eq!(config.lookup(&YARD, &INCH).unwrap().ratio(), &n("36"));
    }

    #[test]
    fn test_mass_and_time() {
        let config = config();
        let kg = config.require_unit("kg").unwrap();
        assert_eq!(config.lookup(&POUND, &kg).unwrap().ratio(), &n("0.45359237"));
        assert_eq!(config.lookup(&OUNCE, &GRAM).unwrap().ratio(), &n("28.349523125"));
        assert_eq!(config.lookup(&WEEK, &SECOND).unwrap().ratio(), &n("604800"));
    }

    #[test]
    fn test_temperature() {
        let config = config();
        let body = Quantity::new(n("98.6"), FAHRENHEIT);
        assert_eq!(config.convert(&body, &CELSIUS).unwrap().value(), &n("37"));
        let freezing = Quantity::new(32, FAHRENHEIT);
        assert_eq!(config.convert(&freezing, &KELVIN).unwrap().value(), &n("273.15"));
    }

    #[test]
    fn test_symbol_lookup_prefers_standard_units() {
        let config = config();
        assert_eq!(config.find_unit_by_text("min"), Some(MINUTE));
        assert_eq!(config.find_unit_by_text("cd"), Some(CANDELA));
        assert_eq!(config.find_unit_by_text("d"), Some(DAY));
        assert_eq!(config.find_unit_by_text("mm"), Some(prefixed(&METER, MILLI)));
        assert_eq!(config.find_unit_by_text("μs"), Some(prefixed(&SECOND, MICRO)));
        assert_eq!(config.find_unit_by_text("GiB"), Some(prefixed(&BYTE, GIBI)));
        assert_eq!(config.find_unit_by_text("degrees Celsius"), Some(CELSIUS));
        assert_eq!(config.find_prefix(&Alias::symbol("da")), Some(DECA));
    }

    #[test]
    fn test_aliases() {
        let config = config();
        assert_eq!(config.find_dimension(&Alias::name("amount of substance")), Some(Dimension::AMOUNT));
        let aliases = config.aliases(&AliasOwner::Unit(FOOT), None);
        assert_eq!(aliases.len(), 3);
        assert!(aliases.contains(&Alias::plural("feet")));

        let km = prefixed(&METER, KILO);
        let names = config.aliases(&AliasOwner::Unit(km), Some(&AliasType::ENGLISH_PLURAL));
        assert!(names.contains(&Alias::plural("kilometers")));
    }

    #[test]
    fn test_preferred_units() {
        let config = config();
        let kg = prefixed(&GRAM, KILO);
        assert_eq!(config.preferred_unit(&GRAM.dimensions()), Some(kg.clone()));

        let weight = Quantity::new(2, POUND);
        assert_eq!(config.to_preferred(&weight).unwrap(), Quantity::new(n("0.90718474"), kg));
    }

    #[test]
    fn test_simplify() {
        let config = config();
        let kg = prefixed(&GRAM, KILO);
        assert_eq!(config.simplify(&Quantity::new(1500, GRAM)), Quantity::new(n("1.5"), kg));
        assert_eq!(config.simplify(&Quantity::new(7200, SECOND)), Quantity::new(120, MINUTE));
        assert_eq!(config.simplify(&Quantity::new(800, OUNCE)), Quantity::new(50, POUND));
        assert_eq!(config.simplify(&Quantity::new(48, OUNCE)), Quantity::new(48, OUNCE));
    }
}
