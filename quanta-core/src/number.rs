//! Exact rational numbers using dashu
//!
//! Uses dashu-ratio (RBig) so that every arithmetic operation is exact.
//! Narrowing to native types comes in two flavours: `to_*` always succeeds
//! and may round, `*_exact` fails with `NumberError::PrecisionLoss` instead
//! of discarding information. `as_*` is the probing form of `*_exact`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use dashu_int::{IBig, UBig};
use dashu_ratio::RBig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::RoundingMode;

/// Error type for number operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error("Invalid number format: {0}")]
    ParseError(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Precision loss: {value} is not exactly representable as {target}")]
    PrecisionLoss { value: String, target: &'static str },

    #[error("Not a finite number: {0}")]
    NotFinite(String),
}

/// Exact rational number
///
/// The denominator is always positive and never zero. All operations return
/// new values; nothing mutates in place.
#[derive(Clone, PartialEq, Eq)]
pub struct ExactNumber {
    inner: RBig,
}

impl ExactNumber {
    pub const ZERO: ExactNumber = ExactNumber { inner: RBig::ZERO };
    pub const ONE: ExactNumber = ExactNumber { inner: RBig::ONE };

    /// Largest decimal exponent magnitude accepted by `FromStr` (`1e10000`)
    pub const MAX_PARSE_EXPONENT: u32 = 10_000;

    // ========== Construction ==========

    /// Create from i64
    pub fn from_i64(n: i64) -> Self {
        Self::from(n)
    }

    /// Create from a numerator/denominator pair
    pub fn from_ratio(
        numerator: impl Into<IBig>,
        denominator: impl Into<IBig>,
    ) -> Result<Self, NumberError> {
        let denominator: IBig = denominator.into();
        if denominator == IBig::ZERO {
            return Err(NumberError::DivisionByZero);
        }
        Ok(Self {
            inner: RBig::from(numerator.into()) / RBig::from(denominator),
        })
    }

    /// Create from a scaled decimal: `unscaled * 10^-scale`
    ///
    /// `from_decimal(254, 4)` is 0.0254, `from_decimal(3, -2)` is 300.
    pub fn from_decimal(unscaled: impl Into<IBig>, scale: i32) -> Self {
        let unscaled = RBig::from(unscaled.into());
        let power = RBig::from(ten_pow(scale.unsigned_abs() as usize));
        if scale >= 0 {
            Self { inner: unscaled / power }
        } else {
            Self { inner: unscaled * power }
        }
    }

    /// Create from f64 through its shortest round-trip decimal form
    ///
    /// `0.1_f64` becomes exactly 1/10, not the binary fraction nearest to it.
    pub fn from_f64(f: f64) -> Result<Self, NumberError> {
        if !f.is_finite() {
            return Err(NumberError::NotFinite(f.to_string()));
        }
        f.to_string().parse()
    }

    /// Create from f32 through its shortest round-trip decimal form
    pub fn from_f32(f: f32) -> Result<Self, NumberError> {
        if !f.is_finite() {
            return Err(NumberError::NotFinite(f.to_string()));
        }
        f.to_string().parse()
    }

    // ========== Accessors & predicates ==========

    pub fn numerator(&self) -> &IBig {
        self.inner.numerator()
    }

    pub fn denominator(&self) -> &UBig {
        self.inner.denominator()
    }

    pub fn is_zero(&self) -> bool {
        self.inner == RBig::ZERO
    }

    pub fn is_positive(&self) -> bool {
        self.inner > RBig::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.inner < RBig::ZERO
    }

    pub fn is_one(&self) -> bool {
        self.inner == RBig::ONE
    }

    /// True when the denominator (in lowest terms) is 1
    pub fn is_integer(&self) -> bool {
        *self.inner.denominator() == UBig::ONE
    }

    /// -1, 0 or 1
    pub fn signum(&self) -> i32 {
        match self.cmp(&Self::ZERO) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    // ========== Arithmetic ==========

    pub fn add(&self, other: &Self) -> Self {
        Self { inner: &self.inner + &other.inner }
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self { inner: &self.inner - &other.inner }
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self { inner: &self.inner * &other.inner }
    }

    /// Safe division (returns Result, never panics)
    pub fn checked_div(&self, other: &Self) -> Result<Self, NumberError> {
        if other.is_zero() {
            Err(NumberError::DivisionByZero)
        } else {
            Ok(Self { inner: &self.inner / &other.inner })
        }
    }

    pub fn reciprocal(&self) -> Result<Self, NumberError> {
        Self::ONE.checked_div(self)
    }

    pub fn neg(&self) -> Self {
        Self { inner: -self.inner.clone() }
    }

    pub fn abs(&self) -> Self {
        if self.is_negative() {
            self.neg()
        } else {
            self.clone()
        }
    }

    /// Integer power; negative exponents go through the reciprocal
    pub fn pow(&self, exp: i32) -> Result<Self, NumberError> {
        let power = self.pow_unsigned(exp.unsigned_abs());
        if exp < 0 {
            power.reciprocal()
        } else {
            Ok(power)
        }
    }

    fn pow_unsigned(&self, mut exp: u32) -> Self {
        let mut base = self.inner.clone();
        let mut acc = RBig::ONE;
        while exp > 0 {
            if exp & 1 == 1 {
                acc = &acc * &base;
            }
            exp >>= 1;
            if exp > 0 {
                base = &base * &base;
            }
        }
        Self { inner: acc }
    }

    // ========== Narrowing: integral ==========

    /// Largest integer <= self
    fn floor_int(&self) -> IBig {
        let numerator = self.inner.numerator().clone();
        let denominator = IBig::from(self.inner.denominator().clone());
        // IBig division truncates toward zero
        let quotient = &numerator / &denominator;
        if numerator < IBig::ZERO && &quotient * &denominator != numerator {
            quotient - IBig::ONE
        } else {
            quotient
        }
    }

    /// Round to an integer using `mode`; always succeeds
    pub fn to_integral(&self, mode: RoundingMode) -> IBig {
        let floor = self.floor_int();
        if self.is_integer() {
            return floor;
        }
        let ceil = floor.clone() + IBig::ONE;
        let positive = self.is_positive();

        match mode {
            RoundingMode::Floor => floor,
            RoundingMode::Ceiling => ceil,
            RoundingMode::Down => if positive { floor } else { ceil },
            RoundingMode::Up => if positive { ceil } else { floor },
            RoundingMode::HalfUp | RoundingMode::HalfDown | RoundingMode::HalfEven => {
                let fraction = self.inner.clone() - RBig::from(floor.clone());
                let half = RBig::ONE / RBig::from(IBig::from(2u8));
                match fraction.partial_cmp(&half).unwrap_or(Ordering::Equal) {
                    Ordering::Less => floor,
                    Ordering::Greater => ceil,
                    Ordering::Equal => match mode {
                        RoundingMode::HalfUp => if positive { ceil } else { floor },
                        RoundingMode::HalfDown => if positive { floor } else { ceil },
                        _ => {
                            if &floor % IBig::from(2u8) == IBig::ZERO {
                                floor
                            } else {
                                ceil
                            }
                        }
                    },
                }
            }
        }
    }

    /// The integer value, or `PrecisionLoss` if there is a fractional part
    pub fn to_integral_exact(&self) -> Result<IBig, NumberError> {
        self.integral_for("integer")
    }

    fn integral_for(&self, target: &'static str) -> Result<IBig, NumberError> {
        if self.is_integer() {
            Ok(self.inner.numerator().clone())
        } else {
            Err(self.precision_loss(target))
        }
    }

    fn precision_loss(&self, target: &'static str) -> NumberError {
        NumberError::PrecisionLoss {
            value: self.to_string(),
            target,
        }
    }

    // ========== Narrowing: floating point ==========

    /// Nearest f64 (infinite when out of range)
    pub fn to_f64(&self) -> f64 {
        self.inner.to_f64().value()
    }

    /// The f64 whose decimal form is exactly this value
    pub fn to_f64_exact(&self) -> Result<f64, NumberError> {
        let approx = self.to_f64();
        match Self::from_f64(approx) {
            Ok(back) if back == *self => Ok(approx),
            _ => Err(self.precision_loss("f64")),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.to_f64_exact().ok()
    }

    /// Nearest f32 (infinite when out of range)
    pub fn to_f32(&self) -> f32 {
        self.inner.to_f32().value()
    }

    /// The f32 whose decimal form is exactly this value
    pub fn to_f32_exact(&self) -> Result<f32, NumberError> {
        let approx = self.to_f32();
        match Self::from_f32(approx) {
            Ok(back) if back == *self => Ok(approx),
            _ => Err(self.precision_loss("f32")),
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        self.to_f32_exact().ok()
    }

    // ========== Display ==========

    /// Exact decimal rendering, if the value terminates in base 10
    pub fn to_exact_decimal_string(&self) -> Option<String> {
        let two = UBig::from(2u8);
        let five = UBig::from(5u8);
        let mut rest = self.inner.denominator().clone();
        let mut twos = 0usize;
        let mut fives = 0usize;
        while &rest % &two == UBig::ZERO {
            rest = &rest / &two;
            twos += 1;
        }
        while &rest % &five == UBig::ZERO {
            rest = &rest / &five;
            fives += 1;
        }
        if rest != UBig::ONE {
            return None;
        }

        let places = twos.max(fives);
        let scaled = self.inner.numerator() * ten_pow(places)
            / IBig::from(self.inner.denominator().clone());
        Some(render_scaled(&scaled, places))
    }

    /// Render with exactly `places` decimal places, rounding with `mode`
    pub fn to_decimal_string(&self, places: u32, mode: RoundingMode) -> String {
        let scale = Self {
            inner: RBig::from(ten_pow(places as usize)),
        };
        let scaled = self.mul(&scale).to_integral(mode);
        render_scaled(&scaled, places as usize)
    }
}

macro_rules! integral_narrowing {
    ($($target:ty => $lossy:ident, $exact:ident, $probe:ident;)*) => {
        impl ExactNumber {
            $(
                #[doc = concat!("Round to `", stringify!($target), "` with `mode`, saturating at its bounds")]
                pub fn $lossy(&self, mode: RoundingMode) -> $target {
                    let rounded = self.to_integral(mode);
                    let negative = rounded < IBig::ZERO;
                    match <$target>::try_from(rounded) {
                        Ok(v) => v,
                        Err(_) if negative => <$target>::MIN,
                        Err(_) => <$target>::MAX,
                    }
                }

                #[doc = concat!("Exact `", stringify!($target), "`, or `PrecisionLoss`")]
                pub fn $exact(&self) -> Result<$target, NumberError> {
                    let integral = self.integral_for(stringify!($target))?;
                    <$target>::try_from(integral)
                        .map_err(|_| self.precision_loss(stringify!($target)))
                }

                pub fn $probe(&self) -> Option<$target> {
                    self.$exact().ok()
                }
            )*
        }
    };
}

integral_narrowing! {
    i8 => to_i8, to_i8_exact, as_i8;
    i16 => to_i16, to_i16_exact, as_i16;
    i32 => to_i32, to_i32_exact, as_i32;
    i64 => to_i64, to_i64_exact, as_i64;
    i128 => to_i128, to_i128_exact, as_i128;
}

fn ten_pow(exp: usize) -> IBig {
    IBig::from(10u8).pow(exp)
}

/// Insert a decimal point `places` digits from the right of `scaled`
fn render_scaled(scaled: &IBig, places: usize) -> String {
    let negative = *scaled < IBig::ZERO;
    let digits = if negative {
        (-scaled.clone()).to_string()
    } else {
        scaled.to_string()
    };

    let mut out = String::with_capacity(digits.len() + places + 2);
    if negative {
        out.push('-');
    }
    if places == 0 {
        out.push_str(&digits);
        return out;
    }

    let padded = if digits.len() <= places {
        format!("{}{}", "0".repeat(places + 1 - digits.len()), digits)
    } else {
        digits
    };
    let split = padded.len() - places;
    out.push_str(&padded[..split]);
    out.push('.');
    out.push_str(&padded[split..]);
    out
}

/// Parse `[+-]digits[.digits][(e|E)[+-]digits]` exactly
fn parse_decimal(s: &str) -> Option<ExactNumber> {
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(i) => (&s[..i], s[i + 1..].parse::<i32>().ok()?),
        None => (s, 0),
    };
    if exponent.unsigned_abs() > ExactNumber::MAX_PARSE_EXPONENT {
        return None;
    }
    let (negative, digits) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut unscaled: IBig = format!("{}{}", int_part, frac_part).parse().ok()?;
    if negative {
        unscaled = -unscaled;
    }
    let scale = i32::try_from(frac_part.len()).ok()?.checked_sub(exponent)?;
    Some(ExactNumber::from_decimal(unscaled, scale))
}

// ========== Trait Implementations ==========

impl FromStr for ExactNumber {
    type Err = NumberError;

    /// Supports: "123", "-3.25", "1/3", "1.5e-3", "2.5/4"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse_error = || NumberError::ParseError(s.to_string());

        if let Some((num, den)) = s.split_once('/') {
            let num = parse_decimal(num.trim()).ok_or_else(parse_error)?;
            let den = parse_decimal(den.trim()).ok_or_else(parse_error)?;
            return num.checked_div(&den);
        }
        parse_decimal(s).ok_or_else(parse_error)
    }
}

macro_rules! from_primitive {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ExactNumber {
                fn from(n: $t) -> Self {
                    Self { inner: RBig::from(IBig::from(n)) }
                }
            }
        )*
    };
}

from_primitive!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128);

impl From<IBig> for ExactNumber {
    fn from(n: IBig) -> Self {
        Self { inner: RBig::from(n) }
    }
}

impl From<UBig> for ExactNumber {
    fn from(n: UBig) -> Self {
        Self { inner: RBig::from(IBig::from(n)) }
    }
}

impl Default for ExactNumber {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for ExactNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_exact_decimal_string() {
            Some(decimal) => f.write_str(&decimal),
            None => write!(f, "{}/{}", self.inner.numerator(), self.inner.denominator()),
        }
    }
}

impl fmt::Debug for ExactNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExactNumber({})", self)
    }
}

impl Serialize for ExactNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ExactNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl PartialOrd for ExactNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExactNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.partial_cmp(&other.inner).unwrap_or(Ordering::Equal)
    }
}
