//! Deterministic fixed-point scalar
//!
//! `Fp` is a signed Q48.16 number stored in an `i64`. Every operation is
//! pure integer arithmetic, so two machines running the same simulation
//! produce bit-identical results. Multiplication and division widen to
//! `i128` before shifting back.
//!
//! Floats only appear at the edges:
//! - `to_f32` for display and logging
//! - `from_f64` for importing authored data tables (never inside a tick)

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Number of fractional bits
pub const FRAC_BITS: u32 = 16;

const ONE_RAW: i64 = 1 << FRAC_BITS;

// Polynomial coefficients for atan on [-1, 1] (max error ~1e-5 rad)
const ATAN_C1: Fp = Fp(65527);
const ATAN_C3: Fp = Fp(21647);
const ATAN_C5: Fp = Fp(11806);
const ATAN_C7: Fp = Fp(5579);
const ATAN_C9: Fp = Fp(1365);

/// Fixed-point number (Q48.16)
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fp(i64);

impl Fp {
    pub const ZERO: Fp = Fp(0);
    pub const ONE: Fp = Fp(ONE_RAW);
    pub const TWO: Fp = Fp(2 * ONE_RAW);
    pub const HALF: Fp = Fp(ONE_RAW / 2);
    pub const MINUS_ONE: Fp = Fp(-ONE_RAW);
    pub const MAX: Fp = Fp(i64::MAX);
    pub const MIN: Fp = Fp(i64::MIN);
    /// Smallest representable positive value
    pub const EPSILON: Fp = Fp(1);
    pub const PI: Fp = Fp(205_887);
    pub const HALF_PI: Fp = Fp(102_944);
    pub const TWO_PI: Fp = Fp(411_775);
    pub const DEG_TO_RAD: Fp = Fp(1_144);

    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Fp(raw)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn from_int(value: i64) -> Self {
        Fp(value << FRAC_BITS)
    }

    /// `num / den` rounded toward zero
    #[inline]
    pub const fn from_ratio(num: i64, den: i64) -> Self {
        Fp((num << FRAC_BITS) / den)
    }

    /// Thousandths, e.g. `from_milli(750)` is 0.75
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Self::from_ratio(milli, 1000)
    }

    /// Import a value from authored data. Not for use inside simulation code.
    pub fn from_f64(value: f64) -> Self {
        Fp((value * ONE_RAW as f64).round() as i64)
    }

    /// Lossy conversion for display only
    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / ONE_RAW as f32
    }

    /// Integer part, rounded toward negative infinity
    #[inline]
    pub const fn floor_to_int(self) -> i64 {
        self.0 >> FRAC_BITS
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Fp(self.0.abs())
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn min(self, other: Fp) -> Self {
        if self <= other { self } else { other }
    }

    #[inline]
    pub fn max(self, other: Fp) -> Self {
        if self >= other { self } else { other }
    }

    #[inline]
    pub fn clamp(self, lo: Fp, hi: Fp) -> Self {
        self.max(lo).min(hi)
    }

    #[inline]
    pub const fn mul_int(self, value: i64) -> Self {
        Fp(self.0 * value)
    }

    #[inline]
    pub const fn div_int(self, value: i64) -> Self {
        Fp(self.0 / value)
    }

    /// Linear interpolation, `t` is not clamped
    #[inline]
    pub fn lerp(a: Fp, b: Fp, t: Fp) -> Self {
        a + (b - a) * t
    }

    /// Square root, zero for non-positive input
    pub fn sqrt(self) -> Self {
        if self.0 <= 0 {
            return Fp::ZERO;
        }
        let scaled = (self.0 as u128) << FRAC_BITS;
        Fp(isqrt(scaled) as i64)
    }

    /// Wrap an angle into (-PI, PI]
    pub fn wrap_angle(self) -> Self {
        let mut a = Fp(self.0.rem_euclid(Self::TWO_PI.0));
        if a > Self::PI {
            a -= Self::TWO_PI;
        }
        a
    }

    pub fn sin(self) -> Self {
        let mut x = self.wrap_angle();
        if x > Self::HALF_PI {
            x = Self::PI - x;
        } else if x < -Self::HALF_PI {
            x = -Self::PI - x;
        }
        let x2 = x * x;
        let x3 = x2 * x;
        let x5 = x3 * x2;
        let x7 = x5 * x2;
        x - x3.div_int(6) + x5.div_int(120) - x7.div_int(5040)
    }

    #[inline]
    pub fn cos(self) -> Self {
        (self + Self::HALF_PI).sin()
    }

    /// Four-quadrant arctangent in (-PI, PI]
    pub fn atan2(y: Fp, x: Fp) -> Self {
        if x.0 == 0 && y.0 == 0 {
            return Fp::ZERO;
        }
        if x.abs() >= y.abs() {
            let a = atan_unit(y / x);
            if x.0 > 0 {
                a
            } else if y.0 >= 0 {
                a + Self::PI
            } else {
                a - Self::PI
            }
        } else {
            let a = atan_unit(x / y);
            if y.0 > 0 {
                Self::HALF_PI - a
            } else {
                -Self::HALF_PI - a
            }
        }
    }
}

/// atan for |z| <= 1
fn atan_unit(z: Fp) -> Fp {
    let z2 = z * z;
    z * (ATAN_C1 - z2 * (ATAN_C3 - z2 * (ATAN_C5 - z2 * (ATAN_C7 - z2 * ATAN_C9))))
}

fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let bits = 128 - n.leading_zeros();
    let mut x = 1u128 << bits.div_ceil(2);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

// ============================================================================
// Operators
// ============================================================================

impl Add for Fp {
    type Output = Fp;
    #[inline]
    fn add(self, rhs: Fp) -> Fp {
        Fp(self.0 + rhs.0)
    }
}

impl AddAssign for Fp {
    #[inline]
    fn add_assign(&mut self, rhs: Fp) {
        self.0 += rhs.0;
    }
}

impl Sub for Fp {
    type Output = Fp;
    #[inline]
    fn sub(self, rhs: Fp) -> Fp {
        Fp(self.0 - rhs.0)
    }
}

impl SubAssign for Fp {
    #[inline]
    fn sub_assign(&mut self, rhs: Fp) {
        self.0 -= rhs.0;
    }
}

impl Mul for Fp {
    type Output = Fp;
    #[inline]
    fn mul(self, rhs: Fp) -> Fp {
        Fp(((self.0 as i128 * rhs.0 as i128) >> FRAC_BITS) as i64)
    }
}

impl MulAssign for Fp {
    #[inline]
    fn mul_assign(&mut self, rhs: Fp) {
        *self = *self * rhs;
    }
}

impl Div for Fp {
    type Output = Fp;
    /// Division by zero saturates toward the sign of the dividend
    #[inline]
    fn div(self, rhs: Fp) -> Fp {
        if rhs.0 == 0 {
            return if self.0 >= 0 { Fp::MAX } else { Fp::MIN };
        }
        Fp((((self.0 as i128) << FRAC_BITS) / rhs.0 as i128) as i64)
    }
}

impl Neg for Fp {
    type Output = Fp;
    #[inline]
    fn neg(self) -> Fp {
        Fp(-self.0)
    }
}

// ============================================================================
// Text and serde
// ============================================================================

impl fmt::Display for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let negative = self.0 < 0;
        let magnitude = self.0.unsigned_abs();
        let mut int_part = magnitude >> FRAC_BITS;
        let mut frac = ((magnitude & (ONE_RAW as u64 - 1)) * 10_000 + (ONE_RAW as u64 / 2)) >> FRAC_BITS;
        if frac >= 10_000 {
            int_part += 1;
            frac -= 10_000;
        }
        if negative && (int_part != 0 || frac != 0) {
            write!(f, "-")?;
        }
        write!(f, "{}.{:04}", int_part, frac)
    }
}

impl fmt::Debug for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fp({})", self)
    }
}

/// Error returned when parsing a decimal literal into `Fp`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid fixed-point literal '{0}'")]
pub struct ParseFpError(String);

impl FromStr for Fp {
    type Err = ParseFpError;

    /// Parses `[-+]digits[.digits]` exactly, without going through floats
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseFpError(s.to_string());
        let trimmed = s.trim();
        let (negative, body) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let (int_str, frac_str) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_str.is_empty() && frac_str.is_empty() {
            return Err(err());
        }
        if !int_str.bytes().all(|b| b.is_ascii_digit()) || !frac_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let int_value: i64 = if int_str.is_empty() {
            0
        } else {
            int_str.parse().map_err(|_| err())?
        };
        if int_value > (i64::MAX >> FRAC_BITS) {
            return Err(err());
        }

        // At most nine fractional digits are significant at 16 fractional bits
        let digits = &frac_str[..frac_str.len().min(9)];
        let frac_raw = if digits.is_empty() {
            0
        } else {
            let numerator: i64 = digits.parse().map_err(|_| err())?;
            let denominator = 10i64.pow(digits.len() as u32);
            ((numerator << FRAC_BITS) + denominator / 2) / denominator
        };

        let raw = (int_value << FRAC_BITS) + frac_raw;
        Ok(Fp(if negative { -raw } else { raw }))
    }
}

impl Serialize for Fp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Exact: raw values fit in the f64 mantissa for any realistic magnitude
        serializer.serialize_f64(self.0 as f64 / ONE_RAW as f64)
    }
}

struct FpVisitor;

impl<'de> Visitor<'de> for FpVisitor {
    type Value = Fp;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal number or decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Fp, E> {
        Ok(Fp::from_int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Fp, E> {
        i64::try_from(v)
            .map(Fp::from_int)
            .map_err(|_| E::custom("fixed-point value out of range"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Fp, E> {
        Ok(Fp::from_f64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Fp, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Fp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FpVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Fp, b: Fp, tolerance: Fp) -> bool {
        (a - b).abs() <= tolerance
    }

    #[test]
    fn test_basic_arithmetic() {
        let a = Fp::from_int(3);
        let b = Fp::HALF;
        assert_eq!(a + b, Fp::from_milli(3500));
        assert_eq!(a - b, Fp::from_milli(2500));
        assert_eq!(a * b, Fp::from_milli(1500));
        assert_eq!(a / b, Fp::from_int(6));
        assert_eq!(-a, Fp::from_int(-3));
    }

    #[test]
    fn test_division_by_zero_saturates() {
        assert_eq!(Fp::ONE / Fp::ZERO, Fp::MAX);
        assert_eq!(Fp::MINUS_ONE / Fp::ZERO, Fp::MIN);
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(Fp::from_int(16).sqrt(), Fp::from_int(4));
        assert_eq!(Fp::ZERO.sqrt(), Fp::ZERO);
        assert_eq!(Fp::from_int(-4).sqrt(), Fp::ZERO);
        assert!(close(Fp::TWO.sqrt(), Fp::from_milli(1414), Fp::from_milli(1)));
    }

    #[test]
    fn test_trig_identities() {
        let tolerance = Fp::from_milli(2);
        assert!(close(Fp::ZERO.sin(), Fp::ZERO, tolerance));
        assert!(close(Fp::HALF_PI.sin(), Fp::ONE, tolerance));
        assert!(close(Fp::PI.cos(), Fp::MINUS_ONE, tolerance));
        assert!(close((-Fp::HALF_PI).sin(), Fp::MINUS_ONE, tolerance));
        // Periodicity
        assert!(close((Fp::from_int(1) + Fp::TWO_PI).sin(), Fp::from_int(1).sin(), tolerance));
    }

    #[test]
    fn test_atan2_quadrants() {
        let tolerance = Fp::from_milli(2);
        assert!(close(Fp::atan2(Fp::ONE, Fp::ONE), Fp::PI.div_int(4), tolerance));
        assert!(close(Fp::atan2(Fp::ONE, Fp::MINUS_ONE), Fp::PI.mul_int(3).div_int(4), tolerance));
        assert!(close(Fp::atan2(Fp::MINUS_ONE, Fp::MINUS_ONE), -Fp::PI.mul_int(3).div_int(4), tolerance));
        assert!(close(Fp::atan2(Fp::ONE, Fp::ZERO), Fp::HALF_PI, tolerance));
        assert!(close(Fp::atan2(Fp::MINUS_ONE, Fp::ZERO), -Fp::HALF_PI, tolerance));
        assert_eq!(Fp::atan2(Fp::ZERO, Fp::ZERO), Fp::ZERO);
    }

    #[test]
    fn test_wrap_angle() {
        let wrapped = (Fp::PI + Fp::HALF).wrap_angle();
        assert!(wrapped < Fp::ZERO);
        assert!(close(wrapped, Fp::HALF - Fp::PI, Fp::from_raw(2)));
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!("0.75".parse::<Fp>().unwrap(), Fp::from_milli(750));
        assert_eq!("-2.5".parse::<Fp>().unwrap(), Fp::from_milli(-2500));
        assert_eq!("15".parse::<Fp>().unwrap(), Fp::from_int(15));
        assert_eq!(".5".parse::<Fp>().unwrap(), Fp::HALF);
        assert!("abc".parse::<Fp>().is_err());
        assert!("".parse::<Fp>().is_err());
        assert!("1.2.3".parse::<Fp>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Fp::from_milli(1500).to_string(), "1.5000");
        assert_eq!(Fp::from_milli(-250).to_string(), "-0.2500");
        assert_eq!(Fp::ZERO.to_string(), "0.0000");
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let values: Vec<Fp> = serde_json::from_str(r#"[1, 0.5, "0.25", -3]"#).unwrap();
        assert_eq!(values, vec![Fp::ONE, Fp::HALF, Fp::from_milli(250), Fp::from_int(-3)]);
    }
}
