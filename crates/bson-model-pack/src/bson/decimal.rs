//! BSON Decimal128 (IEEE 754-2008 decimal128, binary integer decimal encoding).
//!
//! Values are kept as their 16 wire bytes so decode then encode is lossless.
//! The text form is `<coefficient>E<exponent>` (or just the coefficient when
//! the exponent is zero), which preserves the exact coefficient and exponent,
//! including trailing zeros and negative zero.

use std::fmt;
use std::str::FromStr;

use super::error::BsonError;

const EXPONENT_BIAS: i32 = 6176;
const EXPONENT_MIN: i32 = -6176;
const EXPONENT_MAX: i32 = 6111;
const MAX_COEFFICIENT: u128 = 9_999_999_999_999_999_999_999_999_999_999;

const SIGN_BIT: u128 = 1 << 127;
const COMBINATION_SHIFT: u32 = 122;
const INFINITY_COMBINATION: u128 = 0b11110;
const NAN_COMBINATION: u128 = 0b11111;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal128([u8; 16]);

/// Decoded view of a decimal128 value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parts {
    NaN,
    Infinity { negative: bool },
    Finite {
        negative: bool,
        coefficient: u128,
        exponent: i32,
    },
}

impl Decimal128 {
    pub const ZERO: Decimal128 = Decimal128::from_bits((EXPONENT_BIAS as u128) << 113);

    /// Builds a value from its little-endian wire bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 16] {
        self.0
    }

    const fn from_bits(bits: u128) -> Self {
        Self(bits.to_le_bytes())
    }

    fn bits(&self) -> u128 {
        u128::from_le_bytes(self.0)
    }

    /// Builds a finite value `coefficient * 10^exponent`.
    pub fn from_parts(negative: bool, coefficient: u128, exponent: i32) -> Option<Self> {
        if coefficient > MAX_COEFFICIENT || !(EXPONENT_MIN..=EXPONENT_MAX).contains(&exponent) {
            return None;
        }
        let biased = (exponent + EXPONENT_BIAS) as u128;
        let mut bits = (biased << 113) | coefficient;
        if negative {
            bits |= SIGN_BIT;
        }
        Some(Self::from_bits(bits))
    }

    pub fn is_nan(&self) -> bool {
        matches!(self.parts(), Parts::NaN)
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self.parts(), Parts::Infinity { .. })
    }

    fn parts(&self) -> Parts {
        let bits = self.bits();
        let negative = bits & SIGN_BIT != 0;
        let combination = (bits >> COMBINATION_SHIFT) & 0b11111;
        if combination == NAN_COMBINATION {
            return Parts::NaN;
        }
        if combination == INFINITY_COMBINATION {
            return Parts::Infinity { negative };
        }
        if (bits >> 125) & 0b11 == 0b11 {
            // Large-coefficient form: the implied coefficient always exceeds
            // the maximum, so the value is a non-canonical zero.
            let exponent = ((bits >> 111) & 0x3fff) as i32 - EXPONENT_BIAS;
            return Parts::Finite {
                negative,
                coefficient: 0,
                exponent,
            };
        }
        let exponent = ((bits >> 113) & 0x3fff) as i32 - EXPONENT_BIAS;
        let mut coefficient = bits & ((1u128 << 113) - 1);
        if coefficient > MAX_COEFFICIENT {
            coefficient = 0;
        }
        Parts::Finite {
            negative,
            coefficient,
            exponent,
        }
    }
}

impl fmt::Display for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parts() {
            Parts::NaN => f.write_str("NaN"),
            Parts::Infinity { negative: false } => f.write_str("Infinity"),
            Parts::Infinity { negative: true } => f.write_str("-Infinity"),
            Parts::Finite {
                negative,
                coefficient,
                exponent,
            } => {
                if negative {
                    f.write_str("-")?;
                }
                if exponent == 0 {
                    write!(f, "{coefficient}")
                } else {
                    write!(f, "{coefficient}E{exponent}")
                }
            }
        }
    }
}

impl FromStr for Decimal128 {
    type Err = BsonError;

    /// Accepts `[-+]digits[.digits][(E|e)[-+]digits]`, `NaN`, `Infinity`
    /// and `-Infinity`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BsonError::InvalidDecimal128(s.to_string());
        match s {
            "NaN" => return Ok(Self::from_bits(NAN_COMBINATION << COMBINATION_SHIFT)),
            "Infinity" | "+Infinity" => {
                return Ok(Self::from_bits(INFINITY_COMBINATION << COMBINATION_SHIFT))
            }
            "-Infinity" => {
                return Ok(Self::from_bits(
                    SIGN_BIT | (INFINITY_COMBINATION << COMBINATION_SHIFT),
                ))
            }
            _ => {}
        }

        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (mantissa, exp_part) = match rest.find(['e', 'E']) {
            Some(pos) => (&rest[..pos], Some(&rest[pos + 1..])),
            None => (rest, None),
        };
        let (int_digits, frac_digits) = match mantissa.find('.') {
            Some(pos) => (&mantissa[..pos], &mantissa[pos + 1..]),
            None => (mantissa, ""),
        };
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid());
        }

        let mut coefficient: u128 = 0;
        for b in int_digits.bytes().chain(frac_digits.bytes()) {
            if !b.is_ascii_digit() {
                return Err(invalid());
            }
            coefficient = coefficient
                .checked_mul(10)
                .and_then(|c| c.checked_add(u128::from(b - b'0')))
                .ok_or_else(invalid)?;
        }

        let exponent: i64 = match exp_part {
            Some(e) if !e.is_empty() => e.parse::<i64>().map_err(|_| invalid())?,
            Some(_) => return Err(invalid()),
            None => 0,
        };
        let frac_len = i64::try_from(frac_digits.len()).map_err(|_| invalid())?;
        let exponent = exponent.checked_sub(frac_len).ok_or_else(invalid)?;
        let exponent = i32::try_from(exponent).map_err(|_| invalid())?;

        Self::from_parts(negative, coefficient, exponent).ok_or_else(invalid)
    }
}
