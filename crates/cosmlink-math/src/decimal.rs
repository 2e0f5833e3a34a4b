//! Fixed-point decimal type for exact monetary arithmetic
//!
//! A [`Decimal`] is an arbitrary precision unsigned integer (the *atomics*)
//! together with the number of fractional digits it is scaled by. The value
//! represented is `atomics / 10^fractional_digits`. All arithmetic stays in
//! integer space.

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Largest supported number of fractional digits
pub const MAX_FRACTIONAL_DIGITS: u32 = 100;

/// Reasons a fractional digit count is rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FractionalDigitsError {
    #[error("fractional digits is not an integer")]
    NotAnInteger,

    #[error("fractional digits must not be negative")]
    Negative,

    #[error("fractional digits must not exceed 100")]
    TooLarge,
}

/// Decimal parsing and arithmetic errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecimalError {
    /// Input contains something other than digits and a separator
    #[error("invalid character at position {position}")]
    InvalidCharacter { position: usize },

    #[error("more than one separator found")]
    MultipleSeparators,

    #[error("fractional part missing")]
    FractionalPartMissing,

    #[error("got more fractional digits than supported")]
    TooManyFractionalDigits,

    /// Atomics must be a plain digit string
    #[error("invalid atomics {0:?}: only decimal digits are allowed")]
    InvalidAtomics(String),

    #[error("invalid fractional digits: {0}")]
    InvalidFractionalDigits(#[from] FractionalDigitsError),

    #[error("fractional digits do not match")]
    IncompatiblePrecision,

    #[error("difference must not be negative")]
    NegativeResult,
}

impl DecimalError {
    /// True for malformed user or atomics input
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            DecimalError::InvalidCharacter { .. }
                | DecimalError::MultipleSeparators
                | DecimalError::FractionalPartMissing
                | DecimalError::TooManyFractionalDigits
                | DecimalError::InvalidAtomics(_)
        )
    }
}

/// Result type for decimal operations
pub type Result<T> = std::result::Result<T, DecimalError>;

/// Exact, immutable fixed-point decimal
///
/// Two decimals are equal only if both their atomics and their fractional
/// digits are equal. Ordering compares the represented values first and
/// falls back to the fractional digit count, so it stays consistent with
/// equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Decimal {
    atomics: BigUint,
    fractional_digits: u32,
}

impl Decimal {
    /// Create a decimal from its integer representation
    ///
    /// Leading zeros are stripped and the empty string is zero. There is no
    /// bound on the magnitude of `atomics`.
    pub fn from_atomics(atomics: &str, fractional_digits: u32) -> Result<Self> {
        check_fractional_digits(fractional_digits)?;
        if !atomics.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DecimalError::InvalidAtomics(atomics.to_string()));
        }

        Ok(Self {
            atomics: parse_digits(atomics),
            fractional_digits,
        })
    }

    /// Parse a human entered amount such as `"1.5"` or `".25"`
    pub fn from_user_input(input: &str, fractional_digits: u32) -> Result<Self> {
        check_fractional_digits(fractional_digits)?;

        if let Some((index, _)) = input
            .chars()
            .enumerate()
            .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        {
            return Err(DecimalError::InvalidCharacter {
                position: index + 1,
            });
        }

        // Only ASCII is left at this point, so byte offsets are char offsets.
        let (whole, fractional) = match input.split_once('.') {
            None => (input, ""),
            Some((_, rest)) if rest.contains('.') => {
                return Err(DecimalError::MultipleSeparators)
            }
            Some((_, "")) => return Err(DecimalError::FractionalPartMissing),
            Some((whole, fractional)) => (whole, fractional),
        };

        let fractional = fractional.trim_end_matches('0');
        if fractional.len() > fractional_digits as usize {
            return Err(DecimalError::TooManyFractionalDigits);
        }

        let quantity = format!(
            "{whole}{fractional:0<width$}",
            width = fractional_digits as usize
        );

        Ok(Self {
            atomics: parse_digits(&quantity),
            fractional_digits,
        })
    }

    /// Same as [`Decimal::from_user_input`] with the precision taken from an
    /// untyped numeric source
    pub fn from_user_input_f64(input: &str, fractional_digits: f64) -> Result<Self> {
        let fractional_digits = Self::parse_fractional_digits(fractional_digits)?;
        Self::from_user_input(input, fractional_digits)
    }

    /// Validate a fractional digit count coming from an untyped source,
    /// e.g. an asset exponent read from JSON
    pub fn parse_fractional_digits(value: f64) -> Result<u32> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(FractionalDigitsError::NotAnInteger.into());
        }
        if value < 0.0 {
            return Err(FractionalDigitsError::Negative.into());
        }
        if value > f64::from(MAX_FRACTIONAL_DIGITS) {
            return Err(FractionalDigitsError::TooLarge.into());
        }
        Ok(value as u32)
    }

    /// Zero at the given precision
    pub fn zero(fractional_digits: u32) -> Result<Self> {
        Self::from_atomics("0", fractional_digits)
    }

    /// One at the given precision
    pub fn one(fractional_digits: u32) -> Result<Self> {
        check_fractional_digits(fractional_digits)?;
        Ok(Self {
            atomics: pow10(fractional_digits),
            fractional_digits,
        })
    }

    /// The integer representation as a canonical digit string
    pub fn atomics(&self) -> String {
        self.atomics.to_string()
    }

    pub fn fractional_digits(&self) -> u32 {
        self.fractional_digits
    }

    pub fn is_zero(&self) -> bool {
        self.atomics.is_zero()
    }

    /// Lossy conversion to a float. Never use the result for comparisons or
    /// monetary totals.
    pub fn to_float_approximation(&self) -> f64 {
        // Parsing the canonical rendering gives a correctly rounded result
        self.to_string().parse().unwrap_or_else(|_| {
            let atomics = self.atomics.to_f64().unwrap_or(f64::INFINITY);
            atomics / 10f64.powi(self.fractional_digits as i32)
        })
    }

    /// Sum of two decimals sharing the same precision
    pub fn plus(&self, other: &Decimal) -> Result<Decimal> {
        self.ensure_same_precision(other)?;
        Ok(Self {
            atomics: &self.atomics + &other.atomics,
            fractional_digits: self.fractional_digits,
        })
    }

    /// Difference of two decimals sharing the same precision
    pub fn minus(&self, other: &Decimal) -> Result<Decimal> {
        self.ensure_same_precision(other)?;
        if other.atomics > self.atomics {
            return Err(DecimalError::NegativeResult);
        }
        Ok(Self {
            atomics: &self.atomics - &other.atomics,
            fractional_digits: self.fractional_digits,
        })
    }

    /// Multiply by an integer factor, keeping the precision
    pub fn multiply(&self, factor: u64) -> Decimal {
        Self {
            atomics: &self.atomics * BigUint::from(factor),
            fractional_digits: self.fractional_digits,
        }
    }

    /// Round down to a whole number, keeping the precision
    pub fn floor(&self) -> Decimal {
        let unit = pow10(self.fractional_digits);
        let remainder = &self.atomics % &unit;
        Self {
            atomics: &self.atomics - remainder,
            fractional_digits: self.fractional_digits,
        }
    }

    /// Round up to a whole number, keeping the precision
    pub fn ceil(&self) -> Decimal {
        let unit = pow10(self.fractional_digits);
        let remainder = &self.atomics % &unit;
        if remainder.is_zero() {
            return self.clone();
        }
        Self {
            atomics: &self.atomics - remainder + unit,
            fractional_digits: self.fractional_digits,
        }
    }

    fn ensure_same_precision(&self, other: &Decimal) -> Result<()> {
        if self.fractional_digits != other.fractional_digits {
            return Err(DecimalError::IncompatiblePrecision);
        }
        Ok(())
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.atomics.to_string();
        let scale = self.fractional_digits as usize;
        if scale == 0 {
            return f.write_str(&digits);
        }

        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (whole, fractional) = padded.split_at(padded.len() - scale);
        let fractional = fractional.trim_end_matches('0');
        if fractional.is_empty() {
            f.write_str(whole)
        } else {
            write!(f, "{whole}.{fractional}")
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.fractional_digits.max(other.fractional_digits);
        let lhs = &self.atomics * pow10(scale - self.fractional_digits);
        let rhs = &other.atomics * pow10(scale - other.fractional_digits);
        lhs.cmp(&rhs)
            .then(self.fractional_digits.cmp(&other.fractional_digits))
    }
}

fn check_fractional_digits(fractional_digits: u32) -> Result<()> {
    if fractional_digits > MAX_FRACTIONAL_DIGITS {
        return Err(FractionalDigitsError::TooLarge.into());
    }
    Ok(())
}

/// Caller guarantees `digits` is ASCII digits only
fn parse_digits(digits: &str) -> BigUint {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        return BigUint::zero();
    }
    BigUint::parse_bytes(trimmed.as_bytes(), 10).unwrap_or_default()
}

fn pow10(exponent: u32) -> BigUint {
    let mut value = BigUint::one();
    let ten = BigUint::from(10u32);
    for _ in 0..exponent {
        value *= &ten;
    }
    value
}
