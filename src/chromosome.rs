//! The autosomal chromosome a variant line belongs to.

use std::num::ParseIntError;
use std::str::FromStr;

/// The smallest chromosome number that is scored.
pub const MIN_CHROMOSOME: u8 = 1;

/// The largest chromosome number that is scored.
pub const MAX_CHROMOSOME: u8 = 22;

/// An error related to the parsing of a chromosome.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The value was not an integer.
    InvalidInteger(ParseIntError),

    /// The value was an integer outside of `1..=22`.
    OutOfRange(i64),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidInteger(err) => write!(f, "invalid integer: {err}"),
            ParseError::OutOfRange(value) => write!(
                f,
                "chromosome {value} is outside of the range {MIN_CHROMOSOME}-{MAX_CHROMOSOME}"
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// An autosome number within `1..=22`.
///
/// A [`Chromosome`] can only be constructed through [`TryFrom`] or
/// [`FromStr`], so holding one guarantees the value is in range.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Chromosome(u8);

impl Chromosome {
    /// Gets the chromosome number.
    ///
    /// # Examples
    ///
    /// ```
    /// use prsadjust::Chromosome;
    ///
    /// let chromosome = "7".parse::<Chromosome>()?;
    /// assert_eq!(chromosome.get(), 7);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Chromosome {
    type Error = ParseError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(MIN_CHROMOSOME)..=i64::from(MAX_CHROMOSOME)).contains(&value) {
            // SAFETY: the range check above guarantees the value fits in a `u8`.
            Ok(Self(value as u8))
        } else {
            Err(ParseError::OutOfRange(value))
        }
    }
}

impl FromStr for Chromosome {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(ParseError::InvalidInteger)?;

        Self::try_from(value)
    }
}

impl std::fmt::Display for Chromosome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chr{}", self.0)
    }
}
