//! Normalization of principal-component loadings by reference scale factors.
//!
//! The lambda table is matched to the loadings by position: row `i` of the
//! table scales loading `i` (i.e., `PC{i + 1}`). No column of the table is
//! consulted to find the component a row belongs to, so the row order of the
//! reference table must follow the principal-component order.

use tracing::debug;

use crate::table::Table;

/// The column of the lambda table holding the scale factors.
pub const DEFAULT_LAMBDA_COLUMN: &str = "out.d";

/// An error related to reading a [`LambdaTable`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// A row (zero-based) had no value in the scale factor column.
    MissingValue(usize, String),

    /// A row (zero-based) had a non-numeric scale factor.
    InvalidValue(usize, String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingValue(row, column) => {
                write!(f, "row {} has no value for column `{column}`", row + 1)
            }
            ParseError::InvalidValue(row, column) => {
                write!(f, "row {} has a non-numeric value for column `{column}`", row + 1)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to normalizing loadings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The number of loadings differs from the number of scale factors.
    DimensionMismatch {
        /// The number of loadings.
        loadings: usize,

        /// The number of scale factors.
        lambdas: usize,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::DimensionMismatch { loadings, lambdas } => write!(
                f,
                "dimension mismatch: {loadings} loadings but {lambdas} scale factors"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// The per-component scale factors, in principal-component order.
#[derive(Clone, Debug, PartialEq)]
pub struct LambdaTable(Vec<f64>);

impl LambdaTable {
    /// Creates a new [`LambdaTable`] from its scale factors.
    pub fn new(lambdas: Vec<f64>) -> Self {
        Self(lambdas)
    }

    /// Reads the scale factors from `column` of every row of a table.
    ///
    /// # Examples
    ///
    /// ```
    /// use prsadjust::Delimiter;
    /// use prsadjust::normalize::LambdaTable;
    /// use prsadjust::table::Table;
    ///
    /// let table = Table::parse("PC\tout.d\nPC1\t2\nPC2\t4", Delimiter::Tab)?;
    /// let lambdas = LambdaTable::try_from_table(&table, "out.d")?;
    ///
    /// assert_eq!(lambdas.as_slice(), &[2.0, 4.0]);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_from_table(table: &Table, column: &str) -> Result<Self, ParseError> {
        table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let value = row
                    .get(column)
                    .ok_or_else(|| ParseError::MissingValue(i, column.to_string()))?;

                value
                    .as_f64()
                    .ok_or_else(|| ParseError::InvalidValue(i, column.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Gets the scale factors.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Gets the number of scale factors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the table has no scale factors.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Divides every loading by the scale factor at the same position.
///
/// A zero scale factor yields an infinite or NaN component; it is not
/// clamped.
///
/// # Examples
///
/// ```
/// use prsadjust::normalize;
/// use prsadjust::normalize::LambdaTable;
///
/// let lambdas = LambdaTable::new(vec![2.0, 0.5]);
/// assert_eq!(normalize::normalize(&[1.0, 1.0], &lambdas)?, vec![0.5, 2.0]);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn normalize(loadings: &[f64], lambdas: &LambdaTable) -> Result<Vec<f64>, Error> {
    if loadings.len() != lambdas.len() {
        return Err(Error::DimensionMismatch {
            loadings: loadings.len(),
            lambdas: lambdas.len(),
        });
    }

    let normalized = loadings
        .iter()
        .zip(lambdas.as_slice())
        .map(|(loading, lambda)| loading / lambda)
        .collect::<Vec<_>>();

    debug!("normalized loadings {loadings:?} to {normalized:?}");

    Ok(normalized)
}
