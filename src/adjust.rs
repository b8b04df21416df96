//! Ancestry adjustment of a raw polygenic score.
//!
//! Two linear models are evaluated over the normalized loadings (`PC1`,
//! `PC2`, ...) and the raw score (`prs_raw`): one predicting the population
//! mean of the score (`nom`) and one predicting its population variance
//! (`denom`). The adjusted score is
//!
//! ```text
//! (prs_raw - nom) / sqrt(denom)
//! ```

use std::collections::BTreeMap;
use std::collections::HashMap;

use tracing::debug;

use crate::table::Table;
use crate::table::Value;

/// The name of the intercept term (R's `lm()` summary convention).
pub const INTERCEPT: &str = "(Intercept)";

/// The name of the raw score term.
pub const RAW_SCORE_TERM: &str = "prs_raw";

/// The prefix of a principal-component term.
pub const PC_TERM_PREFIX: &str = "PC";

/// The column holding the coefficient estimates.
pub const DEFAULT_ESTIMATE_COLUMN: &str = "Estimate";

/// The characters removed from term names.
const QUOTES: [char; 2] = ['"', '\''];

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to reading a [`CoefficientModel`] from a table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// A row (zero-based) had no term name.
    MissingTerm(usize),

    /// A term had no value in the estimate column.
    MissingEstimate(String, String),

    /// A term had a non-numeric estimate.
    InvalidEstimate(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingTerm(row) => write!(f, "row {} has no term name", row + 1),
            ParseError::MissingEstimate(term, column) => {
                write!(f, "term `{term}` has no value for column `{column}`")
            }
            ParseError::InvalidEstimate(term) => {
                write!(f, "term `{term}` has a non-numeric estimate")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to evaluating the adjustment models.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The variance model predicted a negative variance.
    NegativeVariance(f64),

    /// The adjusted score was not a number.
    NotANumber {
        /// The predicted mean.
        nom: f64,

        /// The predicted variance.
        denom: f64,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NegativeVariance(denom) => {
                write!(f, "variance model predicted a negative variance: {denom}")
            }
            Error::NotANumber { nom, denom } => write!(
                f,
                "adjusted score is not a number (predicted mean {nom}, predicted variance \
                 {denom})"
            ),
        }
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////////////////////
// Models
////////////////////////////////////////////////////////////////////////////////////////

/// The values a model is evaluated against, keyed by term name.
pub type Predictors = BTreeMap<String, f64>;

/// Builds the predictors `PC1..PCn` from the loadings plus `prs_raw`.
///
/// # Examples
///
/// ```
/// use prsadjust::adjust;
///
/// let predictors = adjust::predictors(10.0, &[2.0, 0.5]);
///
/// assert_eq!(predictors["PC1"], 2.0);
/// assert_eq!(predictors["PC2"], 0.5);
/// assert_eq!(predictors["prs_raw"], 10.0);
/// ```
pub fn predictors(prs_raw: f64, loadings: &[f64]) -> Predictors {
    loadings
        .iter()
        .enumerate()
        .map(|(i, loading)| (format!("{PC_TERM_PREFIX}{}", i + 1), *loading))
        .chain(std::iter::once((RAW_SCORE_TERM.to_string(), prs_raw)))
        .collect()
}

/// Named regression coefficients defining a linear predictor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoefficientModel(HashMap<String, f64>);

impl CoefficientModel {
    /// Reads a model from a coefficient table.
    ///
    /// The term names are taken from the first column (quote characters are
    /// removed) and the coefficients from `estimate_column`.
    ///
    /// # Examples
    ///
    /// ```
    /// use prsadjust::Delimiter;
    /// use prsadjust::adjust::CoefficientModel;
    /// use prsadjust::table::Table;
    ///
    /// let text = "\"\",\"Estimate\"\n\"(Intercept)\",1.5\n\"PC1\",2\n";
    /// let table = Table::parse(text, Delimiter::Comma)?;
    /// let model = CoefficientModel::try_from_table(&table, "Estimate")?;
    ///
    /// assert_eq!(model.intercept(), 1.5);
    /// assert_eq!(model.get("PC1"), Some(2.0));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_from_table(table: &Table, estimate_column: &str) -> Result<Self, ParseError> {
        let term_column = table.headers().first().map(String::as_str).unwrap_or_default();
        let mut coefficients = HashMap::new();

        for (i, row) in table.rows().iter().enumerate() {
            let term = match row.get(term_column) {
                Some(Value::Text(s)) => s.replace(QUOTES, ""),
                Some(Value::Number(n)) => n.to_string(),
                None => return Err(ParseError::MissingTerm(i)),
            };

            let estimate = row
                .get(estimate_column)
                .ok_or_else(|| ParseError::MissingEstimate(term.clone(), estimate_column.into()))?
                .as_f64()
                .ok_or_else(|| ParseError::InvalidEstimate(term.clone()))?;

            coefficients.insert(term, estimate);
        }

        Ok(Self(coefficients))
    }

    /// Gets the coefficient of a term.
    pub fn get(&self, term: &str) -> Option<f64> {
        self.0.get(term).copied()
    }

    /// Gets the intercept, which is zero when the model has none.
    pub fn intercept(&self) -> f64 {
        self.get(INTERCEPT).unwrap_or(0.0)
    }

    /// Evaluates the linear predictor.
    ///
    /// Only terms present in both the model and the predictors contribute.
    ///
    /// # Examples
    ///
    /// ```
    /// use prsadjust::adjust;
    /// use prsadjust::adjust::CoefficientModel;
    ///
    /// let model = [("(Intercept)", 1.0), ("PC1", 2.0), ("PC7", 100.0)]
    ///     .into_iter()
    ///     .collect::<CoefficientModel>();
    ///
    /// assert_eq!(model.predict(&adjust::predictors(5.0, &[3.0])), 7.0);
    /// ```
    pub fn predict(&self, predictors: &Predictors) -> f64 {
        predictors
            .iter()
            .filter_map(|(term, value)| self.get(term).map(|coefficient| coefficient * value))
            .fold(self.intercept(), |acc, term| acc + term)
    }

    /// Gets the number of terms, including the intercept.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the model has no terms.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for CoefficientModel {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(term, coefficient)| (term.into(), coefficient))
                .collect(),
        )
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Adjustment
////////////////////////////////////////////////////////////////////////////////////////

/// The result of adjusting a raw score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Adjustment {
    /// The predicted population mean.
    nom: f64,

    /// The predicted population variance.
    denom: f64,

    /// The standardized score.
    adjusted: f64,
}

impl Adjustment {
    /// Gets the predicted population mean.
    pub fn nom(&self) -> f64 {
        self.nom
    }

    /// Gets the predicted population variance.
    pub fn denom(&self) -> f64 {
        self.denom
    }

    /// Gets the standardized score.
    pub fn adjusted(&self) -> f64 {
        self.adjusted
    }
}

/// Standardizes a raw score against the mean and variance models.
///
/// # Examples
///
/// ```
/// use prsadjust::adjust;
/// use prsadjust::adjust::CoefficientModel;
///
/// let mean = [("(Intercept)", 0.0), ("PC1", 1.0)]
///     .into_iter()
///     .collect::<CoefficientModel>();
/// let variance = [("(Intercept)", 4.0)]
///     .into_iter()
///     .collect::<CoefficientModel>();
///
/// let mut loadings = [0.0; 10];
/// loadings[0] = 2.0;
///
/// let adjustment = adjust::adjust(10.0, &loadings, &mean, &variance)?;
/// assert_eq!(adjustment.nom(), 2.0);
/// assert_eq!(adjustment.denom(), 4.0);
/// assert_eq!(adjustment.adjusted(), 4.0);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn adjust(
    prs_raw: f64,
    loadings: &[f64],
    mean: &CoefficientModel,
    variance: &CoefficientModel,
) -> Result<Adjustment, Error> {
    let predictors = predictors(prs_raw, loadings);

    let nom = mean.predict(&predictors);
    let denom = variance.predict(&predictors);
    debug!("predicted mean {nom} and variance {denom}");

    if denom < 0.0 {
        return Err(Error::NegativeVariance(denom));
    }

    let adjusted = (prs_raw - nom) / denom.sqrt();

    if adjusted.is_nan() {
        return Err(Error::NotANumber { nom, denom });
    }

    Ok(Adjustment {
        nom,
        denom,
        adjusted,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::Delimiter;

    /// The mean model of the worked example.
    fn mean_model() -> CoefficientModel {
        [(INTERCEPT, 0.0), ("PC1", 1.0)].into_iter().collect()
    }

    #[test]
    fn test_adjust_worked_example() -> Result<(), Box<dyn std::error::Error>> {
        let variance = [(INTERCEPT, 4.0)].into_iter().collect::<CoefficientModel>();
        let mut loadings = [0.0; 10];
        loadings[0] = 2.0;

        let adjustment = adjust(10.0, &loadings, &mean_model(), &variance)?;

        assert_eq!(adjustment.nom(), 2.0);
        assert_eq!(adjustment.denom(), 4.0);
        assert_eq!(adjustment.adjusted(), 4.0);

        Ok(())
    }

    #[test]
    fn test_adjust_negative_variance() {
        let variance = [(INTERCEPT, 1.0), (RAW_SCORE_TERM, -1.0)]
            .into_iter()
            .collect::<CoefficientModel>();

        let err = adjust(10.0, &[0.0; 10], &mean_model(), &variance).unwrap_err();
        assert_eq!(err, Error::NegativeVariance(-9.0));
    }

    #[test]
    fn test_adjust_nan_is_an_error() {
        let variance = [(INTERCEPT, 1.0)].into_iter().collect::<CoefficientModel>();
        let mut loadings = [0.0; 10];
        loadings[0] = f64::NAN;

        let err = adjust(1.0, &loadings, &mean_model(), &variance).unwrap_err();
        assert!(matches!(err, Error::NotANumber { .. }));
    }

    #[test]
    fn test_predict_uses_shared_terms_only() {
        let model = [(INTERCEPT, 0.5), ("PC2", 2.0), ("PC11", 9.0), ("age", 3.0)]
            .into_iter()
            .collect::<CoefficientModel>();

        let predictors = predictors(1.0, &[1.0, 1.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(model.predict(&predictors), 3.5);
    }

    #[test]
    fn test_predict_without_intercept() {
        let model = [(RAW_SCORE_TERM, 0.5)].into_iter().collect::<CoefficientModel>();
        assert_eq!(model.predict(&predictors(4.0, &[])), 2.0);
    }

    #[test]
    fn test_model_from_r_summary() -> Result<(), Box<dyn std::error::Error>> {
        let text = "\"\",\"Estimate\",\"Std. Error\"\n\
                    \"(Intercept)\",-0.02,0.01\n\
                    \"PC1\",0.5,0.01\n\
                    \"'PC2'\",-0.25,0.01\n\
                    \"prs_raw\",1e-3,0.01\n";
        let table = Table::parse(text, Delimiter::Comma)?;
        let model = CoefficientModel::try_from_table(&table, DEFAULT_ESTIMATE_COLUMN)?;

        assert_eq!(model.len(), 4);
        assert_eq!(model.intercept(), -0.02);
        assert_eq!(model.get("PC2"), Some(-0.25));
        assert_eq!(model.get(RAW_SCORE_TERM), Some(0.001));

        let mut loadings = [0.0; 10];
        loadings[0] = 2.0;
        loadings[1] = 4.0;
        assert_relative_eq!(
            model.predict(&predictors(100.0, &loadings)),
            -0.02 + 1.0 - 1.0 + 0.1,
            epsilon = 1e-12
        );

        Ok(())
    }

    #[test]
    fn test_model_term_containing_delimiter() -> Result<(), Box<dyn std::error::Error>> {
        let text = "\"\",\"Estimate\",\"Std. Error\"\n\
                    \"(Intercept)\",0.25,0.01\n\
                    \"poly(PC1, 2)1\",0.3,0.01\n\
                    \"PC1\",2,0.01\n";
        let table = Table::parse(text, Delimiter::Comma)?;
        let model = CoefficientModel::try_from_table(&table, DEFAULT_ESTIMATE_COLUMN)?;

        assert_eq!(model.len(), 3);
        assert_eq!(model.get("poly(PC1, 2)1"), Some(0.3));
        assert_eq!(model.predict(&predictors(0.0, &[1.0])), 2.25);

        Ok(())
    }

    #[test]
    fn test_model_errors() -> Result<(), Box<dyn std::error::Error>> {
        let table = Table::parse("\"\",\"Value\"\n\"PC1\",1\n", Delimiter::Comma)?;
        assert_eq!(
            CoefficientModel::try_from_table(&table, DEFAULT_ESTIMATE_COLUMN).unwrap_err(),
            ParseError::MissingEstimate("PC1".into(), "Estimate".into())
        );

        let table = Table::parse("\"\",\"Estimate\"\n\"PC1\",NA\n", Delimiter::Comma)?;
        assert_eq!(
            CoefficientModel::try_from_table(&table, DEFAULT_ESTIMATE_COLUMN).unwrap_err(),
            ParseError::InvalidEstimate("PC1".into())
        );

        Ok(())
    }
}
