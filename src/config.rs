//! Configuration of a pipeline run.
//!
//! The locations of the scoring service and of the reference tables are never
//! embedded in the pipeline; they are supplied through a [`Config`], usually
//! read from a TOML file such as
//!
//! ```toml
//! scoring_url = "https://scoring.example.org/calc/CalcPRS"
//! lambda_table = "http://localhost:8000/1000G_lambda.txt"
//! mean_model = "http://localhost:8000/population_model_summary.csv"
//! variance_model = "http://localhost:8000/population_var_model_summary.csv"
//! max_concurrent_requests = 8
//! ```

use std::io;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use url::Url;

use crate::Location;
use crate::adjust::DEFAULT_ESTIMATE_COLUMN;
use crate::normalize::DEFAULT_LAMBDA_COLUMN;

/// An error related to loading a [`Config`].
#[derive(Debug)]
pub enum Error {
    /// The configuration file could not be read.
    Io(PathBuf, io::Error),

    /// The configuration was not valid TOML or was missing fields.
    Parse(toml::de::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(path, err) => write!(f, "failed to read {}: {err}", path.display()),
            Error::Parse(err) => write!(f, "invalid configuration: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// The configuration of a pipeline run.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The endpoint of the scoring service.
    pub scoring_url: Url,

    /// The tab-delimited lambda table.
    pub lambda_table: Location,

    /// The comma-delimited coefficient table of the mean model.
    pub mean_model: Location,

    /// The comma-delimited coefficient table of the variance model.
    pub variance_model: Location,

    /// The lambda table column holding the scale factors.
    #[serde(default = "default_lambda_column")]
    pub lambda_column: String,

    /// The coefficient table column holding the estimates.
    #[serde(default = "default_estimate_column")]
    pub estimate_column: String,

    /// The maximum number of scoring requests in flight (unbounded if unset).
    #[serde(default)]
    pub max_concurrent_requests: Option<NonZeroUsize>,

    /// The timeout of every HTTP request in seconds (none if unset).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// The default lambda column.
fn default_lambda_column() -> String {
    DEFAULT_LAMBDA_COLUMN.to_string()
}

/// The default estimate column.
fn default_estimate_column() -> String {
    DEFAULT_ESTIMATE_COLUMN.to_string()
}

impl Config {
    /// Creates a new [`Config`] with default columns and no request limits.
    pub fn new(
        scoring_url: Url,
        lambda_table: Location,
        mean_model: Location,
        variance_model: Location,
    ) -> Self {
        Self {
            scoring_url,
            lambda_table,
            mean_model,
            variance_model,
            lambda_column: default_lambda_column(),
            estimate_column: default_estimate_column(),
            max_concurrent_requests: None,
            timeout_secs: None,
        }
    }

    /// Reads a configuration from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|err| Error::Io(path.to_path_buf(), err))?;

        text.parse()
    }

    /// Bounds the number of scoring requests in flight.
    pub fn with_max_concurrent_requests(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.max_concurrent_requests = limit;
        self
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).map_err(Error::Parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_str() -> Result<(), Box<dyn std::error::Error>> {
        let config = r#"
            scoring_url = "https://scoring.example.org/calc/CalcPRS"
            lambda_table = "http://localhost:8000/1000G_lambda.txt"
            mean_model = "reference/population_model_summary.csv"
            variance_model = "reference/population_var_model_summary.csv"
            max_concurrent_requests = 4
        "#
        .parse::<Config>()?;

        assert_eq!(
            config.scoring_url.as_str(),
            "https://scoring.example.org/calc/CalcPRS"
        );
        assert!(matches!(config.lambda_table, Location::Url(_)));
        assert_eq!(
            config.mean_model,
            Location::Path("reference/population_model_summary.csv".into())
        );
        assert_eq!(config.lambda_column, "out.d");
        assert_eq!(config.estimate_column, "Estimate");
        assert_eq!(config.max_concurrent_requests, NonZeroUsize::new(4));
        assert_eq!(config.timeout_secs, None);

        Ok(())
    }

    #[test]
    fn test_config_missing_field() {
        let err = r#"scoring_url = "https://scoring.example.org""#
            .parse::<Config>()
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_config_rejects_zero_limit() {
        let err = r#"
            scoring_url = "https://scoring.example.org"
            lambda_table = "a.tsv"
            mean_model = "b.csv"
            variance_model = "c.csv"
            max_concurrent_requests = 0
        "#
        .parse::<Config>()
        .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_config_from_missing_path() {
        let err = Config::from_path("/this/path/does/not/exist.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_, _)));
    }
}
