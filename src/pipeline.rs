//! The end-to-end scoring pipeline.
//!
//! A run takes the raw bytes of a variant file and:
//!
//! 1. rejects gzip-compressed or non-UTF-8 input,
//! 2. [detects](crate::format::detect) the delimiter,
//! 3. [partitions](crate::partition::partition) the lines by chromosome,
//! 4. [dispatches](crate::aggregate::Dispatcher) every chunk to the scoring
//!    service and sums the partial results,
//! 5. [normalizes](crate::normalize::normalize) the loadings by the lambda
//!    table, and
//! 6. [adjusts](crate::adjust::adjust) the raw score with the mean and
//!    variance models.
//!
//! Every failure is terminal for the run and nothing is retried.

use std::str::Utf8Error;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::Delimiter;
use crate::Location;
use crate::adjust;
use crate::adjust::CoefficientModel;
use crate::aggregate::Dispatcher;
use crate::config::Config;
use crate::format;
use crate::normalize;
use crate::normalize::LambdaTable;
use crate::partition;
use crate::scoring;
use crate::table;
use crate::table::Loader;
use crate::table::Table;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// The reasons a variant file cannot be scored.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UnsupportedFormat {
    /// The file is gzip-compressed and must be decompressed first.
    Gzip,

    /// The file is not UTF-8 text.
    NotUtf8(Utf8Error),

    /// The file is not a uniform tab- or comma-delimited table.
    Unrecognized,

    /// No line of the file lies on chromosomes 1-22.
    NoVariants,
}

impl std::fmt::Display for UnsupportedFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnsupportedFormat::Gzip => {
                write!(f, "gzip-compressed files are not supported; decompress first")
            }
            UnsupportedFormat::NotUtf8(err) => write!(f, "file is not UTF-8 text: {err}"),
            UnsupportedFormat::Unrecognized => {
                write!(f, "file is not a uniform tab- or comma-delimited table")
            }
            UnsupportedFormat::NoVariants => {
                write!(f, "file has no variants on chromosomes 1-22")
            }
        }
    }
}

/// The ways a reference table can be malformed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReferenceTableError {
    /// The table could not be parsed at all.
    Table(table::ParseError),

    /// The lambda table lacked valid scale factors.
    Lambda(normalize::ParseError),

    /// A coefficient table lacked valid estimates.
    Model(adjust::ParseError),
}

impl std::fmt::Display for ReferenceTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceTableError::Table(err) => write!(f, "{err}"),
            ReferenceTableError::Lambda(err) => write!(f, "{err}"),
            ReferenceTableError::Model(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ReferenceTableError {}

/// An error that ends a pipeline run.
#[derive(Debug)]
pub enum Error {
    /// The HTTP client could not be created.
    HttpClient(reqwest::Error),

    /// The variant file cannot be scored.
    UnsupportedFormat(UnsupportedFormat),

    /// A reference or coefficient table could not be retrieved.
    Fetch(table::Error),

    /// A reference or coefficient table was retrieved but is malformed.
    InvalidReferenceTable(Location, ReferenceTableError),

    /// A chunk could not be scored.
    ScoringService(scoring::Error),

    /// The loadings and the lambda table differ in length.
    DimensionMismatch(normalize::Error),

    /// The adjustment models produced no real-valued score.
    ModelEvaluation(adjust::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::HttpClient(err) => write!(f, "http client error: {err}"),
            Error::UnsupportedFormat(err) => write!(f, "unsupported format: {err}"),
            Error::Fetch(err) => write!(f, "fetch error: {err}"),
            Error::InvalidReferenceTable(location, err) => {
                write!(f, "invalid reference table {location}: {err}")
            }
            Error::ScoringService(err) => write!(f, "scoring service error: {err}"),
            Error::DimensionMismatch(err) => write!(f, "{err}"),
            Error::ModelEvaluation(err) => write!(f, "model evaluation error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::HttpClient(err) => Some(err),
            Error::Fetch(err) => Some(err),
            Error::ScoringService(err) => Some(err),
            Error::DimensionMismatch(err) => Some(err),
            Error::ModelEvaluation(err) => Some(err),
            Error::UnsupportedFormat(_) | Error::InvalidReferenceTable(_, _) => None,
        }
    }
}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Reports
////////////////////////////////////////////////////////////////////////////////////////

/// Every intermediate value of a successful run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    /// The number of chromosome chunks that were scored.
    pub chunks: usize,

    /// The number of variant lines that were scored.
    pub variants: usize,

    /// The summed raw score.
    pub prs_raw: f64,

    /// The summed loadings.
    pub loadings: Vec<f64>,

    /// The loadings after normalization.
    pub normalized_loadings: Vec<f64>,

    /// The predicted population mean.
    pub nom: f64,

    /// The predicted population variance.
    pub denom: f64,

    /// The ancestry-adjusted score.
    pub prs_adjusted: f64,
}

////////////////////////////////////////////////////////////////////////////////////////
// Pipeline
////////////////////////////////////////////////////////////////////////////////////////

/// Computes ancestry-adjusted scores for variant files.
#[derive(Clone, Debug)]
pub struct Pipeline {
    /// The configuration.
    config: Config,

    /// The table loader.
    loader: Loader,

    /// The chunk dispatcher.
    dispatcher: Dispatcher,
}

impl Pipeline {
    /// Creates a new [`Pipeline`] with an HTTP client built from the
    /// configuration.
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder.build().map_err(Error::HttpClient)?;
        Ok(Self::with_client(config, client))
    }

    /// Creates a new [`Pipeline`] sharing an existing HTTP client.
    pub fn with_client(config: Config, client: reqwest::Client) -> Self {
        let scorer = scoring::Client::new(client.clone(), config.scoring_url.clone());
        let dispatcher = Dispatcher::new(scorer).with_limit(config.max_concurrent_requests);

        Self {
            loader: Loader::new(client),
            dispatcher,
            config,
        }
    }

    /// Gets the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Computes the adjusted score for a variant file.
    pub async fn run(&self, bytes: &[u8], filename: &str) -> Result<f64> {
        self.run_with_report(bytes, filename)
            .await
            .map(|report| report.prs_adjusted)
    }

    /// Computes the adjusted score for a variant file along with every
    /// intermediate value.
    pub async fn run_with_report(&self, bytes: &[u8], filename: &str) -> Result<Report> {
        if format::is_gzipped(filename, bytes) {
            return Err(Error::UnsupportedFormat(UnsupportedFormat::Gzip));
        }

        let text = std::str::from_utf8(bytes)
            .map_err(|err| Error::UnsupportedFormat(UnsupportedFormat::NotUtf8(err)))?;

        let detected = format::detect(text);
        debug!("detected {filename} as {detected}");

        let delimiter = detected
            .delimiter()
            .ok_or(Error::UnsupportedFormat(UnsupportedFormat::Unrecognized))?;

        let chunks = partition::partition(text, delimiter);
        if chunks.is_empty() {
            return Err(Error::UnsupportedFormat(UnsupportedFormat::NoVariants));
        }

        let variants = chunks.iter().map(|chunk| chunk.len()).sum::<usize>();
        info!(
            "partitioned {variants} variants from {filename} into {} chunks",
            chunks.len()
        );

        let aggregate = self
            .dispatcher
            .dispatch(&chunks)
            .await
            .map_err(Error::ScoringService)?;
        info!("raw score: {}", aggregate.prs());

        let lambdas = self.load_lambdas().await?;
        let normalized = normalize::normalize(aggregate.loadings(), &lambdas)
            .map_err(Error::DimensionMismatch)?;

        let (mean, variance) = futures::try_join!(
            self.load_model(&self.config.mean_model),
            self.load_model(&self.config.variance_model),
        )?;

        let adjustment = adjust::adjust(aggregate.prs(), &normalized, &mean, &variance)
            .map_err(Error::ModelEvaluation)?;
        info!("adjusted score: {}", adjustment.adjusted());

        Ok(Report {
            chunks: chunks.len(),
            variants,
            prs_raw: aggregate.prs(),
            loadings: aggregate.loadings().to_vec(),
            normalized_loadings: normalized,
            nom: adjustment.nom(),
            denom: adjustment.denom(),
            prs_adjusted: adjustment.adjusted(),
        })
    }

    /// Loads a table, separating retrieval failures from malformed contents.
    async fn load_table(&self, location: &Location, delimiter: Delimiter) -> Result<Table> {
        self.loader
            .load(location, delimiter)
            .await
            .map_err(|err| match err {
                table::Error::Parse(location, err) => {
                    Error::InvalidReferenceTable(location, ReferenceTableError::Table(err))
                }
                err => Error::Fetch(err),
            })
    }

    /// Loads the tab-delimited lambda table.
    async fn load_lambdas(&self) -> Result<LambdaTable> {
        let location = &self.config.lambda_table;
        let table = self.load_table(location, Delimiter::Tab).await?;

        LambdaTable::try_from_table(&table, &self.config.lambda_column).map_err(|err| {
            Error::InvalidReferenceTable(location.clone(), ReferenceTableError::Lambda(err))
        })
    }

    /// Loads a comma-delimited coefficient table.
    async fn load_model(&self, location: &Location) -> Result<CoefficientModel> {
        let table = self.load_table(location, Delimiter::Comma).await?;
        let model = CoefficientModel::try_from_table(&table, &self.config.estimate_column)
            .map_err(|err| {
                Error::InvalidReferenceTable(location.clone(), ReferenceTableError::Model(err))
            })?;

        debug!("loaded {} coefficients from {location}: {model:?}", model.len());

        Ok(model)
    }
}
