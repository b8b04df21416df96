//! Loading of delimited reference and coefficient tables.
//!
//! A table is a header line followed by rows. Each row is exposed as a
//! [`Row`] keyed by the (quote-stripped) header names, and each cell is a
//! [`Value`] that is numeric whenever the cell parses as a number.

use std::collections::HashMap;
use std::io;

use reqwest::StatusCode;
use tracing::debug;

use crate::Delimiter;
use crate::Location;
use crate::delimiter::unquote;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to the parsing of a table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The table had no header line.
    MissingHeader,

    /// A record could not be read.
    InvalidRecord(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingHeader => write!(f, "table has no header line"),
            ParseError::InvalidRecord(err) => write!(f, "invalid record: {err}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to loading a table.
#[derive(Debug)]
pub enum Error {
    /// The request for a remote table could not be completed.
    Request(Location, reqwest::Error),

    /// A remote table was answered with a non-success status.
    Status(Location, StatusCode),

    /// A local table could not be read.
    Io(Location, io::Error),

    /// The table contents could not be parsed.
    Parse(Location, ParseError),
}

impl Error {
    /// Gets the location of the table that failed to load.
    pub fn location(&self) -> &Location {
        match self {
            Error::Request(location, _)
            | Error::Status(location, _)
            | Error::Io(location, _)
            | Error::Parse(location, _) => location,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Request(location, err) => write!(f, "failed to fetch {location}: {err}"),
            Error::Status(location, status) => {
                write!(f, "failed to fetch {location}: status {status}")
            }
            Error::Io(location, err) => write!(f, "failed to read {location}: {err}"),
            Error::Parse(location, err) => write!(f, "failed to parse {location}: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Request(_, err) => Some(err),
            Error::Status(_, _) => None,
            Error::Io(_, err) => Some(err),
            Error::Parse(_, err) => Some(err),
        }
    }
}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Values and rows
////////////////////////////////////////////////////////////////////////////////////////

/// A single cell within a table.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A cell that parsed as a floating-point number.
    Number(f64),

    /// Any other cell, kept as text.
    Text(String),
}

impl Value {
    /// Attempts to read the value as a number.
    ///
    /// Text that is a quoted number (e.g., `"0.25"`) is also accepted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => unquote(s).trim().parse().ok(),
        }
    }

    /// Gets the value as text, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Number(_) => None,
            Value::Text(s) => Some(s),
        }
    }
}

impl From<&str> for Value {
    fn from(cell: &str) -> Self {
        let cell = cell.trim();

        match cell.parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(cell.to_string()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A row of a table keyed by header name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row(HashMap<String, Value>);

impl Row {
    /// Gets the value of a column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Gets the number of cells in the row.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Tables
////////////////////////////////////////////////////////////////////////////////////////

/// A parsed delimited table.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    /// The header names in column order.
    headers: Vec<String>,

    /// The rows in file order.
    rows: Vec<Row>,
}

impl Table {
    /// Parses a table from its text.
    ///
    /// Fields are read as delimited text with double-quote quoting, so a
    /// quoted field may contain the delimiter (e.g., the R term
    /// `"poly(PC1, 2)1"`). Header names additionally have one surrounding
    /// single or double quote character removed, so the R header
    /// `"","Estimate"` yields the names `` and `Estimate`. Cells beyond the
    /// last header are ignored, missing trailing cells are absent from the
    /// row, and blank lines are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use prsadjust::Delimiter;
    /// use prsadjust::table::Table;
    /// use prsadjust::table::Value;
    ///
    /// let text = "\"\",\"Estimate\"\n\"(Intercept)\",0.5\n\"poly(PC1, 2)1\",-1.25\n";
    /// let table = Table::parse(text, Delimiter::Comma)?;
    ///
    /// assert_eq!(table.headers(), &["", "Estimate"]);
    /// assert_eq!(table.rows().len(), 2);
    /// assert_eq!(table.rows()[1].get("Estimate"), Some(&Value::Number(-1.25)));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn parse(text: &str, delimiter: Delimiter) -> std::result::Result<Self, ParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter.as_byte())
            .flexible(true)
            .from_reader(text.trim().as_bytes());

        let headers = reader
            .headers()
            .map_err(|err| ParseError::InvalidRecord(err.to_string()))?
            .iter()
            .map(|name| unquote(name.trim()).to_string())
            .collect::<Vec<_>>();

        if headers.iter().all(|name| name.is_empty()) {
            return Err(ParseError::MissingHeader);
        }

        let mut rows = Vec::new();

        for result in reader.records() {
            let record = result.map_err(|err| ParseError::InvalidRecord(err.to_string()))?;

            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            let row = headers
                .iter()
                .cloned()
                .zip(record.iter().map(Value::from))
                .collect::<Row>();

            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Gets the header names.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Gets the rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Loader
////////////////////////////////////////////////////////////////////////////////////////

/// Fetches tables from their [`Location`]s.
#[derive(Clone, Debug, Default)]
pub struct Loader {
    /// The HTTP client used for remote tables.
    client: reqwest::Client,
}

impl Loader {
    /// Creates a new [`Loader`] sharing an HTTP client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetches the raw text at a location.
    pub async fn fetch(&self, location: &Location) -> Result<String> {
        match location {
            Location::Url(url) => {
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|err| Error::Request(location.clone(), err))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(Error::Status(location.clone(), status));
                }

                response
                    .text()
                    .await
                    .map_err(|err| Error::Request(location.clone(), err))
            }
            Location::Path(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|err| Error::Io(location.clone(), err)),
        }
    }

    /// Fetches and parses the table at a location.
    pub async fn load(&self, location: &Location, delimiter: Delimiter) -> Result<Table> {
        let text = self.fetch(location).await?;
        let table =
            Table::parse(&text, delimiter).map_err(|err| Error::Parse(location.clone(), err))?;

        debug!(
            "loaded {} rows with columns {:?} from {location}",
            table.rows().len(),
            table.headers()
        );

        Ok(table)
    }
}
