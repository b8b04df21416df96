//! The location of a reference or coefficient table.

use std::path::PathBuf;
use std::str::FromStr;

use reqwest::Url;
use serde::Deserialize;

/// An error related to the parsing of a [`Location`].
#[derive(Debug)]
pub enum ParseError {
    /// The location was empty.
    Empty,

    /// A `file://` URL did not name a local path.
    InvalidFileUrl(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Empty => write!(f, "location cannot be empty"),
            ParseError::InvalidFileUrl(url) => {
                write!(f, "file url does not name a local path: {url}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Where a table lives.
///
/// `http://` and `https://` URLs are fetched over the network. `file://`
/// URLs and anything that is not a URL are read from the local filesystem.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(try_from = "String")]
pub enum Location {
    /// A remote table.
    Url(Url),

    /// A table on the local filesystem.
    Path(PathBuf),
}

impl FromStr for Location {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.is_empty() {
            return Err(ParseError::Empty);
        }

        match Url::parse(s) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Location::Url(url)),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Location::Path)
                .map_err(|_| ParseError::InvalidFileUrl(s.into())),
            _ => Ok(Location::Path(PathBuf::from(s))),
        }
    }
}

impl TryFrom<String> for Location {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Url> for Location {
    fn from(url: Url) -> Self {
        Location::Url(url)
    }
}

impl From<PathBuf> for Location {
    fn from(path: PathBuf) -> Self {
        Location::Path(path)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Url(url) => write!(f, "{url}"),
            Location::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_str() -> Result<(), Box<dyn std::error::Error>> {
        let location = "http://localhost:8000/1000G_lambda.txt".parse::<Location>()?;
        assert!(matches!(location, Location::Url(_)));
        assert_eq!(location.to_string(), "http://localhost:8000/1000G_lambda.txt");

        let location = "https://example.com/population_model_summary.csv".parse::<Location>()?;
        assert!(matches!(location, Location::Url(_)));

        let location = "reference/1000G_lambda.txt".parse::<Location>()?;
        assert_eq!(
            location,
            Location::Path(PathBuf::from("reference/1000G_lambda.txt"))
        );

        let location = "/data/1000G_lambda.txt".parse::<Location>()?;
        assert_eq!(location, Location::Path(PathBuf::from("/data/1000G_lambda.txt")));

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_location_file_url() -> Result<(), Box<dyn std::error::Error>> {
        let location = "file:///data/1000G_lambda.txt".parse::<Location>()?;
        assert_eq!(location, Location::Path(PathBuf::from("/data/1000G_lambda.txt")));
        Ok(())
    }

    #[test]
    fn test_location_empty() {
        let err = "  ".parse::<Location>().unwrap_err();
        assert_eq!(err.to_string(), "location cannot be empty");
    }
}
