//! A client for the external per-chromosome scoring service.
//!
//! The service receives the lines of one [`Chunk`] as a plain-text `POST` body
//! and answers with a JSON object holding the raw score for the chunk (`prs`)
//! and its principal-component loadings (`loadings`).

use reqwest::StatusCode;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::debug;

use crate::Chromosome;
use crate::NUM_PRINCIPAL_COMPONENTS;
use crate::partition::Chunk;

/// The content type of a scoring request.
const TEXT_PLAIN: &str = "text/plain";

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to scoring a single chunk.
#[derive(Debug)]
pub enum Error {
    /// The request could not be completed.
    Request(Chromosome, reqwest::Error),

    /// The service answered with a non-success status.
    Status(Chromosome, StatusCode),

    /// The response body was not a valid scoring result.
    InvalidBody(Chromosome, serde_json::Error),

    /// The response held the wrong number of loadings.
    InvalidLoadings(Chromosome, usize),
}

impl Error {
    /// Gets the chromosome of the chunk that failed.
    pub fn chromosome(&self) -> Chromosome {
        match self {
            Error::Request(chromosome, _)
            | Error::Status(chromosome, _)
            | Error::InvalidBody(chromosome, _)
            | Error::InvalidLoadings(chromosome, _) => *chromosome,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Request(chromosome, err) => {
                write!(f, "scoring request for {chromosome} failed: {err}")
            }
            Error::Status(chromosome, status) => {
                write!(f, "scoring service rejected {chromosome}: status {status}")
            }
            Error::InvalidBody(chromosome, err) => {
                write!(f, "invalid scoring response for {chromosome}: {err}")
            }
            Error::InvalidLoadings(chromosome, n) => write!(
                f,
                "invalid scoring response for {chromosome}: expected \
                 {NUM_PRINCIPAL_COMPONENTS} loadings, found {n} loadings"
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Request(_, err) => Some(err),
            Error::InvalidBody(_, err) => Some(err),
            Error::Status(_, _) | Error::InvalidLoadings(_, _) => None,
        }
    }
}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Partial results
////////////////////////////////////////////////////////////////////////////////////////

/// The scoring service's answer as it arrives on the wire.
#[derive(Debug, Deserialize)]
struct Response {
    /// The raw score.
    prs: f64,

    /// The principal-component loadings.
    loadings: Vec<f64>,
}

/// The score contribution of a single chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartialResult {
    /// The raw score contribution.
    prs: f64,

    /// The loading contribution for each principal component.
    loadings: [f64; NUM_PRINCIPAL_COMPONENTS],
}

impl PartialResult {
    /// Creates a new [`PartialResult`].
    pub fn new(prs: f64, loadings: [f64; NUM_PRINCIPAL_COMPONENTS]) -> Self {
        Self { prs, loadings }
    }

    /// Parses the JSON body returned for the chunk on `chromosome`.
    ///
    /// # Examples
    ///
    /// ```
    /// use prsadjust::Chromosome;
    /// use prsadjust::scoring::PartialResult;
    ///
    /// let chromosome = Chromosome::try_from(1i64)?;
    /// let body = r#"{"prs": 0.5, "loadings": [1, 2, 3, 4, 5, 6, 7, 8, 9, 10]}"#;
    /// let result = PartialResult::from_json(chromosome, body)?;
    ///
    /// assert_eq!(result.prs(), 0.5);
    /// assert_eq!(result.loadings()[9], 10.0);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_json(chromosome: Chromosome, body: &str) -> Result<Self> {
        let response = serde_json::from_str::<Response>(body)
            .map_err(|err| Error::InvalidBody(chromosome, err))?;

        let n = response.loadings.len();
        let loadings = <[f64; NUM_PRINCIPAL_COMPONENTS]>::try_from(response.loadings)
            .map_err(|_| Error::InvalidLoadings(chromosome, n))?;

        Ok(Self::new(response.prs, loadings))
    }

    /// Gets the raw score contribution.
    pub fn prs(&self) -> f64 {
        self.prs
    }

    /// Gets the loading contributions.
    pub fn loadings(&self) -> &[f64; NUM_PRINCIPAL_COMPONENTS] {
        &self.loadings
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Client
////////////////////////////////////////////////////////////////////////////////////////

/// A client for the scoring service.
#[derive(Clone, Debug)]
pub struct Client {
    /// The HTTP client.
    http: reqwest::Client,

    /// The scoring endpoint.
    endpoint: Url,
}

impl Client {
    /// Creates a new [`Client`] for the given endpoint.
    pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    /// Gets the scoring endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Scores a single chunk.
    pub async fn score(&self, chunk: &Chunk) -> Result<PartialResult> {
        let chromosome = chunk.chromosome();

        debug!(
            "scoring {chromosome}: sending {} lines to {}",
            chunk.len(),
            self.endpoint
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, TEXT_PLAIN)
            .body(chunk.body())
            .send()
            .await
            .map_err(|err| Error::Request(chromosome, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(chromosome, status));
        }

        let body = response
            .text()
            .await
            .map_err(|err| Error::Request(chromosome, err))?;

        let result = PartialResult::from_json(chromosome, &body)?;
        debug!("scored {chromosome}: {result:?}");

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;
    use wiremock::matchers::body_string;
    use wiremock::matchers::header;
    use wiremock::matchers::method;
    use wiremock::matchers::path;

    use super::*;
    use crate::Delimiter;
    use crate::partition::partition;

    /// Gets the chromosome with the given number.
    fn chr(n: i64) -> Chromosome {
        Chromosome::try_from(n).unwrap()
    }

    #[test]
    fn test_from_json() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let result = PartialResult::from_json(
            chr(2),
            r#"{"prs": -1.5, "loadings": [0, 0, 0, 0, 0, 0, 0, 0, 0, 0.5], "extra": true}"#,
        )?;

        assert_eq!(result.prs(), -1.5);
        assert_eq!(result.loadings()[9], 0.5);

        Ok(())
    }

    #[test]
    fn test_from_json_missing_fields() {
        let err = PartialResult::from_json(chr(4), r#"{"loadings": []}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidBody(_, _)));
        assert_eq!(err.chromosome(), chr(4));

        let err = PartialResult::from_json(chr(4), r#"{"prs": 1}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidBody(_, _)));

        let err = PartialResult::from_json(chr(4), "not json").unwrap_err();
        assert!(matches!(err, Error::InvalidBody(_, _)));
    }

    #[test]
    fn test_from_json_wrong_dimension() {
        let err = PartialResult::from_json(chr(5), r#"{"prs": 1, "loadings": [1, 2, 3]}"#)
            .unwrap_err();

        assert!(matches!(err, Error::InvalidLoadings(_, 3)));
        assert_eq!(
            err.to_string(),
            "invalid scoring response for chr5: expected 10 loadings, found 3 loadings"
        );
    }

    #[tokio::test]
    async fn test_score() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/calc/CalcPRS"))
            .and(header("content-type", "text/plain"))
            .and(body_string("rs1\t1\tA\tT\nrs3\t1\tG\tC"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"prs": 0.75, "loadings": [1, 1, 1, 1, 1, 1, 1, 1, 1, 1]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let chunks = partition("rs1\t1\tA\tT\nrs2\t2\tC\tG\nrs3\t1\tG\tC", Delimiter::Tab);
        let endpoint = Url::parse(&format!("{}/calc/CalcPRS", server.uri()))?;
        let client = Client::new(reqwest::Client::new(), endpoint);

        let result = client.score(&chunks[0]).await?;
        assert_eq!(result.prs(), 0.75);
        assert_eq!(result.loadings(), &[1.0; NUM_PRINCIPAL_COMPONENTS]);

        Ok(())
    }

    #[tokio::test]
    async fn test_score_status() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let chunks = partition("rs1\t7\tA\tT", Delimiter::Tab);
        let client = Client::new(reqwest::Client::new(), Url::parse(&server.uri())?);

        let err = client.score(&chunks[0]).await.unwrap_err();
        assert!(matches!(err, Error::Status(_, StatusCode::BAD_GATEWAY)));
        assert_eq!(err.chromosome(), chr(7));

        Ok(())
    }
}
