//! A binary to compute the ancestry-adjusted polygenic risk score of a
//! genotype file.
//!
//! ```shell
//! cargo run --release --bin=prsadjust --features=binaries -- \
//!     --config prsadjust.toml genome.txt
//! ```
//!
//! Every field of the configuration file can be overridden on the command
//! line, and the configuration file can be omitted entirely if all of the
//! required locations are provided as flags.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use prsadjust::Config;
use prsadjust::Location;
use prsadjust::Pipeline;
use tracing::info;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;
use url::Url;

////////////////////////////////////////////////////////////////////////////////////////
// Arguments
////////////////////////////////////////////////////////////////////////////////////////

/// Computes an ancestry-adjusted polygenic risk score.
#[derive(Parser)]
struct Args {
    /// The tab- or comma-delimited genotype file to score.
    input: PathBuf,

    /// A TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// The endpoint of the scoring service.
    #[arg(long)]
    scoring_url: Option<Url>,

    /// The location of the tab-delimited lambda table.
    #[arg(long)]
    lambda_table: Option<Location>,

    /// The location of the mean model coefficient table.
    #[arg(long)]
    mean_model: Option<Location>,

    /// The location of the variance model coefficient table.
    #[arg(long)]
    variance_model: Option<Location>,

    /// The maximum number of scoring requests in flight.
    #[arg(short = 'j', long)]
    max_concurrent_requests: Option<NonZeroUsize>,

    /// The timeout of every HTTP request in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Prints every intermediate value as JSON instead of only the score.
    #[arg(short, long, default_value_t = false)]
    report: bool,

    #[command(flatten)]
    verbose: Verbosity,
}

impl Args {
    /// Builds the configuration from the configuration file (if any) and the
    /// command line overrides.
    fn config(&self) -> Result<Config> {
        let config = match &self.config {
            Some(path) => Some(
                Config::from_path(path)
                    .with_context(|| format!("reading configuration {}", path.display()))?,
            ),
            None => None,
        };

        let mut config = match config {
            Some(config) => config,
            None => {
                let (Some(scoring_url), Some(lambda_table), Some(mean_model), Some(variance_model)) = (
                    self.scoring_url.clone(),
                    self.lambda_table.clone(),
                    self.mean_model.clone(),
                    self.variance_model.clone(),
                ) else {
                    bail!(
                        "without `--config`, all of `--scoring-url`, `--lambda-table`, \
                         `--mean-model`, and `--variance-model` are required"
                    );
                };

                Config::new(scoring_url, lambda_table, mean_model, variance_model)
            }
        };

        if let Some(url) = &self.scoring_url {
            config.scoring_url = url.clone();
        }

        if let Some(location) = &self.lambda_table {
            config.lambda_table = location.clone();
        }

        if let Some(location) = &self.mean_model {
            config.mean_model = location.clone();
        }

        if let Some(location) = &self.variance_model {
            config.variance_model = location.clone();
        }

        if self.timeout_secs.is_some() {
            config.timeout_secs = self.timeout_secs;
        }

        if self.max_concurrent_requests.is_some() {
            config = config.with_max_concurrent_requests(self.max_concurrent_requests);
        }

        Ok(config)
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Main
////////////////////////////////////////////////////////////////////////////////////////

async fn score(args: &Args) -> Result<()> {
    let config = args.config()?;
    let pipeline = Pipeline::new(config).context("creating the pipeline")?;

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let filename = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    info!(
        "scoring {} with {}",
        args.input.display(),
        pipeline.config().scoring_url
    );

    let report = pipeline
        .run_with_report(&bytes, &filename)
        .await
        .with_context(|| format!("scoring {}", args.input.display()))?;

    if args.report {
        let json = serde_json::to_string_pretty(&report).context("serializing the report")?;
        println!("{json}");
    } else {
        println!("{}", report.prs_adjusted);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .with_writer(std::io::stderr)
            .init(),
    };

    score(&args).await
}
