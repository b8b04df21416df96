//! `prsadjust` is a crate for computing ancestry-adjusted polygenic risk
//! scores.
//!
//! A genotype file is scored in pieces by an external scoring service: the
//! file is split by chromosome, each chromosome is scored remotely, and the
//! partial raw scores and principal-component loadings are summed. The sum is
//! then adjusted for ancestry using reference tables:
//!
//! - a lambda table that scales each of the ten loadings, and
//! - two linear models predicting the population mean and variance of the raw
//!   score from the loadings, which turn the raw score into a z-score.
//!
//! ## Running the pipeline
//!
//! Most users will want the [`Pipeline`], which takes the raw bytes of a
//! variant file and returns the adjusted score (or a classified
//! [`pipeline::Error`]). The locations of the scoring service and the tables
//! are supplied through a [`Config`].
//!
//! ```no_run
//! use prsadjust::Config;
//! use prsadjust::Pipeline;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_path("prsadjust.toml")?;
//! let pipeline = Pipeline::new(config)?;
//!
//! let bytes = std::fs::read("genome.txt")?;
//! let score = pipeline.run(&bytes, "genome.txt").await?;
//! println!("{score}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Individual steps
//!
//! Every step is also exposed on its own. For example, detecting the format
//! of a file and partitioning it by chromosome:
//!
//! ```
//! use prsadjust::format;
//! use prsadjust::partition;
//!
//! let text = "rs1\t1\tA\tT\nrs2\t3\tC\tG";
//! let delimiter = format::detect(text).delimiter().unwrap();
//! let chunks = partition::partition(text, delimiter);
//!
//! assert_eq!(chunks.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod adjust;
pub mod aggregate;
pub mod chromosome;
pub mod config;
pub mod delimiter;
pub mod format;
pub mod location;
pub mod normalize;
pub mod partition;
pub mod pipeline;
pub mod scoring;
pub mod table;

pub use chromosome::Chromosome;
pub use config::Config;
pub use delimiter::Delimiter;
pub use location::Location;

pub use self::pipeline::Pipeline;

/// The number of principal components used for ancestry adjustment.
pub const NUM_PRINCIPAL_COMPONENTS: usize = 10;
