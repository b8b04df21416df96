//! Partitioning of a variant file into per-chromosome chunks.
//!
//! Tab- and comma-delimited files share one algorithm: every line is split
//! on the [`Delimiter`], one surrounding quote character is removed from each
//! column, and the second column is parsed as a [`Chromosome`]. Lines that
//! land on chromosomes 1-22 are kept (quote-stripped, with the original
//! delimiter) in the chunk for that chromosome. Every other line is dropped.

use std::collections::HashMap;

use nonempty::NonEmpty;

use crate::Chromosome;
use crate::Delimiter;

/// The index of the column holding the chromosome number.
pub const CHROMOSOME_COLUMN: usize = 1;

/// The separator used when rejoining the lines of a chunk.
const NEW_LINE: &str = "\n";

/// The variant lines from a single chromosome.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Chunk {
    /// The chromosome shared by every line.
    chromosome: Chromosome,

    /// The quote-stripped lines in file order.
    lines: NonEmpty<String>,
}

impl Chunk {
    /// Creates a chunk holding a single line.
    pub fn new(chromosome: Chromosome, line: String) -> Self {
        Self {
            chromosome,
            lines: NonEmpty::new(line),
        }
    }

    /// Gets the chromosome of the chunk.
    pub fn chromosome(&self) -> Chromosome {
        self.chromosome
    }

    /// Gets the lines within the chunk.
    pub fn lines(&self) -> &NonEmpty<String> {
        &self.lines
    }

    /// Gets the number of lines within the chunk.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// A chunk always holds at least one line.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Appends a line to the end of the chunk.
    pub fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    /// Gets the body sent to the scoring service: the lines joined by new
    /// lines.
    ///
    /// # Examples
    ///
    /// ```
    /// use prsadjust::partition;
    /// use prsadjust::Delimiter;
    ///
    /// let chunks = partition::partition("rs1\t1\tA\nrs2\t1\tC", Delimiter::Tab);
    /// assert_eq!(chunks[0].body(), "rs1\t1\tA\nrs2\t1\tC");
    /// ```
    pub fn body(&self) -> String {
        self.lines
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(NEW_LINE)
    }
}

/// Attempts to read the chromosome of a single line.
///
/// Returns [`None`] when the chromosome column is missing, is not an integer,
/// or is outside of `1..=22`.
pub fn chromosome_of(line: &str, delimiter: Delimiter) -> Option<Chromosome> {
    delimiter
        .split_unquoted(line)
        .nth(CHROMOSOME_COLUMN)
        .and_then(|column| column.parse::<Chromosome>().ok())
}

/// Groups the lines of a file into one [`Chunk`] per chromosome.
///
/// Chunks appear in the order their chromosome was first seen and lines keep
/// their order within a chunk.
///
/// # Examples
///
/// ```
/// use prsadjust::partition;
/// use prsadjust::Delimiter;
///
/// let text = "\"rs1\",\"3\",\"A\"\nrs2,1,C\nrs3,3,G\nrs4,X,T\nrs5,23,A";
/// let chunks = partition::partition(text, Delimiter::Comma);
///
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[0].chromosome().get(), 3);
/// assert_eq!(chunks[0].body(), "rs1,3,A\nrs3,3,G");
/// assert_eq!(chunks[1].chromosome().get(), 1);
/// ```
pub fn partition(text: &str, delimiter: Delimiter) -> Vec<Chunk> {
    let mut chunks = Vec::<Chunk>::new();
    let mut index = HashMap::<Chromosome, usize>::new();

    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        let Some(chromosome) = chromosome_of(line, delimiter) else {
            continue;
        };

        let line = delimiter.normalize(line);

        match index.get(&chromosome) {
            Some(&i) => chunks[i].push(line),
            None => {
                index.insert(chromosome, chunks.len());
                chunks.push(Chunk::new(chromosome, line));
            }
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_tabs() {
        let chunks = partition("rs1\t1\tA\tT\nrs2\t3\tC\tG", Delimiter::Tab);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chromosome().get(), 1);
        assert_eq!(chunks[0].body(), "rs1\t1\tA\tT");
        assert_eq!(chunks[1].chromosome().get(), 3);
        assert_eq!(chunks[1].body(), "rs2\t3\tC\tG");
    }

    #[test]
    fn test_partition_first_appearance_order() {
        let text = "a\t5\nb\t2\nc\t5\nd\t9\ne\t2";
        let chunks = partition(text, Delimiter::Tab);

        let keys = chunks
            .iter()
            .map(|chunk| chunk.chromosome().get())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec![5, 2, 9]);
        assert_eq!(chunks[0].body(), "a\t5\nc\t5");
        assert_eq!(chunks[1].body(), "b\t2\ne\t2");
    }

    #[test]
    fn test_partition_strips_quotes_in_both_formats() {
        let tabs = partition("\"rs1\"\t'1'\t\"A\"", Delimiter::Tab);
        let commas = partition("\"rs1\",'1',\"A\"", Delimiter::Comma);

        assert_eq!(tabs[0].body(), "rs1\t1\tA");
        assert_eq!(commas[0].body(), "rs1,1,A");
    }

    #[test]
    fn test_partition_drops_invalid_chromosomes() {
        let text = "# rsid\tchromosome\n\
                    rsid\tchromosome\tposition\n\
                    rs1\t0\t1\n\
                    rs2\t23\t1\n\
                    rs3\tX\t1\n\
                    rs4\tMT\t1\n\
                    rs5\n\
                    \n\
                    rs6\t22\t1\r\n";
        let chunks = partition(text, Delimiter::Tab);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chromosome().get(), 22);
        assert_eq!(chunks[0].body(), "rs6\t22\t1");
    }

    #[test]
    fn test_partition_keeps_every_autosome_line() {
        let mut text = String::new();
        let mut expected = 0;

        for i in -3i64..30 {
            text.push_str(&format!("rs{i},{i},A,T\n"));
            if (1..=22).contains(&i) {
                expected += 1;
            }
        }

        let chunks = partition(&text, Delimiter::Comma);
        let total = chunks.iter().map(Chunk::len).sum::<usize>();

        assert_eq!(total, expected);
        assert!(chunks
            .iter()
            .all(|chunk| (1..=22).contains(&chunk.chromosome().get())));
    }

    #[test]
    fn test_partition_empty() {
        assert!(partition("", Delimiter::Tab).is_empty());
        assert!(partition("\n\n", Delimiter::Comma).is_empty());
    }
}
