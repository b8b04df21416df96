//! Detection of the tabular format of a variant file.

use crate::Delimiter;

/// The prefix of a comment line.
pub const COMMENT_PREFIX: char = '#';

/// The file name suffix of a gzip-compressed file.
pub const GZIP_SUFFIX: &str = ".gz";

/// The magic bytes at the start of every gzip stream.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// The format of a variant file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    /// Tab-delimited text.
    Tabs,

    /// Comma-delimited text.
    Commas,

    /// Anything else: no delimiter, ragged columns, or no content.
    Unrecognized,
}

impl Format {
    /// Gets the delimiter for the format, if the format was recognized.
    pub fn delimiter(&self) -> Option<Delimiter> {
        match self {
            Format::Tabs => Some(Delimiter::Tab),
            Format::Commas => Some(Delimiter::Comma),
            Format::Unrecognized => None,
        }
    }
}

impl From<Delimiter> for Format {
    fn from(delimiter: Delimiter) -> Self {
        match delimiter {
            Delimiter::Tab => Format::Tabs,
            Delimiter::Comma => Format::Commas,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Tabs => write!(f, "tab-delimited"),
            Format::Commas => write!(f, "comma-delimited"),
            Format::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Returns whether a file is gzip-compressed, judging by its name or by the
/// first bytes of its contents.
pub fn is_gzipped(filename: &str, bytes: &[u8]) -> bool {
    filename.ends_with(GZIP_SUFFIX) || bytes.starts_with(&GZIP_MAGIC)
}

/// Returns whether a line carries data (i.e., is neither blank nor a
/// comment).
pub fn is_substantive(line: &str) -> bool {
    !line.starts_with(COMMENT_PREFIX) && !line.trim().is_empty()
}

/// Detects the format of a variant file from its full text.
///
/// The delimiter is chosen from the first substantive line (a tab wins over a
/// comma). Every later substantive line must split into the same number of
/// columns; the first line that does not makes the whole file
/// [`Format::Unrecognized`].
///
/// # Examples
///
/// ```
/// use prsadjust::format;
/// use prsadjust::format::Format;
///
/// assert_eq!(format::detect("# header\nrs1\t1\tA\nrs2\t3\tC\n"), Format::Tabs);
/// assert_eq!(format::detect("rs1,1,A\nrs2,3\n"), Format::Unrecognized);
/// assert_eq!(format::detect("\n\n"), Format::Unrecognized);
/// ```
pub fn detect(text: &str) -> Format {
    let mut delimiter: Option<Delimiter> = None;
    let mut columns: Option<usize> = None;

    for line in text.lines().filter(|line| is_substantive(line)) {
        let current = match delimiter {
            Some(current) => current,
            None => {
                let found = if line.contains(Delimiter::Tab.as_char()) {
                    Delimiter::Tab
                } else if line.contains(Delimiter::Comma.as_char()) {
                    Delimiter::Comma
                } else {
                    return Format::Unrecognized;
                };

                delimiter = Some(found);
                found
            }
        };

        let n = current.split(line).count();

        match columns {
            None => columns = Some(n),
            Some(expected) if expected != n => return Format::Unrecognized,
            Some(_) => {}
        }
    }

    delimiter.map(Format::from).unwrap_or(Format::Unrecognized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_tabs() {
        assert_eq!(detect("rs1\t1\tA\tT\nrs2\t3\tC\tG"), Format::Tabs);
    }

    #[test]
    fn test_detect_commas() {
        assert_eq!(detect("rs1,1,A,T\r\nrs2,3,C,G\r\n"), Format::Commas);
    }

    #[test]
    fn test_detect_tab_wins_over_comma() {
        assert_eq!(detect("rs1\t1\tA,T\nrs2\t3\tC,G"), Format::Tabs);
    }

    #[test]
    fn test_detect_skips_comments_and_blank_lines() {
        let text = "# rsid\tchromosome\tposition\n\n   \nrs1,1,100\n#,,,,,\nrs2,2,200\n";
        assert_eq!(detect(text), Format::Commas);
    }

    #[test]
    fn test_detect_ragged() {
        assert_eq!(detect("rs1\t1\tA\tT\nrs2\t3\tC"), Format::Unrecognized);
        assert_eq!(detect("rs1,1\nrs2,3\nrs3,4,5"), Format::Unrecognized);
    }

    #[test]
    fn test_detect_no_delimiter() {
        assert_eq!(detect("rs1 1 A T\nrs2 3 C G"), Format::Unrecognized);
    }

    #[test]
    fn test_detect_empty() {
        assert_eq!(detect(""), Format::Unrecognized);
        assert_eq!(detect("# only a comment\n\n"), Format::Unrecognized);
    }

    #[test]
    fn test_detect_uniform_tables_are_recognized() {
        for columns in 2..8 {
            for rows in 1..5 {
                for delimiter in [Delimiter::Tab, Delimiter::Comma] {
                    let separator = delimiter.as_char().to_string();
                    let line = vec!["x"; columns].join(separator.as_str());
                    let text = vec![line; rows].join("\n");
                    assert_eq!(detect(&text), Format::from(delimiter));
                }
            }
        }
    }

    #[test]
    fn test_is_gzipped() {
        assert!(is_gzipped("genome.txt.gz", b"rs1\t1"));
        assert!(is_gzipped("genome.txt", &[0x1f, 0x8b, 0x08]));
        assert!(!is_gzipped("genome.txt", b"rs1\t1"));
        assert!(!is_gzipped("genome.gz.txt", b""));
    }
}
