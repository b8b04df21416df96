//! The column delimiters supported for variant files and reference tables.

/// The characters stripped from either end of a column value.
const QUOTES: [char; 2] = ['"', '\''];

/// A single-character column delimiter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Delimiter {
    /// A tab character (`\t`).
    Tab,

    /// A comma (`,`).
    Comma,
}

impl Delimiter {
    /// Gets the delimiter character.
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Tab => '\t',
            Delimiter::Comma => ',',
        }
    }

    /// Gets the delimiter as a single byte.
    pub fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
        }
    }

    /// Splits a line into its raw columns.
    pub fn split<'a>(&self, line: &'a str) -> impl Iterator<Item = &'a str> {
        line.split(self.as_char())
    }

    /// Splits a line into columns with one surrounding quote character
    /// removed from each end of every column.
    ///
    /// # Examples
    ///
    /// ```
    /// use prsadjust::Delimiter;
    ///
    /// let columns = Delimiter::Comma
    ///     .split_unquoted(r#""rs1","1",'A',T"#)
    ///     .collect::<Vec<_>>();
    /// assert_eq!(columns, vec!["rs1", "1", "A", "T"]);
    /// ```
    pub fn split_unquoted<'a>(&self, line: &'a str) -> impl Iterator<Item = &'a str> {
        self.split(line).map(unquote)
    }

    /// Rejoins a line after removing the surrounding quotes from every column.
    ///
    /// The delimiter itself is preserved.
    ///
    /// # Examples
    ///
    /// ```
    /// use prsadjust::Delimiter;
    ///
    /// assert_eq!(Delimiter::Tab.normalize("\"rs1\"\t1\tA"), "rs1\t1\tA");
    /// ```
    pub fn normalize(&self, line: &str) -> String {
        let mut result = String::with_capacity(line.len());

        for (i, column) in self.split_unquoted(line).enumerate() {
            if i > 0 {
                result.push(self.as_char());
            }

            result.push_str(column);
        }

        result
    }
}

impl std::fmt::Display for Delimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Delimiter::Tab => write!(f, "tab"),
            Delimiter::Comma => write!(f, "comma"),
        }
    }
}

/// Removes at most one quote character from the start and at most one from
/// the end of a value.
pub fn unquote(value: &str) -> &str {
    let value = value.strip_prefix(QUOTES).unwrap_or(value);
    value.strip_suffix(QUOTES).unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"rs1\""), "rs1");
        assert_eq!(unquote("'rs1'"), "rs1");
        assert_eq!(unquote("\"\"rs1\"\""), "\"rs1\"");
        assert_eq!(unquote("\""), "");
        assert_eq!(unquote("rs1"), "rs1");
        assert_eq!(unquote(""), "");
    }

    #[test]
    fn test_split_unquoted_tab() {
        let columns = Delimiter::Tab
            .split_unquoted("'rs1'\t\"1\"\tA")
            .collect::<Vec<_>>();
        assert_eq!(columns, vec!["rs1", "1", "A"]);
    }

    #[test]
    fn test_normalize_keeps_delimiter() {
        assert_eq!(
            Delimiter::Comma.normalize("\"rs1\",\"1\",\"A\",\"T\""),
            "rs1,1,A,T"
        );
        assert_eq!(Delimiter::Tab.normalize("rs1\t1\tA\tT"), "rs1\t1\tA\tT");
    }

    #[test]
    fn test_normalize_keeps_empty_columns() {
        assert_eq!(Delimiter::Comma.normalize("rs1,,\"\",T"), "rs1,,,T");
    }
}
