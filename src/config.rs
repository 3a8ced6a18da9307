use encoding_rs::{Encoding, UTF_8};

use crate::error::CsvError;

/// The pair of syntactic characters that define a CSV variant.
///
/// A dialect is an immutable value: build one with [`Dialect::new`] or use
/// the RFC 4180 default of `(',', '"')`.
///
/// ```
/// use csvstream::Dialect;
///
/// let tsv = Dialect::new('\t', '"').unwrap();
/// assert_eq!(tsv.delimiter(), '\t');
///
/// // The delimiter and quote must differ, and neither may be a line break.
/// assert!(Dialect::new(';', ';').is_err());
/// assert!(Dialect::new('\n', '"').is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    delimiter: char,
    quote: char,
}

impl Dialect {
    /// Creates a dialect from a delimiter and a quote character.
    ///
    /// Returns [`CsvError::Configuration`] when the two characters are equal
    /// or when either is `\r` or `\n`, since such a dialect cannot be parsed
    /// unambiguously.
    pub fn new(delimiter: char, quote: char) -> Result<Self, CsvError> {
        if delimiter == quote {
            return Err(CsvError::Configuration(format!(
                "delimiter and quote must differ, both are {delimiter:?}"
            )));
        }
        if delimiter == '\r' || delimiter == '\n' || quote == '\r' || quote == '\n' {
            return Err(CsvError::Configuration(
                "delimiter and quote must not be line break characters".to_string(),
            ));
        }
        Ok(Dialect { delimiter, quote })
    }

    /// The field separator character.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// The quoting character.
    pub fn quote(&self) -> char {
        self.quote
    }
}

impl Default for Dialect {
    /// The RFC 4180 dialect: comma delimited, double-quote quoted.
    fn default() -> Self {
        Dialect {
            delimiter: ',',
            quote: '"',
        }
    }
}

/// Behavioral configuration shared by [`CsvReader`](crate::CsvReader) and
/// [`CsvWriter`](crate::CsvWriter).
///
/// A configuration is immutable once the reader or writer owning it has been
/// constructed. The fields:
///
/// - `dialect`: the delimiter/quote pair.
/// - `has_headers`: the first row is a header row. The reader parses it once
///   and excludes it from data records; the writer requires a header record
///   at construction and emits it before the first data record.
/// - `quote_all_fields`: the writer quotes every field instead of only the
///   fields that need it.
/// - `trim_whitespace`: the reader trims leading and trailing whitespace
///   from unquoted fields. Quoted fields are never trimmed.
/// - `strict`: structural faults raise [`CsvError::Parse`](crate::CsvError)
///   instead of being recovered as literal characters.
/// - `encoding`: the character encoding of the underlying byte stream.
#[derive(Debug, Clone, Copy)]
pub struct CsvConfig {
    pub dialect: Dialect,
    pub has_headers: bool,
    pub quote_all_fields: bool,
    pub trim_whitespace: bool,
    pub strict: bool,
    pub encoding: &'static Encoding,
}

impl Default for CsvConfig {
    fn default() -> Self {
        CsvConfig {
            dialect: Dialect::default(),
            has_headers: false,
            quote_all_fields: false,
            trim_whitespace: false,
            strict: false,
            encoding: UTF_8,
        }
    }
}
