use thiserror::Error;

/// The structural fault a strict-mode parse ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// End of input was reached while still inside a quoted field.
    UnterminatedQuote,
    /// A quote character appeared in the middle of an unquoted field or
    /// immediately after a closing quote.
    UnexpectedQuote,
}

impl ParseErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::UnterminatedQuote => "unterminated quoted field at end of input",
            ParseErrorKind::UnexpectedQuote => "quote character in invalid position",
        }
    }
}

/// Errors produced by the CSV reader and writer.
///
/// `Parse` is only ever raised in strict mode; in lenient mode the same
/// conditions are recovered by treating the offending quote character as a
/// literal and parsing continues.
#[derive(Error, Debug)]
pub enum CsvError {
    /// Invalid construction arguments, raised before any IO happens.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Malformed input detected mid-stream in strict mode. `record` is the
    /// zero-based index of the record being parsed when the fault occurred.
    #[error("parse error in record {record}: {}", kind.as_str())]
    Parse { record: u64, kind: ParseErrorKind },

    /// Failure of the underlying stream or of the character decoder.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
