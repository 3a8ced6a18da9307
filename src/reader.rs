use std::fs::File;
use std::io::{self, BufReader, Read};
use std::mem;
use std::path::Path;

use encoding_rs::Encoding;
use encoding_rs_rw::DecodingReader;
use log::{debug, warn};

use crate::config::{CsvConfig, Dialect};
use crate::error::{CsvError, ParseErrorKind};
use crate::record::Record;

/// Character source with one-character lookahead.
///
/// Decodes the configured encoding to UTF-8 through [`DecodingReader`] and
/// hands out one `char` at a time. The single-slot peek buffer is what the
/// parser uses to detect doubled quotes and CRLF pairs.
struct CharSource<R: Read> {
    src: BufReader<DecodingReader<BufReader<R>>>,
    peeked: Option<char>,
}

impl<R: Read> CharSource<R> {
    fn new(inner: R, encoding: &'static Encoding) -> Self {
        CharSource {
            src: BufReader::new(DecodingReader::new(
                BufReader::new(inner),
                encoding.new_decoder(),
            )),
            peeked: None,
        }
    }

    fn next(&mut self) -> Result<Option<char>, CsvError> {
        if let Some(ch) = self.peeked.take() {
            return Ok(Some(ch));
        }
        self.decode_one()
    }

    fn peek(&mut self) -> Result<Option<char>, CsvError> {
        if self.peeked.is_none() {
            self.peeked = self.decode_one()?;
        }
        Ok(self.peeked)
    }

    fn decode_one(&mut self) -> Result<Option<char>, CsvError> {
        let mut buf = [0u8; 4];
        match self.src.read_exact(&mut buf[..1]) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let len = utf8_sequence_len(buf[0]);
        if len > 1 {
            self.src.read_exact(&mut buf[1..len])?;
        }
        let decoded = str::from_utf8(&buf[..len]).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "decoder produced invalid UTF-8")
        })?;
        Ok(decoded.chars().next())
    }
}

// The decoder only emits well-formed UTF-8, so the leading byte is enough to
// know how many continuation bytes to pull.
fn utf8_sequence_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

/// Parser position inside the current record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    StartField,
    InUnquotedField,
    InQuotedField,
    AfterQuote,
}

/// A builder for configuring CSV reading.
///
/// # Examples
///
/// ```
/// use csvstream::CsvReaderBuilder;
///
/// let mut reader = CsvReaderBuilder::new()
///     .delimiter(';')
///     .has_headers(true)
///     .from_reader("name;age\nAlice;30\n".as_bytes())
///     .unwrap();
///
/// let record = reader.read().unwrap().unwrap();
/// assert_eq!(record, ["Alice", "30"]);
/// assert!(reader.read().unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct CsvReaderBuilder {
    delimiter: char,
    quote: char,
    has_headers: bool,
    trim_whitespace: bool,
    strict: bool,
    encoding: &'static Encoding,
}

impl Default for CsvReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvReaderBuilder {
    /// Creates a builder with the RFC 4180 dialect, no headers, lenient
    /// parsing, no trimming and UTF-8 decoding.
    pub fn new() -> Self {
        let config = CsvConfig::default();
        CsvReaderBuilder {
            delimiter: config.dialect.delimiter(),
            quote: config.dialect.quote(),
            has_headers: config.has_headers,
            trim_whitespace: config.trim_whitespace,
            strict: config.strict,
            encoding: config.encoding,
        }
    }

    /// Sets the field delimiter character.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the quote character.
    pub fn quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    /// Sets both dialect characters at once.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.delimiter = dialect.delimiter();
        self.quote = dialect.quote();
        self
    }

    /// Treats the first row as a header row. The header is available through
    /// [`CsvReader::headers`] and is excluded from data records.
    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }

    /// Trims leading and trailing whitespace from unquoted fields.
    pub fn trim_whitespace(mut self, yes: bool) -> Self {
        self.trim_whitespace = yes;
        self
    }

    /// In strict mode structural faults raise [`CsvError::Parse`]; in the
    /// default lenient mode the offending quote character is kept as a
    /// literal and parsing continues.
    pub fn strict(mut self, yes: bool) -> Self {
        self.strict = yes;
        self
    }

    /// Sets the character encoding of the byte stream.
    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    fn build_config(&self) -> Result<CsvConfig, CsvError> {
        Ok(CsvConfig {
            dialect: Dialect::new(self.delimiter, self.quote)?,
            has_headers: self.has_headers,
            quote_all_fields: false,
            trim_whitespace: self.trim_whitespace,
            strict: self.strict,
            encoding: self.encoding,
        })
    }

    /// Creates a [`CsvReader`] over any byte source.
    ///
    /// The reader takes exclusive ownership of the source and releases it
    /// when dropped. Fails with [`CsvError::Configuration`] when the dialect
    /// characters are invalid.
    pub fn from_reader<R: Read>(self, rdr: R) -> Result<CsvReader<R>, CsvError> {
        let config = self.build_config()?;
        debug!(
            "csv reader: delimiter={:?} quote={:?} headers={} strict={} encoding={}",
            config.dialect.delimiter(),
            config.dialect.quote(),
            config.has_headers,
            config.strict,
            config.encoding.name()
        );
        Ok(CsvReader {
            chars: CharSource::new(rdr, config.encoding),
            header_pending: config.has_headers,
            config,
            headers: None,
            records_read: 0,
            done: false,
        })
    }

    /// Creates a [`CsvReader`] over a file.
    ///
    /// A file that cannot be opened for reading is a configuration fault,
    /// reported before any parsing starts.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<CsvReader<File>, CsvError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            CsvError::Configuration(format!("cannot open {} for reading: {e}", path.display()))
        })?;
        self.from_reader(file)
    }
}

/// A streaming CSV reader.
///
/// Drives a four-state machine one character at a time over the decoded
/// input, producing one [`Record`] per call to [`read`](CsvReader::read)
/// without ever buffering the whole stream. The reader is single-pass: once
/// the input is exhausted, every further call returns `Ok(None)`.
///
/// Line endings may be CRLF, LF or bare CR; a CRLF pair counts as a single
/// record boundary. Newlines inside quoted fields are field content, not
/// boundaries.
///
/// ```
/// use csvstream::CsvReaderBuilder;
///
/// let input = "a,\"b,c\",d\n\"a \"\"quoted\"\" value\"\n";
/// let mut reader = CsvReaderBuilder::new().from_reader(input.as_bytes()).unwrap();
///
/// assert_eq!(reader.read().unwrap().unwrap(), ["a", "b,c", "d"]);
/// assert_eq!(reader.read().unwrap().unwrap(), ["a \"quoted\" value"]);
/// assert!(reader.read().unwrap().is_none());
/// ```
pub struct CsvReader<R: Read> {
    chars: CharSource<R>,
    config: CsvConfig,
    headers: Option<Record>,
    header_pending: bool,
    records_read: u64,
    done: bool,
}

impl<R: Read> CsvReader<R> {
    /// Reads the next data record.
    ///
    /// Returns `Ok(None)` once the input is exhausted, and keeps returning
    /// it on subsequent calls. In strict mode a structural fault raises
    /// [`CsvError::Parse`] carrying the zero-based index of the record being
    /// parsed; the reader is exhausted afterwards and should be abandoned.
    pub fn read(&mut self) -> Result<Option<Record>, CsvError> {
        self.consume_header_row()?;
        match self.parse_row()? {
            Some(record) => {
                self.records_read += 1;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// The header row, when the configuration declares one.
    ///
    /// Parses and caches the first physical row on first use; the header is
    /// never returned by [`read`](CsvReader::read) and does not count toward
    /// record indices. Returns `Ok(None)` when `has_headers` is not set.
    pub fn headers(&mut self) -> Result<Option<&Record>, CsvError> {
        self.consume_header_row()?;
        Ok(self.headers.as_ref())
    }

    /// Number of data records returned so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// The configuration this reader was built with.
    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    /// Consumes the reader, turning it into a lazy iterator of records.
    ///
    /// The iterator is finite and single-pass; a second pass requires a
    /// fresh reader over a fresh stream.
    pub fn records(self) -> Records<R> {
        Records { reader: self }
    }

    fn consume_header_row(&mut self) -> Result<(), CsvError> {
        if self.header_pending {
            self.header_pending = false;
            self.headers = self.parse_row()?;
        }
        Ok(())
    }

    /// Runs the state machine up to the next record boundary or end of
    /// input. Does not touch the record counter.
    fn parse_row(&mut self) -> Result<Option<Record>, CsvError> {
        if self.done {
            return Ok(None);
        }

        let delimiter = self.config.dialect.delimiter();
        let quote = self.config.dialect.quote();

        let mut state = ParseState::StartField;
        let mut fields: Vec<String> = Vec::new();
        let mut field = String::new();
        // Quoted fields keep their whitespace even when trimming is on.
        let mut field_was_quoted = false;
        let mut consumed_any = false;

        loop {
            let Some(ch) = self.chars.next()? else {
                if !consumed_any {
                    self.done = true;
                    return Ok(None);
                }
                if state == ParseState::InQuotedField && self.config.strict {
                    self.done = true;
                    return Err(CsvError::Parse {
                        record: self.records_read,
                        kind: ParseErrorKind::UnterminatedQuote,
                    });
                }
                // Finalize the record in progress even without a trailing
                // newline; the next call reports end of input.
                self.finish_field(&mut fields, &mut field, field_was_quoted);
                self.done = true;
                return Ok(Some(Record::new(fields)));
            };
            consumed_any = true;

            match state {
                ParseState::StartField => {
                    if ch == quote {
                        field_was_quoted = true;
                        state = ParseState::InQuotedField;
                    } else if ch == delimiter {
                        self.finish_field(&mut fields, &mut field, field_was_quoted);
                        field_was_quoted = false;
                    } else if ch == '\r' || ch == '\n' {
                        self.collapse_crlf(ch)?;
                        self.finish_field(&mut fields, &mut field, field_was_quoted);
                        break;
                    } else {
                        field.push(ch);
                        state = ParseState::InUnquotedField;
                    }
                }
                ParseState::InUnquotedField => {
                    if ch == delimiter {
                        self.finish_field(&mut fields, &mut field, field_was_quoted);
                        field_was_quoted = false;
                        state = ParseState::StartField;
                    } else if ch == '\r' || ch == '\n' {
                        self.collapse_crlf(ch)?;
                        self.finish_field(&mut fields, &mut field, field_was_quoted);
                        break;
                    } else if ch == quote {
                        if self.config.strict {
                            self.done = true;
                            return Err(CsvError::Parse {
                                record: self.records_read,
                                kind: ParseErrorKind::UnexpectedQuote,
                            });
                        }
                        warn!(
                            "record {}: quote character inside unquoted field, kept as literal",
                            self.records_read
                        );
                        field.push(ch);
                    } else {
                        field.push(ch);
                    }
                }
                ParseState::InQuotedField => {
                    if ch == quote {
                        if self.chars.peek()? == Some(quote) {
                            self.chars.next()?;
                            field.push(quote);
                        } else {
                            state = ParseState::AfterQuote;
                        }
                    } else {
                        // Newlines inside quotes are field content.
                        field.push(ch);
                    }
                }
                ParseState::AfterQuote => {
                    if ch == delimiter {
                        self.finish_field(&mut fields, &mut field, field_was_quoted);
                        field_was_quoted = false;
                        state = ParseState::StartField;
                    } else if ch == '\r' || ch == '\n' {
                        self.collapse_crlf(ch)?;
                        self.finish_field(&mut fields, &mut field, field_was_quoted);
                        break;
                    } else {
                        if self.config.strict {
                            self.done = true;
                            return Err(CsvError::Parse {
                                record: self.records_read,
                                kind: ParseErrorKind::UnexpectedQuote,
                            });
                        }
                        warn!(
                            "record {}: character after closing quote, continuing field as unquoted",
                            self.records_read
                        );
                        field.push(ch);
                        state = ParseState::InUnquotedField;
                    }
                }
            }
        }

        Ok(Some(Record::new(fields)))
    }

    /// A `\r` immediately followed by `\n` is one record boundary.
    fn collapse_crlf(&mut self, ch: char) -> Result<(), CsvError> {
        if ch == '\r' && self.chars.peek()? == Some('\n') {
            self.chars.next()?;
        }
        Ok(())
    }

    fn finish_field(&self, fields: &mut Vec<String>, field: &mut String, was_quoted: bool) {
        if self.config.trim_whitespace && !was_quoted {
            fields.push(field.trim().to_string());
            field.clear();
        } else {
            fields.push(mem::take(field));
        }
    }
}

/// Lazy iterator of records, created by [`CsvReader::records`].
pub struct Records<R: Read> {
    reader: CsvReader<R>,
}

impl<R: Read> Iterator for Records<R> {
    type Item = Result<Record, CsvError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read().transpose()
    }
}
