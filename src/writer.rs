use std::borrow::Borrow;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use encoding_rs::Encoding;
use encoding_rs_rw::EncodingWriter;
use encoding_rs_rw::misc::DefaultBuffer;
use log::{debug, trace};

use crate::config::{CsvConfig, Dialect};
use crate::error::CsvError;
use crate::record::Record;

/// A builder for configuring CSV writing.
///
/// Supplying a header record with [`header`](CsvWriterBuilder::header)
/// enables header output; declaring headers with
/// [`has_headers`](CsvWriterBuilder::has_headers) without supplying a record
/// is rejected at construction.
///
/// # Examples
///
/// ```
/// use csvstream::{CsvWriterBuilder, Record};
///
/// let header: Record = ["city", "pop"].into_iter().collect();
/// let mut writer = CsvWriterBuilder::new()
///     .header(header)
///     .from_writer(Vec::new())
///     .unwrap();
///
/// let row: Record = ["Boston", "4628910"].into_iter().collect();
/// writer.write(&row).unwrap();
/// writer.flush().unwrap();
///
/// assert_eq!(writer.get_ref().as_slice(), b"city,pop\nBoston,4628910\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CsvWriterBuilder {
    delimiter: Option<char>,
    quote: Option<char>,
    has_headers: bool,
    quote_all_fields: bool,
    encoding: Option<&'static Encoding>,
    header: Option<Record>,
}

impl CsvWriterBuilder {
    /// Creates a builder with the RFC 4180 dialect, no header and UTF-8
    /// output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the field delimiter character.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Sets the quote character.
    pub fn quote(mut self, quote: char) -> Self {
        self.quote = Some(quote);
        self
    }

    /// Sets both dialect characters at once.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.delimiter = Some(dialect.delimiter());
        self.quote = Some(dialect.quote());
        self
    }

    /// Declares that a header row must be written. Requires a header record
    /// to be supplied with [`header`](CsvWriterBuilder::header).
    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }

    /// Sets the header record and enables header output.
    pub fn header(mut self, header: Record) -> Self {
        self.has_headers = true;
        self.header = Some(header);
        self
    }

    /// Quotes every field instead of only the fields that need it.
    pub fn quote_all_fields(mut self, yes: bool) -> Self {
        self.quote_all_fields = yes;
        self
    }

    /// Sets the character encoding of the produced bytes.
    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    fn build_config(&self) -> Result<CsvConfig, CsvError> {
        let defaults = CsvConfig::default();
        Ok(CsvConfig {
            dialect: Dialect::new(
                self.delimiter.unwrap_or(defaults.dialect.delimiter()),
                self.quote.unwrap_or(defaults.dialect.quote()),
            )?,
            has_headers: self.has_headers,
            quote_all_fields: self.quote_all_fields,
            trim_whitespace: false,
            strict: false,
            encoding: self.encoding.unwrap_or(defaults.encoding),
        })
    }

    /// Creates a [`CsvWriter`] over any byte sink.
    ///
    /// Fails with [`CsvError::Configuration`] when the dialect characters
    /// are invalid or when headers are declared without a header record.
    pub fn from_writer<W: Write>(self, wtr: W) -> Result<CsvWriter<W>, CsvError> {
        let config = self.build_config()?;
        if config.has_headers && self.header.is_none() {
            return Err(CsvError::Configuration(
                "headers declared but no header record supplied".to_string(),
            ));
        }
        debug!(
            "csv writer: delimiter={:?} quote={:?} headers={} quote_all={} encoding={}",
            config.dialect.delimiter(),
            config.dialect.quote(),
            config.has_headers,
            config.quote_all_fields,
            config.encoding.name()
        );
        Ok(CsvWriter {
            out: EncodingWriter::new(wtr, config.encoding.new_encoder()),
            config,
            header: self.header,
            header_written: false,
            records_written: 0,
        })
    }

    /// Creates a [`CsvWriter`] over a freshly created file.
    ///
    /// A file that cannot be created is a configuration fault, reported
    /// before anything is written.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<CsvWriter<File>, CsvError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            CsvError::Configuration(format!("cannot open {} for writing: {e}", path.display()))
        })?;
        self.from_writer(file)
    }
}

/// A streaming CSV writer.
///
/// Serializes one [`Record`] per line, quoting fields that contain the
/// delimiter, the quote character or a line break (or every field when
/// `quote_all_fields` is set) and doubling quote characters inside quoted
/// fields. The emitted line terminator is always `\n`.
///
/// The writer owns its sink for its whole lifetime. Dropping the writer
/// performs a final best-effort flush; call [`flush`](CsvWriter::flush)
/// explicitly when the outcome matters.
pub struct CsvWriter<W: Write> {
    out: EncodingWriter<DefaultBuffer<W>>,
    config: CsvConfig,
    header: Option<Record>,
    header_written: bool,
    records_written: u64,
}

impl<W: Write> CsvWriter<W> {
    /// Writes the configured header record.
    ///
    /// Idempotent: the header goes out exactly once per writer lifetime, no
    /// matter how often this is called, and not at all when no header was
    /// configured.
    pub fn write_header(&mut self) -> Result<(), CsvError> {
        if self.header_written {
            return Ok(());
        }
        self.header_written = true;
        if let Some(header) = &self.header {
            let line = serialize_record(&self.config, header);
            self.out.write_all(line.as_bytes())?;
            trace!("header written");
        }
        Ok(())
    }

    /// Serializes one record and emits it as a single line, writing the
    /// header first when one is configured and still pending.
    pub fn write(&mut self, record: &Record) -> Result<(), CsvError> {
        self.write_header()?;
        let line = serialize_record(&self.config, record);
        self.out.write_all(line.as_bytes())?;
        self.records_written += 1;
        Ok(())
    }

    /// Writes every record in order, header first, then flushes.
    pub fn write_all<I>(&mut self, records: I) -> Result<(), CsvError>
    where
        I: IntoIterator,
        I::Item: Borrow<Record>,
    {
        self.write_header()?;
        for record in records {
            self.write(record.borrow())?;
        }
        self.flush()
    }

    /// Forces buffered output through to the underlying sink.
    pub fn flush(&mut self) -> Result<(), CsvError> {
        self.out.flush()?;
        Ok(())
    }

    /// Number of data records written so far. The header does not count.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// The configuration this writer was built with.
    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    /// Borrowed view of the underlying sink.
    ///
    /// Flush first when inspecting a buffer-backed sink, otherwise encoded
    /// output may still be in flight.
    pub fn get_ref(&self) -> &W {
        self.out.writer_ref()
    }
}

impl<W: Write> Drop for CsvWriter<W> {
    fn drop(&mut self) {
        let _ = self.out.flush();
    }
}

fn serialize_record(config: &CsvConfig, record: &Record) -> String {
    let delimiter = config.dialect.delimiter();
    let quote = config.dialect.quote();
    let mut line = String::new();
    for (i, field) in record.iter().enumerate() {
        if i > 0 {
            line.push(delimiter);
        }
        if needs_quoting(config, field) {
            line.push(quote);
            for ch in field.chars() {
                if ch == quote {
                    line.push(quote);
                }
                line.push(ch);
            }
            line.push(quote);
        } else {
            line.push_str(field);
        }
    }
    line.push('\n');
    line
}

// Quoting decisions are per field; one hazardous field never forces its
// neighbors into quotes.
fn needs_quoting(config: &CsvConfig, field: &str) -> bool {
    config.quote_all_fields
        || field.contains(config.dialect.delimiter())
        || field.contains(config.dialect.quote())
        || field.contains('\r')
        || field.contains('\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> Record {
        fields.iter().copied().collect()
    }

    fn written(writer: &mut CsvWriter<Vec<u8>>) -> String {
        writer.flush().unwrap();
        String::from_utf8(writer.get_ref().clone()).unwrap()
    }

    #[test]
    fn plain_fields_are_not_quoted() {
        let mut wtr = CsvWriterBuilder::new().from_writer(Vec::new()).unwrap();
        wtr.write(&record(&["a", "b", "c"])).unwrap();
        assert_eq!(written(&mut wtr), "a,b,c\n");
    }

    #[test]
    fn field_with_quote_is_quoted_and_doubled() {
        let mut wtr = CsvWriterBuilder::new().from_writer(Vec::new()).unwrap();
        wtr.write(&record(&["she said \"hi\""])).unwrap();
        assert_eq!(written(&mut wtr), "\"she said \"\"hi\"\"\"\n");
    }

    #[test]
    fn field_with_delimiter_or_newline_is_quoted() {
        let mut wtr = CsvWriterBuilder::new().from_writer(Vec::new()).unwrap();
        wtr.write(&record(&["a,b", "x\ny", "plain"])).unwrap();
        assert_eq!(written(&mut wtr), "\"a,b\",\"x\ny\",plain\n");
    }

    #[test]
    fn quote_all_fields_quotes_everything() {
        let mut wtr = CsvWriterBuilder::new()
            .quote_all_fields(true)
            .from_writer(Vec::new())
            .unwrap();
        wtr.write(&record(&["a", ""])).unwrap();
        assert_eq!(written(&mut wtr), "\"a\",\"\"\n");
    }

    #[test]
    fn header_is_written_once_and_first() {
        let mut wtr = CsvWriterBuilder::new()
            .header(record(&["h1", "h2"]))
            .from_writer(Vec::new())
            .unwrap();
        wtr.write_header().unwrap();
        wtr.write_header().unwrap();
        wtr.write(&record(&["a", "b"])).unwrap();
        assert_eq!(written(&mut wtr), "h1,h2\na,b\n");
        assert_eq!(wtr.records_written(), 1);
    }

    #[test]
    fn write_emits_pending_header_automatically() {
        let mut wtr = CsvWriterBuilder::new()
            .header(record(&["h"]))
            .from_writer(Vec::new())
            .unwrap();
        wtr.write(&record(&["x"])).unwrap();
        assert_eq!(written(&mut wtr), "h\nx\n");
    }

    #[test]
    fn headers_without_header_record_is_a_configuration_error() {
        let result = CsvWriterBuilder::new()
            .has_headers(true)
            .from_writer(Vec::new());
        assert!(matches!(result, Err(CsvError::Configuration(_))));
    }

    #[test]
    fn write_all_keeps_order_and_flushes() {
        let mut wtr = CsvWriterBuilder::new().from_writer(Vec::new()).unwrap();
        let records = vec![record(&["1"]), record(&["2"]), record(&["3"])];
        wtr.write_all(&records).unwrap();
        assert_eq!(wtr.get_ref().as_slice(), b"1\n2\n3\n");
        assert_eq!(wtr.records_written(), 3);
    }

    #[test]
    fn custom_dialect_serialization() {
        let mut wtr = CsvWriterBuilder::new()
            .delimiter(';')
            .quote('\'')
            .from_writer(Vec::new())
            .unwrap();
        wtr.write(&record(&["x;y", "it's"])).unwrap();
        assert_eq!(written(&mut wtr), "'x;y';'it''s'\n");
    }

    #[test]
    fn invalid_dialect_is_rejected() {
        let result = CsvWriterBuilder::new()
            .delimiter('\n')
            .from_writer(Vec::new());
        assert!(matches!(result, Err(CsvError::Configuration(_))));
    }

    #[test]
    fn empty_record_is_an_empty_line() {
        let mut wtr = CsvWriterBuilder::new().from_writer(Vec::new()).unwrap();
        wtr.write(&Record::default()).unwrap();
        assert_eq!(written(&mut wtr), "\n");
    }
}
