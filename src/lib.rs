#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # csvstream

 A streaming CSV codec: a character-driven reader that turns a byte stream
 into discrete [`Record`]s without buffering the whole input, and a writer
 that serializes records back to delimited text with correct quoting and
 escaping for a configurable [`Dialect`].

 ## Core concepts

 - **[`Dialect`]:** the pair of syntactic characters (delimiter, quote) that
   defines a CSV variant. Defaults to the RFC 4180 pair `(',', '"')`.
 - **[`CsvConfig`]:** a dialect plus behavioral flags (headers, strict or
   lenient parsing, quote-all output, whitespace trimming, encoding).
 - **[`Record`]:** one logical row, an ordered immutable sequence of string
   fields with structural equality.
 - **[`CsvReader`]:** a four-state machine consuming one character at a time,
   producing records lazily. Accepts CRLF, LF and bare CR record boundaries.
 - **[`CsvWriter`]:** serializes records one line at a time, quoting fields
   that contain the delimiter, the quote character or a line break, and
   doubling embedded quotes.

 Readers and writers are built through [`CsvReaderBuilder`] and
 [`CsvWriterBuilder`], own their stream exclusively and release it when
 dropped. Both are synchronous, single-pass and meant for one consumer;
 the writer flushes on drop as a last resort.

 ## Strict and lenient parsing

 In strict mode a structural fault (quote character in the middle of an
 unquoted field, content after a closing quote, unterminated quoted field at
 end of input) raises [`CsvError::Parse`] carrying the zero-based record
 index. In the default lenient mode the offending quote is kept as a literal
 character and parsing continues.

 ## Getting started

 ```rust
 use csvstream::{CsvError, CsvReaderBuilder, CsvWriterBuilder, Record};

 fn main() -> Result<(), CsvError> {
     let input = "year,make,model\n1948,Porsche,356\n1967,Ford,\"Mustang, fastback\"\n";

     let reader = CsvReaderBuilder::new()
         .has_headers(true)
         .from_reader(input.as_bytes())?;

     let mut writer = CsvWriterBuilder::new()
         .delimiter(';')
         .from_writer(Vec::new())?;

     for record in reader.records() {
         writer.write(&record?)?;
     }
     writer.flush()?;

     let output = String::from_utf8(writer.get_ref().clone()).unwrap();
     assert_eq!(output, "1948;Porsche;356\n1967;Ford;Mustang, fastback\n");
     Ok(())
 }
 ```

 ## Encodings

 Input decoding and output encoding are configurable per reader/writer via
 [`encoding_rs`] encodings; the default is UTF-8.

 ```rust
 use csvstream::CsvReaderBuilder;
 use encoding_rs::WINDOWS_1252;

 let bytes: &[u8] = b"caf\xe9,th\xe9\n";
 let mut reader = CsvReaderBuilder::new()
     .encoding(WINDOWS_1252)
     .from_reader(bytes)
     .unwrap();
 assert_eq!(reader.read().unwrap().unwrap(), ["café", "thé"]);
 ```
*/

/// Dialect and configuration model.
pub mod config;

/// Error types shared by the reader and the writer.
pub mod error;

/// The streaming reader and its parsing state machine.
pub mod reader;

/// The record data model.
pub mod record;

/// The serializing writer.
pub mod writer;

#[doc(inline)]
pub use config::{CsvConfig, Dialect};
#[doc(inline)]
pub use error::{CsvError, ParseErrorKind};
#[doc(inline)]
pub use reader::{CsvReader, CsvReaderBuilder, Records};
#[doc(inline)]
pub use record::Record;
#[doc(inline)]
pub use writer::{CsvWriter, CsvWriterBuilder};
