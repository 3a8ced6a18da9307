use csvstream::{CsvError, CsvReaderBuilder, CsvWriterBuilder, ParseErrorKind, Record};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn strict_unterminated_quote_reports_record_zero() {
    init_logging();
    let mut reader = CsvReaderBuilder::new()
        .strict(true)
        .from_reader("\"a,b\n".as_bytes())
        .unwrap();

    match reader.read() {
        Err(CsvError::Parse { record, kind }) => {
            assert_eq!(record, 0);
            assert_eq!(kind, ParseErrorKind::UnterminatedQuote);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn lenient_mode_does_not_raise_on_the_same_input() {
    init_logging();
    let mut reader = CsvReaderBuilder::new()
        .from_reader("\"a,b\n".as_bytes())
        .unwrap();
    assert!(reader.read().unwrap().is_some());
}

#[test]
fn fault_in_later_record_carries_its_index() {
    let input = "good,row\n\"fine, quoted\",row\nbad\"row\n";
    let mut reader = CsvReaderBuilder::new()
        .strict(true)
        .from_reader(input.as_bytes())
        .unwrap();

    assert!(reader.read().unwrap().is_some());
    assert!(reader.read().unwrap().is_some());
    match reader.read() {
        Err(CsvError::Parse { record, kind }) => {
            assert_eq!(record, 2);
            assert_eq!(kind, ParseErrorKind::UnexpectedQuote);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    // No retry semantics: the reader is exhausted after the fault.
    assert!(reader.read().unwrap().is_none());
}

#[test]
fn records_iterator_surfaces_the_error_in_place() {
    let input = "a\n\"broken\nnever,reached\n";
    let reader = CsvReaderBuilder::new()
        .strict(true)
        .from_reader(input.as_bytes())
        .unwrap();

    let mut results = reader.records();
    assert!(results.next().unwrap().is_ok());
    assert!(results.next().unwrap().is_err());
    assert!(results.next().is_none());
}

#[test]
fn writer_rejects_missing_header_record() {
    let result = CsvWriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());
    match result {
        Err(CsvError::Configuration(message)) => {
            assert!(message.contains("header"));
        }
        _ => panic!("expected configuration error"),
    }
}

#[test]
fn unreadable_path_is_a_configuration_error() {
    let result = CsvReaderBuilder::new().from_path("/definitely/not/here.csv");
    assert!(matches!(result, Err(CsvError::Configuration(_))));
}

#[test]
fn unwritable_path_is_a_configuration_error() {
    let result = CsvWriterBuilder::new()
        .header(Record::new(vec!["h".to_string()]))
        .from_path("/definitely/not/here/out.csv");
    assert!(matches!(result, Err(CsvError::Configuration(_))));
}

#[test]
fn equal_dialect_characters_are_rejected_everywhere() {
    assert!(
        CsvReaderBuilder::new()
            .delimiter('\'')
            .quote('\'')
            .from_reader("x\n".as_bytes())
            .is_err()
    );
    assert!(
        CsvWriterBuilder::new()
            .delimiter('\'')
            .quote('\'')
            .from_writer(Vec::new())
            .is_err()
    );
}

#[test]
fn malformed_bytes_for_the_encoding_surface_as_io_errors() {
    // 0xff is never valid UTF-8; the decoding layer reports it.
    let bytes: &[u8] = b"a,\xff\n";
    let mut reader = CsvReaderBuilder::new().from_reader(bytes).unwrap();
    assert!(matches!(reader.read(), Err(CsvError::Io(_))));
}
