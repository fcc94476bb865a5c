use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use log::{debug, info};

use super::{Dataset, DatasetError, Label, Record};
use crate::config::TextEncoding;

const LABEL_COLUMN: usize = 0;
const TEXT_COLUMN: usize = 1;

/// Reads a headerless `label,text[,...]` corpus from disk.
///
/// The file is decoded with `encoding` before parsing, so a Latin-1 corpus
/// never fails on stray high bytes.
///
/// # Errors
/// - `Io` if the file cannot be read
/// - `Encoding` if the bytes are not valid in the declared encoding
/// - every error [`parse_csv`] can return
pub fn load_csv(path: impl AsRef<Path>, encoding: TextEncoding) -> Result<Dataset, DatasetError> {
    let path = path.as_ref();
    info!("Loading corpus from {:?} ({})", path, encoding);

    let bytes = fs::read(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes", bytes.len());

    let text = encoding.decode(&bytes).map_err(|e| DatasetError::Encoding {
        encoding: encoding.to_string(),
        reason: e.to_string(),
    })?;

    let dataset = parse_csv(&text)?;
    info!(
        "Loaded {} records ({} ham, {} spam)",
        dataset.len(),
        dataset.count(Label::Ham),
        dataset.count(Label::Spam)
    );
    Ok(dataset)
}

/// Parses already-decoded corpus text.
///
/// Column 0 is the label, column 1 the message; any further columns are
/// dropped. The message is kept verbatim. Row numbers in errors count
/// records from 1, not physical lines.
///
/// # Errors
/// - `Csv` for malformed quoting
/// - `MissingColumns` for a row with fewer than two fields
/// - `UnknownLabel` for a label other than `ham` or `spam`
/// - `EmptyDataset` if there are no rows at all
pub fn parse_csv(input: &str) -> Result<Dataset, DatasetError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input.as_bytes());

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row = result?;
        // 1-based record number; a quoted message may span several lines.
        let row_number = i + 1;

        if row.len() <= TEXT_COLUMN {
            return Err(DatasetError::MissingColumns {
                row: row_number,
                found: row.len(),
            });
        }

        let raw_label = &row[LABEL_COLUMN];
        let label = Label::from_raw(raw_label).ok_or_else(|| DatasetError::UnknownLabel {
            row: row_number,
            value: raw_label.to_string(),
        })?;

        records.push(Record::new(label, &row[TEXT_COLUMN]));
    }

    if records.is_empty() {
        return Err(DatasetError::EmptyDataset);
    }
    Ok(Dataset::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_basic_rows() {
        let dataset = parse_csv("ham,See you at 5\nspam,WIN cash now!!\n").unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0], Record::new(Label::Ham, "See you at 5"));
        assert_eq!(dataset.records()[1].label, Label::Spam);
    }

    #[test]
    fn test_extra_columns_are_dropped() {
        let dataset = parse_csv("ham,hello,,,\nspam,\"free, really free\",x\n").unwrap();
        assert_eq!(dataset.texts(), vec!["hello", "free, really free"]);
    }

    #[test]
    fn test_text_is_not_cleaned() {
        let dataset = parse_csv("ham,  MiXeD Case?!  \n").unwrap();
        assert_eq!(dataset.records()[0].text, "  MiXeD Case?!  ");
    }

    #[test]
    fn test_missing_text_column() {
        let err = parse_csv("ham,ok\nspam\n").unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumns { row: 2, found: 1 }));
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let err = parse_csv("ham,ok\nmaybe,what\n").unwrap_err();
        match err {
            DatasetError::UnknownLabel { row, value } => {
                assert_eq!(row, 2);
                assert_eq!(value, "maybe");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_row_counts_records_not_lines() {
        let input = "ham,\"first line\nsecond line\nthird line\"\nspam,ok\nbogus,x\n";
        match parse_csv(input).unwrap_err() {
            DatasetError::UnknownLabel { row, value } => {
                assert_eq!(row, 3);
                assert_eq!(value, "bogus");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = parse_csv("spam,\"two\nlines\"\nham\n").unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumns { row: 2, found: 1 }));
    }

    #[test]
    fn test_multiline_message_is_kept() {
        let dataset = parse_csv("ham,\"see you\nat five\"\n").unwrap();
        assert_eq!(dataset.records()[0].text, "see you\nat five");
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_csv(""), Err(DatasetError::EmptyDataset)));
    }

    #[test]
    fn test_load_latin1_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ham,caf\xe9 tonight?\nspam,Win \xa3100 now\n").unwrap();

        let dataset = load_csv(file.path(), TextEncoding::Latin1).unwrap();
        assert_eq!(dataset.records()[0].text, "caf\u{e9} tonight?");
        assert_eq!(dataset.records()[1].text, "Win \u{a3}100 now");

        let err = load_csv(file.path(), TextEncoding::Utf8).unwrap_err();
        assert!(matches!(err, DatasetError::Encoding { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_csv("/nonexistent/spamsieve/corpus.csv", TextEncoding::Latin1).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
