use csv::ReaderBuilder;

use crate::errors::FeedParseError;

const MARKUP_SIGNATURES: &[&str] = &["<!doctype", "<html", "<?xml", "<head", "<body"];

/// Parses a raw UTF-8 payload into rows of cells, honoring RFC4180 quoting:
/// quoted cells may contain the delimiter and embedded newlines, and a
/// doubled quote inside a quoted cell is a literal quote. `\r\n` and `\n`
/// line endings are treated uniformly and trailing blank lines are dropped.
///
/// A payload that opens with a markup signature is rejected outright. An
/// error page served where delimited text was expected must surface as a
/// distinct failure, because a silently empty row set is indistinguishable
/// from "no data this period".
pub fn parse_document(text: &str) -> Result<Vec<Vec<String>>, FeedParseError> {
    let head = text.trim_start().to_ascii_lowercase();
    for sig in MARKUP_SIGNATURES {
        if head.starts_with(sig) {
            return Err(FeedParseError::NotTabular {
                reason: format!("payload begins with markup signature '{sig}'"),
            });
        }
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    // Drop trailing rows that contain nothing but empty cells.
    while rows
        .last()
        .is_some_and(|row: &Vec<String>| row.iter().all(|cell| cell.trim().is_empty()))
    {
        rows.pop();
    }

    Ok(rows)
}
