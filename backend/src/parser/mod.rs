//! CSV reader with encoding and delimiter auto-detection.
//!
//! Produces a [`RawSheet`]: verbatim rows, variable width, no header
//! inference. Locating the header is the extractor's job.

use std::path::Path;

use crate::error::{ParseError, ParseResult};
use crate::models::{RawSheet, SheetInfo};

/// Candidate delimiters, in tie-break order.
const DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Lines inspected for delimiter detection. Banner rows come first, so the
/// first line alone is not representative.
const DELIMITER_SAMPLE_LINES: usize = 20;

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding.
///
/// Unknown encodings and invalid UTF-8 fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter from the busiest of the first lines.
///
/// Each candidate scores its maximum per-line count; the highest score wins,
/// ties go to the earlier candidate. Defaults to `,`.
pub fn detect_delimiter(content: &str) -> char {
    let lines: Vec<&str> = content.lines().take(DELIMITER_SAMPLE_LINES).collect();

    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &DELIMITERS {
        let count = lines
            .iter()
            .map(|line| line.matches(sep).count())
            .max()
            .unwrap_or(0);
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse decoded text with an explicit delimiter.
pub fn parse_str(content: &str, delimiter: char) -> ParseResult<RawSheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter_byte(delimiter))
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    if rows.is_empty() {
        return Err(ParseError::EmptyFile);
    }

    Ok(RawSheet::new(rows).with_info(SheetInfo {
        encoding: "utf-8".to_string(),
        delimiter,
    }))
}

/// Parse raw bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> ParseResult<RawSheet> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);

    let sheet = parse_str(&content, delimiter)?;
    Ok(sheet.with_info(SheetInfo {
        encoding,
        delimiter,
    }))
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let sheet = parse_file_auto("/path/to/export.csv")?;
/// println!("Encoding: {}, Delimiter: '{}'", sheet.info.encoding, sheet.info.delimiter);
/// ```
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> ParseResult<RawSheet> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

fn delimiter_byte(delimiter: char) -> u8 {
    if delimiter.is_ascii() {
        delimiter as u8
    } else {
        b','
    }
}
