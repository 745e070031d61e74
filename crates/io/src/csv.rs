// CSV files as row sources

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sentinel_recon::{Row, Value};

use crate::error::SourceError;
use crate::RowSource;

/// A single CSV file with a header row. The table name is ignored.
pub struct CsvSource {
    path: PathBuf,
    label: String,
    content: String,
}

impl CsvSource {
    pub fn open(path: &Path, label: &str) -> Result<Self, SourceError> {
        let content = read_file_as_utf8(path).map_err(|e| SourceError::Connect {
            label: label.to_string(),
            message: format!("{}: {e}", path.display()),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            label: label.to_string(),
            content,
        })
    }
}

impl RowSource for CsvSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn fetch_table(&self, table: &str, filter: Option<&str>) -> Result<Vec<Row>, SourceError> {
        let fetch_err = |message: String| SourceError::Fetch {
            label: self.label.clone(),
            table: table.to_string(),
            message,
        };

        if filter.is_some_and(|f| !f.trim().is_empty()) {
            return Err(fetch_err("WHERE filters are not supported for CSV sources".into()));
        }

        let rows = parse_rows(&self.content, sniff_delimiter(&self.content)).map_err(fetch_err)?;
        log::debug!("{}: read {} row(s) from {}", self.label, rows.len(), self.path.display());
        Ok(rows)
    }

    fn primary_key(&self, _table: &str) -> Result<Vec<String>, SourceError> {
        Ok(Vec::new())
    }
}

fn parse_rows(content: &str, delimiter: u8) -> Result<Vec<Row>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut seen = HashSet::new();
    if let Some(dup) = headers.iter().find(|h| !seen.insert(h.as_str())) {
        return Err(format!("duplicate column '{dup}' in header"));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, field)| (h.as_str(), infer_value(field)))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Typed value for a CSV field: empty → Null, then boolean, integer, float,
/// falling back to text.
pub fn infer_value(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    if field.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if field.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }
    if let Ok(i) = field.parse::<i64>() {
        return Value::Integer(i);
    }
    // Only plain decimal notation counts as a float; "inf"/"NaN" stay text.
    if field.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(f) = field.parse::<f64>() {
            if f.is_finite() {
                return Value::Float(f);
            }
        }
    }
    Value::Text(field.to_string())
}

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Records looked at when picking a delimiter.
const SNIFF_RECORDS: usize = 5;

/// Pick the delimiter that splits the header into the most columns and gives
/// every sampled record that same width. Comma wins ties and is the fallback
/// for single-column files.
fn sniff_delimiter(content: &str) -> u8 {
    let mut best = (b',', 1);

    for delimiter in DELIMITERS {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut widths = reader.records().take(SNIFF_RECORDS + 1).map(|r| r.map(|r| r.len()).ok());
        let Some(Some(columns)) = widths.next() else { continue };
        if columns > best.1 && widths.all(|w| w == Some(columns)) {
            best = (delimiter, columns);
        }
    }

    best.0
}

/// Read a CSV file as text. A UTF-8 byte order mark is dropped so it does not
/// end up in the first column name; bytes that are not valid UTF-8 are taken
/// as Windows-1252, which is what spreadsheet exports usually are.
fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;

    let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
    if !had_errors {
        return Ok(text.into_owned());
    }

    log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
    let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(&bytes);
    Ok(text.into_owned())
}
