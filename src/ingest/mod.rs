use crate::errors::DataError;
use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;

/// Columns the apps dataset must carry. Order in the file does not matter.
pub const APP_COLUMNS: &[&str] = &[
    "App",
    "Category",
    "Rating",
    "Reviews",
    "Size",
    "Installs",
    "Type",
    "Price",
    "Content Rating",
    "Genres",
    "Last Updated",
    "Android Ver",
];

/// Columns the reviews dataset must carry.
pub const REVIEW_COLUMNS: &[&str] = &["App", "Translated_Review", "Sentiment_Subjectivity"];

/// Order-preserving, string-typed view of one CSV file. No value is
/// interpreted at this stage; the cleaning pass owns all normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn required_column(&self, table_name: &'static str, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| DataError::schema(table_name, name).into())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The upstream export writes missing values as empty cells or a literal
/// `NaN`; both are treated as absent everywhere downstream.
pub fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}

pub fn load_table(path: &Path, table_name: &'static str, required: &[&str]) -> Result<Table> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {table_name} dataset: {}", path.display()))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read {table_name} header row: {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    for column in required {
        if !headers.iter().any(|header| header == column) {
            return Err(DataError::schema(table_name, column).into());
        }
    }

    let header_count = headers.len();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record =
            record.with_context(|| format!("Failed to read a {table_name} row: {}", path.display()))?;

        // Flexible parsing can yield short or long rows; pad or cut to the
        // header width so column indices stay valid.
        let mut row = record.iter().map(str::to_string).collect::<Vec<_>>();
        row.resize(header_count, String::new());
        rows.push(row);
    }

    Ok(Table { headers, rows })
}
