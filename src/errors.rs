use thiserror::Error;

/// Error type for dataset loading and value normalization failures.
///
/// Both variants are fatal: downstream arithmetic assumes schema and numeric
/// validity, so there is no partial-data fallback for them. Fields that may
/// legitimately be absent (size unit, date, subjectivity) degrade to a missing
/// value instead of raising.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataError {
    #[error("required column '{column}' is missing from the {table} table")]
    Schema { table: &'static str, column: String },
    #[error("invalid {field} value '{value}'")]
    Parse { field: &'static str, value: String },
}

impl DataError {
    pub fn schema(table: &'static str, column: &str) -> Self {
        Self::Schema {
            table,
            column: column.to_string(),
        }
    }

    pub fn parse(field: &'static str, value: &str) -> Self {
        Self::Parse {
            field,
            value: value.to_string(),
        }
    }
}
