//! Uploaded table parsing
//!
//! Both uploads arrive as CSV text. This module decodes them into uniform
//! in-memory tables of strings; numeric interpretation happens later, in
//! the visualisation routine.

use thiserror::Error;

/// Errors raised while decoding an uploaded file into a table
#[derive(Debug, Error)]
pub enum TableError {
    /// File bytes were not valid UTF-8 text
    #[error("The {0} file is not valid UTF-8 text.")]
    NotUtf8(String),

    /// CSV syntax error (ragged rows, unterminated quotes, ...)
    #[error("The {0} file could not be parsed as CSV: {1}")]
    Csv(String, String),
}

/// A parsed CSV file: one header row plus zero or more data rows.
///
/// Every row has exactly as many fields as the header; the parser rejects
/// ragged input, so accessors never have to deal with short rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Decode raw upload bytes into a table.
    ///
    /// `name` identifies the upload ("metadata" or "annotation") and only
    /// appears in error messages shown to the user.
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self, TableError> {
        let text =
            std::str::from_utf8(bytes).map_err(|_| TableError::NotUtf8(name.to_string()))?;
        Self::from_csv(name, text)
    }

    /// Parse CSV text. The first record is taken as the header row and
    /// surrounding whitespace is trimmed from every field.
    pub fn from_csv(name: &str, text: &str) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| TableError::Csv(name.to_string(), e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| TableError::Csv(name.to_string(), e.to_string()))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Column names in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows in file order
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over one column's values, top to bottom
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .filter_map(move |row| row.get(index).map(String::as_str))
    }
}
