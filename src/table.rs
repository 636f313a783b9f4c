//! In-memory delimited tables.
//!
//! Cells are kept as the verbatim strings found in the file. Nothing is
//! inferred, so identifiers and postal codes keep exactly the form they were
//! written in.

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::errors::{AppError, ResultExt};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Appends a row. The row is padded or truncated to the header width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Like [`column_index`](Self::column_index) but fails with
    /// [`AppError::MissingColumn`].
    pub fn require_column(&self, name: &str) -> Result<usize, AppError> {
        self.column_index(name)
            .ok_or_else(|| AppError::MissingColumn(name.to_string()))
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&str>, AppError> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    pub fn read_csv(path: &Path) -> Result<Self, AppError> {
        tracing::info!("Loading {}", path.display());

        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Failed to read header of {}", path.display()))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut table = DataTable::new(headers);
        let mut record = StringRecord::new();
        loop {
            let more = reader
                .read_record(&mut record)
                .with_context(|| format!("Malformed row in {}", path.display()))?;
            if !more {
                break;
            }
            table.push_row(record.iter().map(str::to_string).collect());
        }

        tracing::info!(
            "Loaded {} rows x {} columns from {}",
            table.len(),
            table.headers.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), AppError> {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = WriterBuilder::new().from_writer(file);

        writer
            .write_record(&self.headers)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", path.display()))?;

        tracing::info!("Wrote {} rows to {}", self.len(), path.display());
        Ok(())
    }
}
