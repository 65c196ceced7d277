//! # Tables
//!
//! Minimal in-memory string table for batch extraction: a header row and
//! data rows, read from and written to CSV.

use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, Writer};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::TableError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row, padded or truncated to the column count.
    ///
    /// Returns the number of cells dropped by truncation.
    pub fn push_row<I, S>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = values.into_iter().map(Into::into).collect();
        let width = self.columns.len();
        let dropped = row.len().saturating_sub(width);
        if dropped > 0 {
            warn!(
                row = self.rows.len() + 1,
                width,
                dropped,
                "row longer than the header, extra cells dropped"
            );
        }
        row.resize(width, String::new());
        self.rows.push(row);
        dropped
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.get(idx).map_or("", String::as_str))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Reads a headed CSV. Short rows are padded with empty cells; cells past
    /// the header width are dropped with a warning.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut table = Self {
            columns,
            rows: Vec::new(),
        };
        for record in reader.records() {
            let record = record?;
            table.push_row(record.iter());
        }
        Ok(table)
    }

    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut writer = Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_path(&self, path: &Path) -> Result<(), TableError> {
        let file = std::fs::File::create(path)?;
        self.write_to(std::io::BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_pads_short_rows() {
        let csv = "id,text,city\n1,маршрут 12,Astana\n2,\"автобус, 128\"\n";
        let table = Table::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["id", "text", "city"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1], vec!["2", "автобус, 128", ""]);
        assert_eq!(table.column("text").unwrap(), vec!["маршрут 12", "автобус, 128"]);
        assert_eq!(table.column("missing"), None);
    }

    #[test]
    fn test_long_rows_report_dropped_cells() {
        let mut table = Table::new(["id", "text"]);
        assert_eq!(table.push_row(["1", "маршрут 12", "лишнее", "ещё"]), 2);
        assert_eq!(table.push_row(["2"]), 0);
        assert_eq!(table.rows[0], vec!["1", "маршрут 12"]);
        assert_eq!(table.rows[1], vec!["2", ""]);

        let csv = "id,text\n1,маршрут 12,Astana\n2,автобус 128\n";
        let read = Table::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read.column("text").unwrap(), vec!["маршрут 12", "автобус 128"]);
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut table = Table::new(["text", "route_extracted"]);
        table.push_row(["на остановке \"Сайран\"", "12"]);
        table.push_row(["без маршрута"]);
        table.write_path(&path).unwrap();

        let back = Table::from_path(&path).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.rows[1][1], "");
    }
}
