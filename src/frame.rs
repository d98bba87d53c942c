//! In-memory, column-major campaign table.
//!
//! Rows have no identity beyond their position. The row count is fixed when the
//! table is built and every column always holds exactly that many cells.

use crate::{data::Value, error::CleanError};

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Vec<Value>>,
    row_count: usize,
}

impl Table {
    /// Builds a table from row-major records. Short rows are padded with
    /// `Value::Missing`; cells beyond the header width are dropped.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let row_count = rows.len();
        let mut columns = vec![Vec::with_capacity(row_count); headers.len()];
        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.push(cells.next().unwrap_or_default());
            }
        }
        Self {
            headers,
            columns,
            row_count,
        }
    }

    /// Builds a table from whole columns, which must all share one length.
    pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> Result<Self, CleanError> {
        let row_count = columns.first().map(|(_, cells)| cells.len()).unwrap_or(0);
        let mut table = Self {
            headers: Vec::with_capacity(columns.len()),
            columns: Vec::with_capacity(columns.len()),
            row_count,
        };
        for (name, cells) in columns {
            table.push_column(name, cells)?;
        }
        Ok(table)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Position of the first column carrying `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.column_index(name).map(|idx| self.columns[idx].as_slice())
    }

    pub fn column_at(&self, idx: usize) -> &[Value] {
        &self.columns[idx]
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Vec<Value>> {
        let idx = self.column_index(name)?;
        Some(&mut self.columns[idx])
    }

    pub fn require(&self, name: &str) -> Result<&[Value], CleanError> {
        self.column(name).ok_or_else(|| CleanError::MissingColumn {
            column: name.to_string(),
        })
    }

    pub fn non_missing_count(&self, idx: usize) -> usize {
        self.columns[idx].iter().filter(|v| !v.is_missing()).count()
    }

    pub(crate) fn headers_mut(&mut self) -> &mut [String] {
        &mut self.headers
    }

    /// Drops every column whose flag in `keep` is false.
    pub(crate) fn retain_columns(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.headers.retain(|_| *flags.next().unwrap_or(&true));
        let mut flags = keep.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&true));
    }

    pub fn push_column(&mut self, name: String, cells: Vec<Value>) -> Result<(), CleanError> {
        if cells.len() != self.row_count {
            return Err(CleanError::RaggedColumn {
                column: name,
                expected: self.row_count,
                actual: cells.len(),
            });
        }
        self.headers.push(name);
        self.columns.push(cells);
        Ok(())
    }

    /// Replaces the column called `name`, or appends it when absent.
    pub fn set_column(&mut self, name: &str, cells: Vec<Value>) -> Result<(), CleanError> {
        match self.column_index(name) {
            Some(idx) if cells.len() == self.row_count => {
                self.columns[idx] = cells;
                Ok(())
            }
            Some(_) => Err(CleanError::RaggedColumn {
                column: name.to_string(),
                expected: self.row_count,
                actual: cells.len(),
            }),
            None => self.push_column(name.to_string(), cells),
        }
    }

    /// Yields each row as display strings, in column order.
    pub fn display_rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        (0..self.row_count).map(move |row| {
            self.columns
                .iter()
                .map(|column| column[row].as_display())
                .collect()
        })
    }
}
