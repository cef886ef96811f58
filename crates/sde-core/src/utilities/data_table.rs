//! Tabular data ingestion.
//!
//! Observed series (credit spreads, short rates) usually arrive as a
//! spreadsheet or its delimited export. `DataTable` holds either row by row,
//! with a header naming each column, and extracts named columns as
//! `Vec<Real>`. Workbooks are read with `calamine` behind the `xlsx`
//! feature.
//!
//! Two extraction flavours are offered: [`DataTable::column`] returns an
//! explicit `Result`, while [`DataTable::column_or_empty`] logs the failure
//! and hands back an empty vector so that exploratory callers never crash.

use crate::errors::{Error, Result};
use crate::Real;
#[cfg(feature = "xlsx")]
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, warn};

/// Cell contents treated as missing values.
const MISSING_MARKERS: [&str; 6] = ["", "NA", "N/A", "#N/A", "NaN", "nan"];

/// Return `true` if `cell` denotes a missing value.
pub fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    MISSING_MARKERS.iter().any(|m| *m == cell)
}

/// A row-oriented table of string cells with named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Parse delimited text whose first non-empty line is the header.
    ///
    /// Short rows are padded with empty cells. When `required_column` is
    /// given, rows with a missing value in that column are dropped.
    ///
    /// # Errors
    /// `Error::Conversion` if the text has no header or `required_column`
    /// is not one of its columns.
    pub fn parse(text: &str, delimiter: char, required_column: Option<&str>) -> Result<Self> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header_line = lines
            .next()
            .ok_or_else(|| Error::Conversion("table has no header row".into()))?;
        let headers = split_cells(header_line, delimiter);
        Self::from_rows(headers, lines.map(|l| split_cells(l, delimiter)), required_column)
    }

    /// Build a table from a header and rows of cells.
    ///
    /// Applies the same padding and row filter as [`parse`](Self::parse).
    ///
    /// # Errors
    /// `Error::Conversion` if `required_column` is not one of `headers`.
    pub fn from_rows(
        headers: Vec<String>,
        rows: impl IntoIterator<Item = Vec<String>>,
        required_column: Option<&str>,
    ) -> Result<Self> {
        let width = headers.len();

        let required = match required_column {
            Some(name) => Some(
                headers
                    .iter()
                    .position(|h| h == name)
                    .ok_or_else(|| Error::Conversion(format!("column '{name}' not found")))?,
            ),
            None => None,
        };

        let mut kept = Vec::new();
        let mut dropped = 0usize;
        for mut cells in rows {
            cells.resize(width.max(cells.len()), String::new());
            if let Some(idx) = required {
                if is_missing(&cells[idx]) {
                    dropped += 1;
                    continue;
                }
            }
            kept.push(cells);
        }

        debug!(columns = width, rows = kept.len(), dropped, "built table");
        Ok(Self {
            headers,
            rows: kept,
        })
    }

    /// Column names, in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// All rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Return `true` if the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Extract column `name` as numbers.
    ///
    /// # Errors
    /// `Error::Conversion` if the column does not exist or any of its cells
    /// does not parse as a number.
    pub fn column(&self, name: &str) -> Result<Vec<Real>> {
        let idx = self
            .headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::Conversion(format!("column '{name}' not found")))?;

        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let cell = cells[idx].trim();
                cell.parse::<Real>().map_err(|_| {
                    Error::Conversion(format!(
                        "row {row}, column '{name}': '{cell}' is not a number"
                    ))
                })
            })
            .collect()
    }

    /// Extract column `name` as numbers, or an empty vector on failure.
    ///
    /// The failure is logged at warn level and otherwise swallowed.
    pub fn column_or_empty(&self, name: &str) -> Vec<Real> {
        match self.column(name) {
            Ok(values) => values,
            Err(e) => {
                warn!(column = name, error = %e, "error converting column to numbers");
                Vec::new()
            }
        }
    }
}

/// Read a delimited text file into a [`DataTable`].
///
/// See [`DataTable::parse`] for the row filtering applied with
/// `required_column`.
///
/// # Errors
/// `Error::Io` if the file cannot be read, plus the parse errors of
/// [`DataTable::parse`].
pub fn read_delimited(
    path: impl AsRef<Path>,
    delimiter: char,
    required_column: Option<&str>,
) -> Result<DataTable> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = text.len(), "read table");
    DataTable::parse(&text, delimiter, required_column)
}

/// Read one worksheet of a spreadsheet (xlsx, xlsm, xls, xlsb, ods) into a
/// [`DataTable`].
///
/// The first worksheet is used when `sheet` is `None`; its first non-empty
/// row is the header. Error cells (`#N/A`, `#DIV/0!`, ...) count as missing.
///
/// # Errors
/// `Error::Io` if the file cannot be opened, `Error::Conversion` if the
/// workbook cannot be decoded, has no such worksheet, or the worksheet has
/// no header row, plus the errors of [`DataTable::from_rows`].
#[cfg(feature = "xlsx")]
pub fn read_spreadsheet(
    path: impl AsRef<Path>,
    sheet: Option<&str>,
    required_column: Option<&str>,
) -> Result<DataTable> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_error)?;
    let sheet = match sheet {
        Some(name) => name.to_string(),
        None => workbook.sheet_names().first().cloned().ok_or_else(|| {
            Error::Conversion(format!("{} has no worksheets", path.display()))
        })?,
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(spreadsheet_error)?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(|c| !c.is_empty()));
    let headers = rows
        .next()
        .ok_or_else(|| Error::Conversion(format!("worksheet '{sheet}' has no header row")))?;
    debug!(path = %path.display(), sheet = %sheet, "read worksheet");
    DataTable::from_rows(headers, rows, required_column)
}

#[cfg(feature = "xlsx")]
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

#[cfg(feature = "xlsx")]
fn spreadsheet_error(e: calamine::Error) -> Error {
    match e {
        calamine::Error::Io(io) => io.into(),
        other => Error::Conversion(other.to_string()),
    }
}

fn split_cells(line: &str, delimiter: char) -> Vec<String> {
    line.split(delimiter)
        .map(|c| c.trim().trim_matches('"').to_string())
        .collect()
}
