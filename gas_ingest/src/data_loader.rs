use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::debug;
use polars::prelude::*;
use std::path::Path;

use crate::config::{HeaderLocator, SourceConfig};
use crate::error::{PipelineError, Result};

/// One untyped spreadsheet or CSV cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%b-%Y", "%b %d, %Y", "%Y%m%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

impl Cell {
    pub fn text(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display form, as used for labels and categorical comparisons.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
            Cell::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    /// Best-effort numeric coercion; anything unparseable is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            _ => None,
        }
    }

    /// Best-effort date coercion; anything unparseable is `None`.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::DateTime(dt) => Some(dt.date()),
            Cell::Number(serial) => excel_serial_to_datetime(*serial).map(|dt| dt.date()),
            Cell::Text(s) => parse_date(s.trim()),
            _ => None,
        }
    }

    /// Month-style labels ("2024-03", "2024M03") map to the first of the month.
    pub fn as_month(&self) -> Option<NaiveDate> {
        match self {
            Cell::Text(s) => parse_month(s.trim()).or_else(|| parse_date(s.trim())),
            other => other.as_date(),
        }
    }

    pub fn trimmed(self) -> Self {
        match self {
            Cell::Text(s) => Cell::text(s.trim()),
            other => other,
        }
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

pub fn parse_month(value: &str) -> Option<NaiveDate> {
    let (year, month) = value.split_once('-').or_else(|| value.split_once('M'))?;
    if year.len() != 4 || month.is_empty() || month.len() > 2 {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

/// Excel's 1900 date system, day 0 = 1899-12-30.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    // Plausible range only: 1950 .. 2150.
    if !(18_000.0..=91_000.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(s) => Cell::text(s),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
                .map(Cell::DateTime)
                .unwrap_or(Cell::Empty),
            Data::DateTimeIso(s) => parse_date(s)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(Cell::DateTime)
                .unwrap_or_else(|| Cell::text(s)),
            Data::DurationIso(s) => Cell::text(s),
        }
    }
}

/// A sheet as read from disk, before any header is chosen. Row and column
/// indexes are absolute sheet positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Read one worksheet of an xlsx/xls/ods workbook.
    pub fn read_sheet(path: &Path, sheet: &str) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)?;
        if !workbook.sheet_names().iter().any(|s| s == sheet) {
            return Err(PipelineError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: sheet.to_string(),
            });
        }
        let range = workbook.worksheet_range(sheet)?;

        // Pad so that indexes match the sheet even when the used range does
        // not start at A1.
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows = vec![Vec::new(); row_offset];
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; col_offset];
            cells.extend(row.iter().map(Cell::from));
            rows.push(cells);
        }

        debug!("Read {} rows from sheet '{}' of {}", rows.len(), sheet, path.display());
        Ok(Self::new(sheet, rows))
    }

    /// Read a CSV file with polars, every column kept as text.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let df = CsvReadOptions::default()
            .with_has_header(false)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        let mut rows: Vec<Vec<Cell>> = vec![Vec::with_capacity(df.width()); df.height()];
        for column in df.get_columns() {
            let values = column.str()?;
            for (idx, value) in values.into_iter().enumerate() {
                rows[idx].push(value.map(Cell::text).unwrap_or(Cell::Empty));
            }
        }

        debug!("Read {} rows from {}", rows.len(), path.display());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self::new(name, rows))
    }

    /// Read whatever `source` describes: its sheet for workbooks, the whole
    /// file for CSV.
    pub fn read_source(path: &Path, source: &SourceConfig) -> Result<Self> {
        if source.extension.eq_ignore_ascii_case(".csv") {
            Self::read_csv(path)
        } else {
            Self::read_sheet(path, source.sheet_name()?)
        }
    }

    /// Index of the first row with a cell containing `marker`,
    /// case-insensitively.
    pub fn find_header_row(&self, marker: &str) -> Option<usize> {
        let marker = marker.to_lowercase();
        self.rows.iter().position(|row| {
            row.iter().any(|cell| {
                cell.as_text()
                    .map(|t| t.to_lowercase().contains(&marker))
                    .unwrap_or(false)
            })
        })
    }

    pub fn resolve_header(&self, header: &HeaderLocator) -> Result<usize> {
        match header {
            HeaderLocator::Row(row) => Ok(*row),
            HeaderLocator::Marker(marker) => {
                self.find_header_row(marker)
                    .ok_or_else(|| PipelineError::HeaderNotFound {
                        sheet: self.name.clone(),
                        marker: marker.clone(),
                    })
            }
        }
    }

    /// Use row `header_row` as column labels and the rows below it as
    /// records, skipping the absolute rows listed in `skip_rows`.
    pub fn into_table(self, header_row: usize, skip_rows: &[usize]) -> Result<RawTable> {
        if header_row >= self.rows.len() {
            return Err(PipelineError::HeaderOutOfRange {
                sheet: self.name,
                row: header_row,
                height: self.rows.len(),
            });
        }

        let mut rows = self.rows.into_iter().enumerate().skip(header_row);
        let header = rows.next().map(|(_, cells)| cells).unwrap_or_default();
        let records: Vec<RawRecord> = rows
            .filter(|(idx, _)| !skip_rows.contains(idx))
            .map(|(_, cells)| RawRecord { cells })
            .collect();

        let width = records
            .iter()
            .map(|r| r.cells.len())
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);

        let columns = (0..width)
            .map(|idx| {
                header
                    .get(idx)
                    .and_then(Cell::as_text)
                    .map(|label| label.trim().to_string())
                    .filter(|label| !label.is_empty())
                    .unwrap_or_else(|| format!("Unnamed: {}", idx))
            })
            .collect();

        Ok(RawTable { columns, records })
    }

    /// Read and slice a source in one go.
    pub fn load_table(path: &Path, source: &SourceConfig) -> Result<RawTable> {
        let grid = Self::read_source(path, source)?;
        let header_row = grid.resolve_header(&source.header)?;
        grid.into_table(header_row, &source.skip_rows)
    }
}

/// An untyped row; its shape depends entirely on the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub cells: Vec<Cell>,
}

static EMPTY: Cell = Cell::Empty;

impl RawRecord {
    pub fn get(&self, idx: usize) -> &Cell {
        self.cells.get(idx).unwrap_or(&EMPTY)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }
}

/// Labelled raw rows below a header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    pub fn column_indexes(&self, names: &[&str]) -> Result<Vec<usize>> {
        names.iter().map(|name| self.column_index(name)).collect()
    }

    /// Drop rows where every cell is empty.
    pub fn drop_blank_rows(mut self) -> Self {
        self.records.retain(|r| !r.is_blank());
        self
    }

    /// Drop columns that are empty in every row.
    pub fn drop_blank_columns(self) -> Self {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&idx| self.records.iter().any(|r| !r.get(idx).is_empty()))
            .collect();
        let columns = keep.iter().map(|&idx| self.columns[idx].clone()).collect();
        let records = self
            .records
            .into_iter()
            .map(|r| RawRecord {
                cells: keep.iter().map(|&idx| r.get(idx).clone()).collect(),
            })
            .collect();
        Self { columns, records }
    }

    /// Trim surrounding whitespace from every text cell.
    pub fn strip_text(mut self) -> Self {
        for record in &mut self.records {
            for cell in record.cells.iter_mut() {
                *cell = std::mem::replace(cell, Cell::Empty).trimmed();
            }
        }
        self
    }

    /// Remove the named columns; unknown names are ignored.
    pub fn drop_columns(self, names: &[String]) -> Self {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&idx| !names.contains(&self.columns[idx]))
            .collect();
        let columns = keep.iter().map(|&idx| self.columns[idx].clone()).collect();
        let records = self
            .records
            .into_iter()
            .map(|r| RawRecord {
                cells: keep.iter().map(|&idx| r.get(idx).clone()).collect(),
            })
            .collect();
        Self { columns, records }
    }
}
