use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// One dated row of a [`NormalizedSeries`]. `values` lines up with the
/// series' column names; `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

/// Table keyed by `Date` with one or more named numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<SeriesRow>,
}

/// A series extended with computed columns (percent change, bands, spreads).
pub type DerivedSeries = NormalizedSeries;

/// Result of joining several series on `Date` and dropping incomplete rows.
pub type MergedTable = NormalizedSeries;

impl NormalizedSeries {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Placeholder used when a source file is missing but the chart still
    /// has to render.
    pub fn empty(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::new(name, columns)
    }

    /// Append a row. `values` must line up with `columns`.
    pub fn push(&mut self, date: NaiveDate, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(PipelineError::RowWidth {
                series: self.name.clone(),
                expected: self.columns.len(),
                got: values.len(),
            });
        }
        self.rows.push(SeriesRow { date, values });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    /// Append a computed column. `values` must have one entry per row.
    pub fn with_column(mut self, name: &str, values: Vec<Option<f64>>) -> Result<Self> {
        if values.len() != self.rows.len() {
            return Err(PipelineError::Config(format!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.values.push(value);
        }
        Ok(self)
    }

    /// Drop every row holding a missing or non-finite value.
    pub fn drop_missing(mut self) -> Self {
        self.rows
            .retain(|r| r.values.iter().all(|v| v.map_or(false, f64::is_finite)));
        self
    }

    pub fn sort_by_date(mut self) -> Self {
        self.rows.sort_by_key(|r| r.date);
        self
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).min()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).max()
    }

    /// Latest row, or `NoData` when nothing survived filtering.
    pub fn latest(&self) -> Result<&SeriesRow> {
        self.rows
            .iter()
            .max_by_key(|r| r.date)
            .ok_or_else(|| PipelineError::NoData(self.name.clone()))
    }
}

/// Long-format record: one value for one category at one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub category: String,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, category: impl Into<String>, value: f64) -> Self {
        Self {
            date,
            category: category.into(),
            value,
        }
    }
}

/// Weekly rig count row after filtering and basin normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RigRecord {
    pub publish_date: NaiveDate,
    pub country: String,
    pub basin: String,
    pub drill_for: String,
    pub trajectory: Option<String>,
    pub well_depth: Option<String>,
    pub rig_count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyRigCount {
    pub year: i32,
    pub basin: String,
    pub rig_count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineProject {
    pub last_updated: Option<NaiveDate>,
    pub project_name: String,
    pub operator: String,
    pub project_type: String,
    pub status: String,
    pub year_in_service: Option<i32>,
    pub states: String,
    pub capacity_mmcfd: Option<f64>,
    pub notes: String,
    pub demand_served: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub month: NaiveDate,
    pub country: String,
    pub region: String,
    pub activity: String,
    pub volume_mmcf: f64,
}
