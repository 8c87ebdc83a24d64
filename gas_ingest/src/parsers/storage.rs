use chrono::{Datelike, NaiveDate};
use log::debug;
use regex::Regex;
use std::collections::BTreeMap;

use crate::calculator::{monthly_band, BAND_AVG, BAND_HIGH, BAND_LOW};
use crate::data_loader::{Cell, RawTable};
use crate::error::{PipelineError, Result};
use crate::models::{DerivedSeries, NormalizedSeries};

pub const ACTUAL_STORAGE: &str = "Actual Storage";
pub const TOTAL: &str = "Total";

/// EIA STEO figure 27: date in the first column, then `Level`, `Average`,
/// `Low`, `High` in Bcf.
pub fn parse_us_storage(table: &RawTable, min_year: i32) -> Result<DerivedSeries> {
    let idx = table.column_indexes(&["Level", "Average", "Low", "High"])?;

    let mut series = NormalizedSeries::new("US storage", &[ACTUAL_STORAGE, BAND_AVG, BAND_LOW, BAND_HIGH]);
    for record in &table.records {
        let Some(date) = record.get(0).as_date() else {
            continue;
        };
        if date.year() < min_year {
            continue;
        }
        series.push(date, idx.iter().map(|&i| record.get(i).as_f64()).collect())?;
    }
    Ok(series.drop_missing().sort_by_date())
}

/// Eurostat monthly storage export: one row per country, one column per
/// month (`2024-03`), volumes in million m³. Returns the all-country total
/// in Bcf with its monthly band.
pub fn parse_eu_storage(table: &RawTable, bcf_per_mcm: f64) -> Result<DerivedSeries> {
    if table.columns.is_empty() {
        return Err(PipelineError::MissingColumn("Country".to_string()));
    }
    let country_label = Regex::new(r"^[A-Za-z -]+$").map_err(|e| PipelineError::Config(e.to_string()))?;

    // Month columns; labels that do not parse (flags, blanks) are skipped.
    let months: Vec<(usize, NaiveDate)> = table
        .columns
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(idx, label)| Cell::text(label).as_month().map(|m| (idx, m)))
        .collect();

    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut countries = 0usize;
    for record in &table.records {
        let Some(country) = record.get(0).as_text() else {
            continue;
        };
        if !country_label.is_match(country.trim()) {
            continue;
        }
        countries += 1;
        for &(idx, month) in &months {
            if let Some(volume) = record.get(idx).as_f64() {
                *totals.entry(month).or_insert(0.0) += volume * bcf_per_mcm;
            }
        }
    }
    debug!("EU storage: {} countries over {} months", countries, totals.len());

    let mut series = NormalizedSeries::new("EU storage", &[TOTAL]);
    for (month, total) in totals {
        series.push(month, vec![Some(total)])?;
    }
    Ok(monthly_band(&series, TOTAL)?.drop_missing())
}
