use chrono::{Datelike, NaiveDate};

use crate::calculator::{melt, prior_year_point};
use crate::config::FilterConfig;
use crate::data_loader::RawTable;
use crate::error::{PipelineError, Result};
use crate::models::{NormalizedSeries, Observation};

/// STEO figure 43: date in the first column, one Bcf/d column per shale
/// formation. Only columns naming a focus basin are kept.
pub fn parse_production(table: &RawTable, filters: &FilterConfig) -> Result<NormalizedSeries> {
    let basins: Vec<(usize, &str)> = table
        .columns
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, label)| filters.focus_basins.iter().any(|b| label.contains(b.as_str())))
        .map(|(idx, label)| (idx, label.as_str()))
        .collect();
    if basins.is_empty() {
        return Err(PipelineError::MissingColumn(filters.focus_basins.join(" | ")));
    }

    let names: Vec<&str> = basins.iter().map(|(_, name)| *name).collect();
    let mut series = NormalizedSeries::new("Dry shale gas production", &names);
    for record in &table.records {
        let Some(date) = record.get(0).as_date() else {
            continue;
        };
        if date.year() < filters.min_year {
            continue;
        }
        series.push(date, basins.iter().map(|&(idx, _)| record.get(idx).as_f64()).collect())?;
    }
    Ok(series.sort_by_date())
}

/// `(Date, Basin, Production)` rows with strictly positive production.
pub fn production_long(series: &NormalizedSeries) -> Vec<Observation> {
    melt(series).into_iter().filter(|obs| obs.value > 0.0).collect()
}

/// Absolute change per basin between the latest month and the month
/// nearest to one year earlier. Months where every basin sums to zero are
/// placeholders and are ignored.
pub fn yoy_production_change(series: &NormalizedSeries, tolerance_days: i64) -> Result<Vec<(String, f64)>> {
    let mut reported = series.clone().sort_by_date();
    reported
        .rows
        .retain(|row| row.values.iter().map(|v| v.unwrap_or(0.0)).sum::<f64>() != 0.0);

    let latest = reported.latest()?;
    let dates: Vec<(NaiveDate, f64)> = reported.rows.iter().map(|r| (r.date, 0.0)).collect();
    let (prior_date, _) = prior_year_point(&dates, latest.date, tolerance_days)
        .ok_or_else(|| PipelineError::NoData(format!("production one year before {}", latest.date)))?;
    let prior = reported
        .rows
        .iter()
        .find(|r| r.date == prior_date)
        .ok_or_else(|| PipelineError::NoData(format!("production on {}", prior_date)))?;

    Ok(reported
        .columns
        .iter()
        .enumerate()
        .map(|(idx, basin)| {
            let change = latest.values[idx].unwrap_or(0.0) - prior.values[idx].unwrap_or(0.0);
            (basin.clone(), change)
        })
        .collect())
}
